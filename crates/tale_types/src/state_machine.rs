// State Machines - States with scripts and transitions between them

use serde::{Deserialize, Serialize};

use crate::NodeGraphSnippet;

/// Script run while a state is active
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateScript {
    #[default]
    None,
    /// Hand written target language code, exported verbatim
    Code { code: String },
    /// Visually authored node graph, exported through the dialog pipeline
    NodeGraph { graph: NodeGraphSnippet },
}

/// A single state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub script: StateScript,
}

/// Transition between two states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Source state id
    pub source: String,
    /// Target state id
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// State machine owned by an export object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    pub id: String,
    /// Owning object (usually an npc)
    pub object_id: String,
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl StateMachine {
    /// Transitions leaving the given state, in authored order
    pub fn transitions_from(&self, state_id: &str) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|t| t.source == state_id)
            .collect()
    }

    /// Get a state by id
    pub fn get_state(&self, id: &str) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }
}

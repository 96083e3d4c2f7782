// Node Graph Snippet - The serialized, visually authored dialog graph
//
// A snippet holds one list per node kind plus the directed links between nodes.
// Snippets are stored as JSON by the authoring tool and are read-only input to
// the export pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Condition, ObjectRef};

/// Reserved source port of the implicit "else" branch of a condition node
pub const ELSE_PORT: &str = "else";

// ─────────────────────────────────────────────────────────────────────────────
// Node Kinds
// ─────────────────────────────────────────────────────────────────────────────

/// Kind of a node in a snippet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Start,
    TextLine,
    Choice,
    Condition,
    Action,
    Reference,
    End,
}

impl NodeKind {
    /// Snake case name, as used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::TextLine => "text_line",
            NodeKind::Choice => "choice",
            NodeKind::Condition => "condition",
            NodeKind::Action => "action",
            NodeKind::Reference => "reference",
            NodeKind::End => "end",
        }
    }

    /// Whether nodes of this kind can have more than one outgoing branch
    pub fn is_branching(&self) -> bool {
        matches!(self, NodeKind::Choice | NodeKind::Condition)
    }

    /// Whether nodes of this kind only mark the beginning or end of a graph
    pub fn is_marker(&self) -> bool {
        matches!(self, NodeKind::Start | NodeKind::End)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// Who speaks a text line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    #[default]
    Npc,
    Player,
}

/// Start or end marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerNode {
    pub id: String,
}

/// A single line of dialog text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub id: String,
    #[serde(default)]
    pub speaker: Speaker,
    #[serde(default)]
    pub text: String,
}

/// One option of a choice node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Branch discriminator, matched against `Link::source_port`
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Whether the option stays available after it was picked once
    #[serde(default)]
    pub is_repeatable: bool,
    /// Optional guard; an option without condition is always shown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// A player choice between several options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceNode {
    pub id: String,
    #[serde(default)]
    pub choices: Vec<ChoiceOption>,
}

/// One guarded branch of a condition node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchCondition {
    /// Branch discriminator, matched against `Link::source_port`
    pub id: String,
    /// The guard. Authoring may leave this empty, which is reported at export time.
    #[serde(default)]
    pub condition: Option<Condition>,
}

/// Branching on conditions, evaluated in order, with an implicit else branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionNode {
    pub id: String,
    #[serde(default)]
    pub conditions: Vec<BranchCondition>,
}

/// A side-effecting action (set a value, show floating text, spawn an item, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
    pub id: String,
    /// Action identifier, e.g. "set_npc_value" or "show_floating_text"
    pub action_type: String,
    /// Action specific configuration
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Object the action operates on, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_object: Option<ObjectRef>,
}

impl ActionNode {
    /// Floating text carried by the payload, if this action shows one
    pub fn floating_text(&self) -> Option<&str> {
        self.payload.get("floating_text").and_then(|v| v.as_str())
    }
}

/// A cross reference to another exported object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceNode {
    pub id: String,
    #[serde(default)]
    pub reference_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_object: Option<ObjectRef>,
}

/// Borrowed view of any node in a snippet
#[derive(Debug, Clone, Copy)]
pub enum SnippetNode<'a> {
    Start(&'a MarkerNode),
    TextLine(&'a TextNode),
    Choice(&'a ChoiceNode),
    Condition(&'a ConditionNode),
    Action(&'a ActionNode),
    Reference(&'a ReferenceNode),
    End(&'a MarkerNode),
}

impl<'a> SnippetNode<'a> {
    /// Node id
    pub fn id(&self) -> &'a str {
        match self {
            SnippetNode::Start(n) | SnippetNode::End(n) => &n.id,
            SnippetNode::TextLine(n) => &n.id,
            SnippetNode::Choice(n) => &n.id,
            SnippetNode::Condition(n) => &n.id,
            SnippetNode::Action(n) => &n.id,
            SnippetNode::Reference(n) => &n.id,
        }
    }

    /// Node kind
    pub fn kind(&self) -> NodeKind {
        match self {
            SnippetNode::Start(_) => NodeKind::Start,
            SnippetNode::TextLine(_) => NodeKind::TextLine,
            SnippetNode::Choice(_) => NodeKind::Choice,
            SnippetNode::Condition(_) => NodeKind::Condition,
            SnippetNode::Action(_) => NodeKind::Action,
            SnippetNode::Reference(_) => NodeKind::Reference,
            SnippetNode::End(_) => NodeKind::End,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Links
// ─────────────────────────────────────────────────────────────────────────────

/// Routing vertex of a link in the visual editor (for UI purposes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A directed link between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Branch discriminator on the source node (choice option id, condition id, "else")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertices: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Link {
    /// Create a link without port
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            id: None,
            source: source.to_string(),
            target: target.to_string(),
            source_port: None,
            target_port: None,
            vertices: Vec::new(),
            label: None,
        }
    }

    /// Create a link leaving the given port of the source node
    pub fn from_port(source: &str, port: &str, target: &str) -> Self {
        Self {
            source_port: Some(port.to_string()),
            ..Self::new(source, target)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snippet
// ─────────────────────────────────────────────────────────────────────────────

/// Complete authored node graph of one dialog or state script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeGraphSnippet {
    #[serde(default)]
    pub start: Vec<MarkerNode>,
    #[serde(default)]
    pub text_lines: Vec<TextNode>,
    #[serde(default)]
    pub choices: Vec<ChoiceNode>,
    #[serde(default)]
    pub conditions: Vec<ConditionNode>,
    #[serde(default)]
    pub actions: Vec<ActionNode>,
    #[serde(default)]
    pub references: Vec<ReferenceNode>,
    #[serde(default)]
    pub end: Vec<MarkerNode>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl NodeGraphSnippet {
    /// Iterate over all nodes in declaration order (kind by kind)
    pub fn nodes(&self) -> impl Iterator<Item = SnippetNode<'_>> {
        self.start
            .iter()
            .map(SnippetNode::Start)
            .chain(self.text_lines.iter().map(SnippetNode::TextLine))
            .chain(self.choices.iter().map(SnippetNode::Choice))
            .chain(self.conditions.iter().map(SnippetNode::Condition))
            .chain(self.actions.iter().map(SnippetNode::Action))
            .chain(self.references.iter().map(SnippetNode::Reference))
            .chain(self.end.iter().map(SnippetNode::End))
    }

    /// Get a node by id
    pub fn get_node(&self, id: &str) -> Option<SnippetNode<'_>> {
        self.nodes().find(|n| n.id() == id)
    }

    /// Get all links leaving a node, in authored order
    pub fn links_from(&self, node_id: &str) -> Vec<&Link> {
        self.links.iter().filter(|l| l.source == node_id).collect()
    }

    /// Total number of nodes, markers included
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    /// Whether the snippet contains no node at all
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }
}

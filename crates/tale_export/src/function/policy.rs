// Split Policies - Which branches become functions of their own

use serde::{Deserialize, Serialize};
use tale_types::NodeKind;

use crate::parser::{BranchKey, NodePayload, ParsedStep};

/// Decides whether a branch continuation is exported as its own function
///
/// Consulted once per (parent step, branch) pair. Choice and condition
/// branches, merge points and steps that already start a function are split
/// regardless of the answer.
pub trait FunctionSplitPolicy: Send + Sync {
    fn is_function_worthy(&self, parent: &ParsedStep, branch: &BranchKey, target: &ParsedStep) -> bool;
}

/// Choice options and condition branches split, sequential continuations never do
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSplitPolicy;

impl FunctionSplitPolicy for DefaultSplitPolicy {
    fn is_function_worthy(&self, parent: &ParsedStep, _branch: &BranchKey, _target: &ParsedStep) -> bool {
        parent.kind().is_branching()
    }
}

/// A configured split rule
///
/// Matches on the parent's node kind and, for actions, its action type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitRule {
    pub parent_kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    pub split: bool,
}

impl SplitRule {
    fn matches(&self, parent: &ParsedStep) -> bool {
        if parent.kind() != self.parent_kind {
            return false;
        }
        match (&self.action_type, &parent.payload) {
            (None, _) => true,
            (Some(wanted), NodePayload::Action(action)) => &action.action_type == wanted,
            (Some(_), _) => false,
        }
    }
}

/// First matching rule wins; unmatched branches fall back to [`DefaultSplitPolicy`]
#[derive(Debug, Clone, Default)]
pub struct RuleSplitPolicy {
    rules: Vec<SplitRule>,
}

impl RuleSplitPolicy {
    pub fn new(rules: Vec<SplitRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[SplitRule] {
        &self.rules
    }
}

impl FunctionSplitPolicy for RuleSplitPolicy {
    fn is_function_worthy(&self, parent: &ParsedStep, branch: &BranchKey, target: &ParsedStep) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.matches(parent))
            .map(|rule| rule.split)
            .unwrap_or_else(|| DefaultSplitPolicy.is_function_worthy(parent, branch, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tale_types::{ActionNode, ChoiceNode, Speaker, TextNode};

    fn step(payload: NodePayload) -> ParsedStep {
        ParsedStep {
            index: 0,
            payload,
            children: Vec::new(),
            parent_count: 1,
        }
    }

    fn action(action_type: &str) -> ParsedStep {
        step(NodePayload::Action(ActionNode {
            id: "a".into(),
            action_type: action_type.into(),
            payload: serde_json::Value::Null,
            related_object: None,
        }))
    }

    fn text() -> ParsedStep {
        step(NodePayload::TextLine(TextNode {
            id: "t".into(),
            speaker: Speaker::Npc,
            text: String::new(),
        }))
    }

    #[test]
    fn test_default_policy() {
        let choice = step(NodePayload::Choice(ChoiceNode {
            id: "c".into(),
            choices: vec![],
        }));
        let target = text();
        assert!(DefaultSplitPolicy.is_function_worthy(&choice, &BranchKey::Choice("1".into()), &target));
        assert!(!DefaultSplitPolicy.is_function_worthy(&text(), &BranchKey::Next, &target));
    }

    #[test]
    fn test_rules_first_match_wins() {
        let policy = RuleSplitPolicy::new(vec![
            SplitRule {
                parent_kind: NodeKind::Action,
                action_type: Some("wait".into()),
                split: true,
            },
            SplitRule {
                parent_kind: NodeKind::Action,
                action_type: None,
                split: false,
            },
        ]);
        let target = text();
        assert!(policy.is_function_worthy(&action("wait"), &BranchKey::Next, &target));
        assert!(!policy.is_function_worthy(&action("set_value"), &BranchKey::Next, &target));
        assert!(!policy.is_function_worthy(&text(), &BranchKey::Next, &target));
    }
}

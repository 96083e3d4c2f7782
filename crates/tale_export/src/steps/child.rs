// Child Nodes - How a rendered branch continues

use serde::Serialize;

use crate::catalog::PlaceholderDescription;
use crate::function::{ChildLink, FunctionPlan};
use crate::parser::{ParsedGraph, ParsedStep};
use crate::placeholder::render_conditional_range;

/// Continuation of one branch
///
/// A branch without continuation has neither child nor function and renders
/// as empty content.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChildNodeData {
    pub kind: &'static str,
    pub has_child: bool,
    /// Whether the continuation is a function to call
    pub has_function: bool,
    pub function_name: String,
    /// Node id of the continuation
    pub step_id: Option<String>,
}

impl ChildNodeData {
    /// Resolve the child at `child_index` of `step`
    pub fn resolve(graph: &ParsedGraph, plan: &FunctionPlan, step: &ParsedStep, child_index: usize) -> Self {
        let mut data = Self {
            kind: "child_node",
            ..Self::default()
        };

        match plan.child_link(step.index, child_index) {
            ChildLink::End => {}
            ChildLink::Inline(target) => {
                data.has_child = true;
                data.step_id = graph.get(target).map(|s| s.id().to_string());
            }
            ChildLink::Function(index) => {
                if let Some(function) = plan.function(index) {
                    data.has_child = true;
                    data.has_function = true;
                    data.function_name = function.name.clone();
                    data.step_id = graph.get(function.root).map(|s| s.id().to_string());
                }
            }
        }
        data
    }

    /// Value of a child placeholder
    pub fn placeholder(&self, name: &str) -> Option<String> {
        match name {
            "Tale_ChildNode_Function" => Some(self.function_name.clone()),
            _ => None,
        }
    }

    /// Render the child ranges of a legacy template
    pub fn fill_ranges(&self, code: &str) -> String {
        let code = render_conditional_range(code, "Tale_ChildNode_HasFunction", self.has_function);
        render_conditional_range(&code, "Tale_ChildNode_HasNoFunction", !self.has_function)
    }
}

pub const LEGACY_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("Tale_ChildNode_Function", "Name of the function continuing the branch"),
    PlaceholderDescription::new(
        "Tale_ChildNode_HasFunction_Start",
        "Content rendered only if the branch continues in a function",
    ),
    PlaceholderDescription::new("Tale_ChildNode_HasFunction_End", "Ends Tale_ChildNode_HasFunction_Start"),
    PlaceholderDescription::new(
        "Tale_ChildNode_HasNoFunction_Start",
        "Content rendered only if the branch does not continue in a function",
    ),
    PlaceholderDescription::new("Tale_ChildNode_HasNoFunction_End", "Ends Tale_ChildNode_HasNoFunction_Start"),
];

pub const SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("child_node.has_child", "Whether the branch has a continuation"),
    PlaceholderDescription::new("child_node.has_function", "Whether the continuation is a function"),
    PlaceholderDescription::new("child_node.function_name", "Name of the continuation function"),
    PlaceholderDescription::new("child_node.step_id", "Node id of the continuation"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_ranges() {
        let code = "{{Tale_ChildNode_HasFunction_Start}}call(){{Tale_ChildNode_HasFunction_End}}{{Tale_ChildNode_HasNoFunction_Start}}stop(){{Tale_ChildNode_HasNoFunction_End}}";
        let with = ChildNodeData {
            kind: "child_node",
            has_child: true,
            has_function: true,
            function_name: "F".into(),
            step_id: Some("t".into()),
        };
        assert_eq!(with.fill_ranges(code), "call()");
        assert_eq!(ChildNodeData::default().fill_ranges(code), "stop()");
    }
}

// Function Generator - Splits a parsed graph into independently callable functions
//
// The primary function starts at the graph root. Walking a function, each
// branch either continues inline or starts (or reuses) another function. A
// step is inlined into at most one function, so every reachable step is
// exported exactly once.

mod naming;
mod policy;

pub use naming::*;
pub use policy::*;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::parser::{BranchKey, NodePayload, ParsedGraph, ParsedStep, StepIndex};
use crate::scope::RenderScope;
use crate::text::text_preview;

// ─────────────────────────────────────────────────────────────────────────────
// Plan
// ─────────────────────────────────────────────────────────────────────────────

/// One function of the plan
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFunction {
    /// Position in the plan; 0 is the primary function
    pub index: usize,
    pub root: StepIndex,
    /// Steps in render order
    pub steps: Vec<StepIndex>,
    /// Allocated name, empty until names are assigned
    pub name: String,
    /// Preview of the branch that first led here (auxiliary functions only)
    pub preview: Option<String>,
}

/// How a branch continues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildLink {
    /// The branch has no authored continuation
    End,
    /// The continuation follows in the same function
    Inline(StepIndex),
    /// The continuation is the function with the given plan index
    Function(usize),
}

/// Functions of one graph together with the resolution of every branch
#[derive(Debug, Clone, Default)]
pub struct FunctionPlan {
    functions: Vec<PlannedFunction>,
    links: HashMap<(StepIndex, usize), ChildLink>,
}

impl FunctionPlan {
    /// Split a graph without allocating names
    pub fn build(graph: &ParsedGraph, policy: &dyn FunctionSplitPolicy, preview_length: usize) -> Self {
        let Some(root) = graph.root() else {
            return Self::default();
        };

        let mut functions = vec![PlannedFunction {
            index: 0,
            root,
            steps: Vec::new(),
            name: String::new(),
            preview: None,
        }];
        let mut function_of_root: HashMap<StepIndex, usize> = HashMap::from([(root, 0)]);
        let mut links = HashMap::new();

        let mut next = 0;
        while next < functions.len() {
            let mut steps = Vec::new();
            let mut current = Some(functions[next].root);

            while let Some(index) = current.take() {
                steps.push(index);
                let step = graph.step(index);

                for (child_index, child) in step.children.iter().enumerate() {
                    let Some(target_index) = child.target else {
                        links.insert((index, child_index), ChildLink::End);
                        continue;
                    };
                    let target = graph.step(target_index);

                    // Branch continuations always start a function, the policy only
                    // decides for sequential ones
                    let split = function_of_root.contains_key(&target_index)
                        || target.parent_count > 1
                        || current.is_some()
                        || step.kind().is_branching()
                        || policy.is_function_worthy(step, &child.branch, target);

                    let link = if split {
                        let function = *function_of_root.entry(target_index).or_insert_with(|| {
                            let function = functions.len();
                            functions.push(PlannedFunction {
                                index: function,
                                root: target_index,
                                steps: Vec::new(),
                                name: String::new(),
                                preview: Some(branch_preview(step, &child.branch, target, preview_length)),
                            });
                            function
                        });
                        ChildLink::Function(function)
                    } else {
                        current = Some(target_index);
                        ChildLink::Inline(target_index)
                    };
                    links.insert((index, child_index), link);
                }
            }

            functions[next].steps = steps;
            next += 1;
        }

        Self { functions, links }
    }

    /// Entry function, `None` for an empty graph
    pub fn primary(&self) -> Option<&PlannedFunction> {
        self.functions.first()
    }

    /// Auxiliary functions in the order they were first reached
    pub fn auxiliary(&self) -> &[PlannedFunction] {
        self.functions.get(1..).unwrap_or(&[])
    }

    /// All functions, primary first
    pub fn functions(&self) -> &[PlannedFunction] {
        &self.functions
    }

    pub fn function(&self, index: usize) -> Option<&PlannedFunction> {
        self.functions.get(index)
    }

    /// Resolution of a step's child
    pub fn child_link(&self, step: StepIndex, child_index: usize) -> ChildLink {
        self.links
            .get(&(step, child_index))
            .copied()
            .unwrap_or(ChildLink::End)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Human readable description of the branch leading to a function
fn branch_preview(parent: &ParsedStep, branch: &BranchKey, target: &ParsedStep, length: usize) -> String {
    let text = match (&parent.payload, branch) {
        (NodePayload::Choice(choice), BranchKey::Choice(id)) => choice
            .choices
            .iter()
            .find(|option| &option.id == id)
            .map(|option| option.text.clone()),
        (NodePayload::Condition(condition), BranchKey::Condition(id)) => condition
            .conditions
            .iter()
            .position(|c| &c.id == id)
            .map(|position| format!("Condition {}", position + 1)),
        (_, BranchKey::Else) => Some("Else".to_string()),
        _ => None,
    }
    .filter(|text| !text.trim().is_empty())
    .unwrap_or_else(|| target.payload.preview_text().to_string());

    text_preview(&text, length)
}

// ─────────────────────────────────────────────────────────────────────────────
// Generator
// ─────────────────────────────────────────────────────────────────────────────

/// Splits graphs and names the resulting functions
pub struct FunctionGenerator {
    policy: Arc<dyn FunctionSplitPolicy>,
    names: FunctionNameGenerator,
}

impl FunctionGenerator {
    pub fn new(policy: Arc<dyn FunctionSplitPolicy>, names: FunctionNameGenerator) -> Self {
        Self { policy, names }
    }

    pub fn names(&self) -> &FunctionNameGenerator {
        &self.names
    }

    /// Split a graph and allocate a unique name for every function
    ///
    /// Names are allocated in plan order, primary first.
    pub async fn split(&self, graph: &ParsedGraph, category: &str, scope: &RenderScope) -> Result<FunctionPlan> {
        let mut plan = FunctionPlan::build(graph, self.policy.as_ref(), scope.settings.preview_length);

        for function in plan.functions.iter_mut() {
            scope.check_cancelled()?;
            function.name = self.names.next_name(category, scope).await?;
        }

        debug!(
            object_id = %scope.owner.id,
            functions = plan.functions.len(),
            steps = graph.len(),
            "Split graph into functions"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::NodeGraphParser;
    use crate::test_support::scope_with_objects;
    use tale_types::{
        BranchCondition, ChoiceNode, ChoiceOption, ConditionNode, Link, MarkerNode,
        NodeGraphSnippet, NodeKind, Speaker, TemplateErrorCollection, TextNode,
    };

    fn text(id: &str, text: &str) -> TextNode {
        TextNode {
            id: id.into(),
            speaker: Speaker::Npc,
            text: text.into(),
        }
    }

    fn parse(snippet: &NodeGraphSnippet) -> ParsedGraph {
        NodeGraphParser::parse(snippet, &TemplateErrorCollection::new(), "test").unwrap()
    }

    fn condition_snippet(conditions: &[&str], linked: &[(&str, &str)]) -> NodeGraphSnippet {
        let mut snippet = NodeGraphSnippet {
            start: vec![MarkerNode { id: "s".into() }],
            conditions: vec![ConditionNode {
                id: "c".into(),
                conditions: conditions
                    .iter()
                    .map(|id| BranchCondition { id: id.to_string(), condition: None })
                    .collect(),
            }],
            ..Default::default()
        };
        snippet.links.push(Link::new("s", "c"));
        for (port, target) in linked {
            snippet.text_lines.push(text(target, &format!("Text of {}", target)));
            snippet.links.push(Link::from_port("c", port, target));
        }
        snippet
    }

    #[test]
    fn test_linear_graph_is_one_function() {
        let snippet = NodeGraphSnippet {
            start: vec![MarkerNode { id: "s".into() }],
            text_lines: vec![text("a", "A"), text("b", "B")],
            links: vec![Link::new("s", "a"), Link::new("a", "b")],
            ..Default::default()
        };
        let graph = parse(&snippet);
        let plan = FunctionPlan::build(&graph, &DefaultSplitPolicy, 15);

        assert_eq!(plan.functions().len(), 1);
        assert_eq!(plan.primary().unwrap().steps.len(), 2);
        assert_eq!(plan.child_link(0, 0), ChildLink::Inline(1));
    }

    #[test]
    fn test_only_authored_branches_become_functions() {
        let snippet = condition_snippet(&["A", "B"], &[("B", "tb")]);
        let graph = parse(&snippet);
        let plan = FunctionPlan::build(&graph, &DefaultSplitPolicy, 15);

        let condition = graph.find("c").unwrap();
        assert_eq!(condition.children.len(), 3);
        assert_eq!(plan.auxiliary().len(), 1);
        assert_eq!(plan.child_link(condition.index, 0), ChildLink::End);
        assert_eq!(plan.child_link(condition.index, 1), ChildLink::Function(1));
        assert_eq!(plan.child_link(condition.index, 2), ChildLink::End);
        assert_eq!(plan.auxiliary()[0].preview.as_deref(), Some("Condition 2"));
    }

    #[test]
    fn test_every_authored_branch_lands_in_exactly_one_function() {
        for k in 1..5 {
            let ids: Vec<String> = (0..k).map(|i| format!("c{}", i)).collect();
            let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let targets: Vec<(String, String)> = ids
                .iter()
                .map(|id| (id.clone(), format!("t_{}", id)))
                .chain(std::iter::once(("else".to_string(), "t_else".to_string())))
                .collect();
            let linked: Vec<(&str, &str)> = targets.iter().map(|(p, t)| (p.as_str(), t.as_str())).collect();

            let graph = parse(&condition_snippet(&id_refs, &linked));
            let plan = FunctionPlan::build(&graph, &DefaultSplitPolicy, 15);
            let condition = graph.find("c").unwrap();
            assert_eq!(condition.children.len(), k + 1);

            for child in &condition.children {
                let target = child.target.unwrap();
                let owners = plan.functions().iter().filter(|f| f.steps.contains(&target)).count();
                assert_eq!(owners, 1);
            }
            assert_eq!(plan.auxiliary().len(), k + 1);
            assert_eq!(plan.auxiliary().last().unwrap().preview.as_deref(), Some("Else"));
        }
    }

    #[test]
    fn test_merge_point_is_shared_function() {
        let snippet = NodeGraphSnippet {
            start: vec![MarkerNode { id: "s".into() }],
            choices: vec![ChoiceNode {
                id: "c".into(),
                choices: vec![
                    ChoiceOption { id: "1".into(), text: "Yes".into(), is_repeatable: false, condition: None },
                    ChoiceOption { id: "2".into(), text: "No".into(), is_repeatable: false, condition: None },
                ],
            }],
            text_lines: vec![text("yes", "Great"), text("merge", "Anyway")],
            links: vec![
                Link::new("s", "c"),
                Link::from_port("c", "1", "yes"),
                Link::from_port("c", "2", "merge"),
                Link::new("yes", "merge"),
            ],
            ..Default::default()
        };
        let graph = parse(&snippet);
        let plan = FunctionPlan::build(&graph, &DefaultSplitPolicy, 15);

        let merge = graph.find("merge").unwrap().index;
        let merge_functions: Vec<_> = plan.functions().iter().filter(|f| f.root == merge).collect();
        assert_eq!(merge_functions.len(), 1);
        assert_eq!(plan.functions().len(), 3);
        assert_eq!(plan.auxiliary()[0].preview.as_deref(), Some("Yes"));

        let yes = graph.find("yes").unwrap().index;
        assert_eq!(plan.child_link(yes, 0), ChildLink::Function(merge_functions[0].index));
    }

    #[test]
    fn test_branch_continuations_split_despite_rules() {
        let snippet = NodeGraphSnippet {
            start: vec![MarkerNode { id: "s".into() }],
            choices: vec![ChoiceNode {
                id: "c".into(),
                choices: vec![
                    ChoiceOption { id: "1".into(), text: "Yes".into(), is_repeatable: false, condition: None },
                    ChoiceOption { id: "2".into(), text: "No".into(), is_repeatable: false, condition: None },
                ],
            }],
            text_lines: vec![text("yes", "Great"), text("no", "Pity")],
            links: vec![
                Link::new("s", "c"),
                Link::from_port("c", "1", "yes"),
                Link::from_port("c", "2", "no"),
            ],
            ..Default::default()
        };
        let graph = parse(&snippet);
        let policy = RuleSplitPolicy::new(vec![SplitRule {
            parent_kind: NodeKind::Choice,
            action_type: None,
            split: false,
        }]);
        let plan = FunctionPlan::build(&graph, &policy, 15);

        let choice = graph.find("c").unwrap().index;
        assert_eq!(plan.functions().len(), 3);
        assert_eq!(plan.primary().unwrap().steps, vec![choice]);
        assert_eq!(plan.child_link(choice, 0), ChildLink::Function(1));
        assert_eq!(plan.child_link(choice, 1), ChildLink::Function(2));
    }

    #[tokio::test]
    async fn test_split_names_primary_first() {
        let snippet = condition_snippet(&["A"], &[("A", "ta"), ("else", "te")]);
        let graph = parse(&snippet);
        let generator = FunctionGenerator::new(
            Arc::new(DefaultSplitPolicy),
            FunctionNameGenerator::new(Arc::new(InMemoryCounterStore::new()), FunctionNaming::default()),
        );
        let scope = scope_with_objects(vec![]);

        let plan = generator.split(&graph, "Dialog", &scope).await.unwrap();
        let names: Vec<_> = plan.functions().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Dialog_Bob_Step1", "Dialog_Bob_Step2", "Dialog_Bob_Step3"]);
    }
}

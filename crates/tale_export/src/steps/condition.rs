// Condition Step - Ordered guarded branches with an else branch

use serde::Serialize;
use tale_types::ConditionNode;

use super::{ChildNodeData, StepContext};
use crate::catalog::PlaceholderDescription;
use crate::error::Result;
use crate::parser::{BranchKey, ParsedStep};
use crate::placeholder::{render_conditional_range, render_list_range, render_range, replace_placeholders};
use crate::scope::RenderScope;

#[derive(Debug, Clone, Serialize)]
pub struct ConditionBranchData {
    pub kind: &'static str,
    pub id: String,
    pub index: usize,
    pub is_first: bool,
    /// Rendered condition expression, empty if the condition is missing
    pub condition: String,
    pub child_node: ChildNodeData,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConditionData {
    pub kind: &'static str,
    pub id: String,
    pub branches: Vec<ConditionBranchData>,
    /// Continuation when no branch matches
    pub else_branch: ChildNodeData,
}

fn child_position(step: &ParsedStep, branch: &BranchKey, fallback: usize) -> usize {
    step.children
        .iter()
        .position(|c| &c.branch == branch)
        .unwrap_or(fallback)
}

impl ConditionData {
    /// Build the condition data, rendering every branch condition in order
    pub async fn build(node: &ConditionNode, step: &ParsedStep, ctx: &StepContext<'_>) -> Result<Self> {
        let mut branches = Vec::with_capacity(node.conditions.len());

        for (index, branch) in node.conditions.iter().enumerate() {
            let scope = ctx.scope.at(format!("condition {}", branch.id));
            let condition = ctx.conditions.render(branch.condition.as_ref(), &scope).await?;
            let child_index = child_position(step, &BranchKey::Condition(branch.id.clone()), index);

            branches.push(ConditionBranchData {
                kind: "condition_branch",
                id: branch.id.clone(),
                index,
                is_first: index == 0,
                condition,
                child_node: ctx.child(step, child_index),
            });
        }

        let else_index = child_position(step, &BranchKey::Else, node.conditions.len());
        Ok(Self {
            kind: "condition",
            id: node.id.clone(),
            branches,
            else_branch: ctx.child(step, else_index),
        })
    }
}

fn fill_branch(code: &str, branch: &ConditionBranchData) -> String {
    let code = render_conditional_range(code, "Tale_Condition_IsFirst", branch.is_first);
    let code = render_conditional_range(&code, "Tale_Condition_IsNotFirst", !branch.is_first);
    let code = branch.child_node.fill_ranges(&code);

    replace_placeholders(&code, |name| match name {
        "Tale_Condition" => Some(branch.condition.clone()),
        "Tale_Condition_Id" => Some(branch.id.clone()),
        "Tale_Condition_Index" => Some(branch.index.to_string()),
        other => branch.child_node.placeholder(other),
    })
}

pub fn fill(code: &str, data: &ConditionData, _scope: &RenderScope) -> String {
    let code = render_list_range(code, "Tale_Condition_Branches", &data.branches, |inner, branch, _| {
        fill_branch(inner, branch)
    });

    render_range(&code, "Tale_Condition_Else", |inner| {
        let inner = data.else_branch.fill_ranges(inner);
        replace_placeholders(&inner, |name| data.else_branch.placeholder(name))
    })
}

pub const LEGACY_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("Tale_Condition_Branches_Start", "Content rendered once per condition branch"),
    PlaceholderDescription::new("Tale_Condition_Branches_End", "Ends Tale_Condition_Branches_Start"),
    PlaceholderDescription::new("Tale_Condition", "Rendered condition of the branch"),
    PlaceholderDescription::new("Tale_Condition_Id", "Id of the branch"),
    PlaceholderDescription::new("Tale_Condition_Index", "Zero based position of the branch"),
    PlaceholderDescription::new("Tale_Condition_IsFirst_Start", "Content rendered only for the first branch"),
    PlaceholderDescription::new("Tale_Condition_IsFirst_End", "Ends Tale_Condition_IsFirst_Start"),
    PlaceholderDescription::new("Tale_Condition_IsNotFirst_Start", "Content rendered for every branch but the first"),
    PlaceholderDescription::new("Tale_Condition_IsNotFirst_End", "Ends Tale_Condition_IsNotFirst_Start"),
    PlaceholderDescription::new(
        "Tale_Condition_Else_Start",
        "Content of the else branch; child placeholders inside refer to it",
    ),
    PlaceholderDescription::new("Tale_Condition_Else_End", "Ends Tale_Condition_Else_Start"),
];

pub const SCRIPTING_PLACEHOLDERS: &[PlaceholderDescription] = &[
    PlaceholderDescription::new("tale_condition.id", "Node id"),
    PlaceholderDescription::new("tale_condition.branches", "Branches in evaluation order"),
    PlaceholderDescription::new("tale_condition.branches[i].id", "Id of the branch"),
    PlaceholderDescription::new("tale_condition.branches[i].index", "Zero based position of the branch"),
    PlaceholderDescription::new("tale_condition.branches[i].is_first", "Whether this is the first branch"),
    PlaceholderDescription::new("tale_condition.branches[i].condition", "Rendered condition of the branch"),
    PlaceholderDescription::new("tale_condition.branches[i].child_node", "Continuation of the branch"),
    PlaceholderDescription::new("tale_condition.else_branch", "Continuation when no branch matches"),
];

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::condition::ConditionRenderer;
    use crate::function::{
        DefaultSplitPolicy, FunctionGenerator, FunctionNameGenerator, FunctionNaming, InMemoryCounterStore,
    };
    use crate::parser::{NodeGraphParser, NodePayload};
    use crate::test_support::{npc_with_fields, scope_with_objects};
    use tale_types::{
        BranchCondition, Comparator, Condition, ConditionGroup, FieldComparison, GroupOperator, Link,
        MarkerNode, NodeGraphSnippet, ObjectRef, ObjectType, Operand, Speaker, TemplateErrorKind, TextNode,
    };

    const TEMPLATE: &str = "{{Tale_Condition_Branches_Start}}
{{Tale_Condition_IsFirst_Start}}if{{Tale_Condition_IsFirst_End}}{{Tale_Condition_IsNotFirst_Start}}elseif{{Tale_Condition_IsNotFirst_End}} {{Tale_Condition}} then
    {{Tale_ChildNode_HasFunction_Start}}{{Tale_ChildNode_Function}}(){{Tale_ChildNode_HasFunction_End}}
{{Tale_Condition_Branches_End}}
else
    {{Tale_Condition_Else_Start}}{{Tale_ChildNode_HasFunction_Start}}{{Tale_ChildNode_Function}}(){{Tale_ChildNode_HasFunction_End}}{{Tale_Condition_Else_End}}
end";

    fn gold_above(amount: i64) -> Condition {
        Condition::new(ConditionGroup::new(GroupOperator::And).compare(FieldComparison {
            object: ObjectRef::new("n1", ObjectType::Npc),
            field: "Gold".into(),
            comparator: Comparator::Greater,
            right: Operand::literal(amount),
        }))
    }

    fn snippet(conditions: Vec<BranchCondition>, linked: &[&str]) -> NodeGraphSnippet {
        let mut snippet = NodeGraphSnippet {
            start: vec![MarkerNode { id: "s".into() }],
            conditions: vec![ConditionNode { id: "c".into(), conditions }],
            links: vec![Link::new("s", "c")],
            ..Default::default()
        };
        for port in linked {
            let target = format!("t_{}", port);
            snippet.text_lines.push(TextNode {
                id: target.clone(),
                speaker: Speaker::Npc,
                text: "Go on".into(),
            });
            snippet.links.push(Link::from_port("c", port, &target));
        }
        snippet
    }

    async fn render(snippet: &NodeGraphSnippet, scope: &RenderScope) -> String {
        let graph = NodeGraphParser::parse(snippet, &scope.errors, scope.location()).unwrap();
        let generator = FunctionGenerator::new(
            Arc::new(DefaultSplitPolicy),
            FunctionNameGenerator::new(Arc::new(InMemoryCounterStore::new()), FunctionNaming::default()),
        );
        let plan = generator.split(&graph, "Dialog", scope).await.unwrap();
        let conditions = ConditionRenderer::default();
        let ctx = StepContext {
            graph: &graph,
            plan: &plan,
            conditions: &conditions,
            scope,
        };
        let step = graph.find("c").unwrap();
        let NodePayload::Condition(node) = &step.payload else {
            panic!("not a condition step");
        };
        let data = ConditionData::build(node, step, &ctx).await.unwrap();
        fill(TEMPLATE, &data, scope)
    }

    #[tokio::test]
    async fn test_only_linked_branch_calls_a_function() {
        let scope = scope_with_objects(vec![npc_with_fields("n1", "Gus", &[("Gold", "10")])]);
        let snippet = snippet(
            vec![
                BranchCondition { id: "A".into(), condition: Some(gold_above(5)) },
                BranchCondition { id: "B".into(), condition: Some(gold_above(1)) },
            ],
            &["B"],
        );

        let out = render(&snippet, &scope).await;
        assert_eq!(
            out,
            "if get_npc_value(\"n1\", \"Gold\") > 5 then\n\
             elseif get_npc_value(\"n1\", \"Gold\") > 1 then\n    Dialog_Bob_Step2()\n\
             else\n\
             end"
        );
        assert!(scope.errors.is_empty());
    }

    #[tokio::test]
    async fn test_missing_condition_is_reported_and_rendered_empty() {
        let scope = scope_with_objects(vec![]);
        let snippet = snippet(vec![BranchCondition { id: "A".into(), condition: None }], &["A", "else"]);

        let out = render(&snippet, &scope).await;
        assert!(out.starts_with("if  then\n    Dialog_Bob_Step2()\n"));
        assert!(out.ends_with("else\n    Dialog_Bob_Step3()\nend"));

        let errors = scope.errors.entries();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, TemplateErrorKind::DialogConditionMissing);
        assert!(errors[0].location.ends_with("condition A"));
    }
}

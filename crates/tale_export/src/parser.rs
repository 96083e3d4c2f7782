// Node Graph Parser - Snippets to an arena of linked steps
//
// Nodes are resolved once into an index-addressed arena. Children point at
// step indices, so shared continuations (merge points) are represented once
// and counted through `parent_count`. Traversal is iterative and tracks the
// active path, so cyclic graphs are rejected instead of looping.

use std::collections::{HashMap, HashSet};

use tale_types::{
    ActionNode, ChoiceNode, ConditionNode, ELSE_PORT, Link, NodeGraphSnippet, NodeKind,
    ReferenceNode, SnippetNode, TemplateErrorCollection, TemplateErrorKind, TextNode,
};
use tracing::{debug, warn};

/// Index of a step in a [`ParsedGraph`]
pub type StepIndex = usize;

// ─────────────────────────────────────────────────────────────────────────────
// Parsed Graph
// ─────────────────────────────────────────────────────────────────────────────

/// Content of a step
#[derive(Debug, Clone, PartialEq)]
pub enum NodePayload {
    TextLine(TextNode),
    Choice(ChoiceNode),
    Condition(ConditionNode),
    Action(ActionNode),
    Reference(ReferenceNode),
}

impl NodePayload {
    pub fn id(&self) -> &str {
        match self {
            NodePayload::TextLine(n) => &n.id,
            NodePayload::Choice(n) => &n.id,
            NodePayload::Condition(n) => &n.id,
            NodePayload::Action(n) => &n.id,
            NodePayload::Reference(n) => &n.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::TextLine(_) => NodeKind::TextLine,
            NodePayload::Choice(_) => NodeKind::Choice,
            NodePayload::Condition(_) => NodeKind::Condition,
            NodePayload::Action(_) => NodeKind::Action,
            NodePayload::Reference(_) => NodeKind::Reference,
        }
    }

    /// Text best describing this step in a preview
    pub fn preview_text(&self) -> &str {
        match self {
            NodePayload::TextLine(n) => &n.text,
            NodePayload::Reference(n) => &n.reference_text,
            NodePayload::Action(n) => n.floating_text().unwrap_or(&n.action_type),
            NodePayload::Choice(_) | NodePayload::Condition(_) => "",
        }
    }
}

/// Which branch of its parent a child continues
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BranchKey {
    /// Sole continuation of a text line, action or reference
    Next,
    /// Choice option, by option id
    Choice(String),
    /// Condition branch, by condition id
    Condition(String),
    /// Implicit else branch of a condition node
    Else,
}

/// Outgoing branch of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepChild {
    pub branch: BranchKey,
    /// `None` when the branch ends the graph or has no authored continuation
    pub target: Option<StepIndex>,
}

/// One node of the parsed graph
#[derive(Debug, Clone)]
pub struct ParsedStep {
    pub index: StepIndex,
    pub payload: NodePayload,
    /// Branches in authored order
    pub children: Vec<StepChild>,
    /// Number of branches leading into this step
    pub parent_count: usize,
}

impl ParsedStep {
    pub fn id(&self) -> &str {
        self.payload.id()
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    /// Child continuing the given branch
    pub fn child(&self, branch: &BranchKey) -> Option<&StepChild> {
        self.children.iter().find(|c| &c.branch == branch)
    }
}

/// Acyclic, index-addressed step graph reachable from the start node
#[derive(Debug, Clone, Default)]
pub struct ParsedGraph {
    steps: Vec<ParsedStep>,
    root: Option<StepIndex>,
}

impl ParsedGraph {
    /// First step after the start node, `None` for an empty dialog
    pub fn root(&self) -> Option<StepIndex> {
        self.root
    }

    pub fn step(&self, index: StepIndex) -> &ParsedStep {
        &self.steps[index]
    }

    pub fn get(&self, index: StepIndex) -> Option<&ParsedStep> {
        self.steps.get(index)
    }

    /// Steps in depth-first discovery order
    pub fn steps(&self) -> &[ParsedStep] {
        &self.steps
    }

    pub fn find(&self, node_id: &str) -> Option<&ParsedStep> {
        self.steps.iter().find(|s| s.id() == node_id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

enum Visit {
    Active,
    Done(StepIndex),
}

struct Frame<'a> {
    step: StepIndex,
    node_id: &'a str,
    branches: Vec<(BranchKey, Option<&'a str>)>,
    next: usize,
}

/// Parses node graph snippets
pub struct NodeGraphParser<'a> {
    snippet: &'a NodeGraphSnippet,
    nodes: HashMap<&'a str, SnippetNode<'a>>,
    errors: &'a TemplateErrorCollection,
    location: &'a str,
}

impl<'a> NodeGraphParser<'a> {
    /// Parse a snippet
    ///
    /// Returns `None` after recording a fatal error when the graph has no single
    /// start node, references unknown nodes or contains a cycle.
    pub fn parse(
        snippet: &'a NodeGraphSnippet,
        errors: &'a TemplateErrorCollection,
        location: &'a str,
    ) -> Option<ParsedGraph> {
        let mut parser = Self {
            snippet,
            nodes: HashMap::new(),
            errors,
            location,
        };
        parser.index_nodes()?;
        parser.validate_links()?;
        let root = parser.root_target()?;
        parser.walk(root)
    }

    fn invalid(&self, message: String) -> Option<()> {
        warn!(location = self.location, "{}", message);
        self.errors
            .add(TemplateErrorKind::GraphStructureInvalid, message, self.location);
        None
    }

    fn index_nodes(&mut self) -> Option<()> {
        let snippet = self.snippet;
        for node in snippet.nodes() {
            if self.nodes.insert(node.id(), node).is_some() {
                return self.invalid(format!("Duplicate node id '{}'", node.id()));
            }
        }
        Some(())
    }

    fn validate_links(&self) -> Option<()> {
        for link in &self.snippet.links {
            for endpoint in [&link.source, &link.target] {
                if !self.nodes.contains_key(endpoint.as_str()) {
                    return self.invalid(format!(
                        "Link {} -> {} references unknown node '{}'",
                        link.source, link.target, endpoint
                    ));
                }
            }
            if matches!(self.nodes.get(link.target.as_str()), Some(SnippetNode::Start(_))) {
                return self.invalid(format!("Link {} -> {} enters the start node", link.source, link.target));
            }
        }
        Some(())
    }

    /// Node the start marker links to; `Some(None)` for an empty graph
    fn root_target(&self) -> Option<Option<&'a str>> {
        if self.snippet.start.len() != 1 {
            self.invalid(format!(
                "Expected exactly one start node, found {}",
                self.snippet.start.len()
            ))?;
        }
        let snippet = self.snippet;
        let start = &snippet.start[0];
        let links = snippet.links_from(&start.id);
        if links.len() > 1 {
            warn!(location = self.location, node = %start.id, "Start node has more than one link, using the first");
        }
        Some(links.first().copied().map(|l| l.target.as_str()))
    }

    /// Outgoing branches of a node in authored order
    fn branches(&self, node: SnippetNode<'a>) -> Vec<(BranchKey, Option<&'a str>)> {
        let snippet = self.snippet;
        let links: Vec<&'a Link> = snippet.links_from(node.id());
        let by_port = |port: &str| -> Option<&'a str> {
            links
                .iter()
                .copied()
                .find(|l| l.source_port.as_deref() == Some(port))
                .map(|l| l.target.as_str())
        };

        match node {
            SnippetNode::Choice(choice) => {
                self.warn_unmatched_ports(node, &links, choice.choices.iter().map(|c| c.id.as_str()));
                choice
                    .choices
                    .iter()
                    .map(|option| (BranchKey::Choice(option.id.clone()), by_port(&option.id)))
                    .collect()
            }
            SnippetNode::Condition(condition) => {
                let ports = condition
                    .conditions
                    .iter()
                    .map(|c| c.id.as_str())
                    .chain(std::iter::once(ELSE_PORT));
                self.warn_unmatched_ports(node, &links, ports);
                condition
                    .conditions
                    .iter()
                    .map(|branch| (BranchKey::Condition(branch.id.clone()), by_port(&branch.id)))
                    .chain(std::iter::once((BranchKey::Else, by_port(ELSE_PORT))))
                    .collect()
            }
            SnippetNode::Start(_) | SnippetNode::End(_) => Vec::new(),
            _ => {
                if links.len() > 1 {
                    warn!(
                        location = self.location,
                        node = node.id(),
                        links = links.len(),
                        "Node has more than one outgoing link, using the first"
                    );
                }
                vec![(BranchKey::Next, links.first().copied().map(|l| l.target.as_str()))]
            }
        }
    }

    fn warn_unmatched_ports<'p>(
        &self,
        node: SnippetNode<'a>,
        links: &[&'a Link],
        ports: impl Iterator<Item = &'p str>,
    ) {
        let ports: HashSet<&str> = ports.collect();
        for link in links {
            let matched = link.source_port.as_deref().is_some_and(|p| ports.contains(p));
            if !matched {
                warn!(
                    location = self.location,
                    node = node.id(),
                    port = link.source_port.as_deref().unwrap_or(""),
                    target = %link.target,
                    "Ignoring link without matching branch"
                );
            }
        }
    }

    fn payload(node: SnippetNode<'a>) -> Option<NodePayload> {
        match node {
            SnippetNode::TextLine(n) => Some(NodePayload::TextLine(n.clone())),
            SnippetNode::Choice(n) => Some(NodePayload::Choice(n.clone())),
            SnippetNode::Condition(n) => Some(NodePayload::Condition(n.clone())),
            SnippetNode::Action(n) => Some(NodePayload::Action(n.clone())),
            SnippetNode::Reference(n) => Some(NodePayload::Reference(n.clone())),
            SnippetNode::Start(_) | SnippetNode::End(_) => None,
        }
    }

    /// Content node behind an id; `None` for markers, which end a branch
    fn content_node(&self, id: Option<&'a str>) -> Option<SnippetNode<'a>> {
        let node = *self.nodes.get(id?)?;
        Self::payload(node).map(|_| node)
    }

    fn enter(
        &self,
        node: SnippetNode<'a>,
        steps: &mut Vec<ParsedStep>,
        visits: &mut HashMap<&'a str, Visit>,
        stack: &mut Vec<Frame<'a>>,
    ) -> StepIndex {
        let index = steps.len();
        if let Some(payload) = Self::payload(node) {
            steps.push(ParsedStep {
                index,
                payload,
                children: Vec::new(),
                parent_count: 0,
            });
        }
        visits.insert(node.id(), Visit::Active);
        stack.push(Frame {
            step: index,
            node_id: node.id(),
            branches: self.branches(node),
            next: 0,
        });
        index
    }

    fn walk(&self, root: Option<&'a str>) -> Option<ParsedGraph> {
        let Some(root_node) = self.content_node(root) else {
            debug!(location = self.location, "Node graph has no content");
            return Some(ParsedGraph::default());
        };

        let mut steps: Vec<ParsedStep> = Vec::new();
        let mut visits: HashMap<&'a str, Visit> = HashMap::new();
        let mut stack: Vec<Frame<'a>> = Vec::new();

        let root_index = self.enter(root_node, &mut steps, &mut visits, &mut stack);

        while let Some(frame) = stack.last_mut() {
            if frame.next >= frame.branches.len() {
                let (step, node_id) = (frame.step, frame.node_id);
                stack.pop();
                visits.insert(node_id, Visit::Done(step));
                continue;
            }

            let (branch, target) = frame.branches[frame.next].clone();
            frame.next += 1;
            let parent = frame.step;

            let Some(node) = self.content_node(target) else {
                steps[parent].children.push(StepChild { branch, target: None });
                continue;
            };

            let child = match visits.get(node.id()) {
                Some(Visit::Active) => {
                    let message = format!(
                        "Cycle detected: '{}' links back to '{}'",
                        steps[parent].id(),
                        node.id()
                    );
                    warn!(location = self.location, "{}", message);
                    self.errors
                        .add(TemplateErrorKind::GraphCycleDetected, message, self.location);
                    return None;
                }
                Some(Visit::Done(index)) => *index,
                None => self.enter(node, &mut steps, &mut visits, &mut stack),
            };

            steps[child].parent_count += 1;
            steps[parent].children.push(StepChild {
                branch,
                target: Some(child),
            });
        }

        let unreachable = self
            .nodes
            .values()
            .filter(|n| !n.kind().is_marker() && !visits.contains_key(n.id()))
            .count();
        if unreachable > 0 {
            debug!(location = self.location, unreachable, "Skipping nodes not reachable from start");
        }

        Some(ParsedGraph {
            steps,
            root: Some(root_index),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tale_types::{BranchCondition, ChoiceOption, MarkerNode, Speaker};

    fn text(id: &str, text: &str) -> TextNode {
        TextNode {
            id: id.into(),
            speaker: Speaker::Npc,
            text: text.into(),
        }
    }

    fn snippet_with_start() -> NodeGraphSnippet {
        NodeGraphSnippet {
            start: vec![MarkerNode { id: "s".into() }],
            end: vec![MarkerNode { id: "e".into() }],
            ..Default::default()
        }
    }

    fn parse(snippet: &NodeGraphSnippet) -> (Option<ParsedGraph>, TemplateErrorCollection) {
        let errors = TemplateErrorCollection::new();
        let graph = NodeGraphParser::parse(snippet, &errors, "test");
        (graph, errors)
    }

    #[test]
    fn test_linear_graph_ends_at_end_marker() {
        let mut snippet = snippet_with_start();
        snippet.text_lines = vec![text("t1", "Hello"), text("t2", "Bye")];
        snippet.links = vec![Link::new("s", "t1"), Link::new("t1", "t2"), Link::new("t2", "e")];

        let (graph, errors) = parse(&snippet);
        let graph = graph.unwrap();
        assert!(errors.is_empty());
        assert_eq!(graph.len(), 2);

        let root = graph.step(graph.root().unwrap());
        assert_eq!(root.id(), "t1");
        assert_eq!(root.children[0].target.map(|i| graph.step(i).id()), Some("t2"));
        assert_eq!(graph.find("t2").unwrap().children[0].target, None);
    }

    #[test]
    fn test_empty_graph_has_no_root() {
        let mut snippet = snippet_with_start();
        snippet.links = vec![Link::new("s", "e")];
        let (graph, errors) = parse(&snippet);
        assert!(graph.unwrap().root().is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_condition_always_has_else_branch() {
        let mut snippet = snippet_with_start();
        snippet.conditions = vec![ConditionNode {
            id: "c".into(),
            conditions: vec![
                BranchCondition { id: "a".into(), condition: None },
                BranchCondition { id: "b".into(), condition: None },
            ],
        }];
        snippet.text_lines = vec![text("t", "B branch")];
        snippet.links = vec![Link::new("s", "c"), Link::from_port("c", "b", "t")];

        let (graph, _) = parse(&snippet);
        let graph = graph.unwrap();
        let condition = graph.find("c").unwrap();
        let branches: Vec<_> = condition.children.iter().map(|c| c.branch.clone()).collect();
        assert_eq!(
            branches,
            vec![
                BranchKey::Condition("a".into()),
                BranchKey::Condition("b".into()),
                BranchKey::Else
            ]
        );
        assert!(condition.child(&BranchKey::Else).unwrap().target.is_none());
        assert!(condition.child(&BranchKey::Condition("b".into())).unwrap().target.is_some());
    }

    #[test]
    fn test_choice_options_match_ports_and_merge_points_count_parents() {
        let mut snippet = snippet_with_start();
        snippet.choices = vec![ChoiceNode {
            id: "c".into(),
            choices: vec![
                ChoiceOption { id: "1".into(), text: "Yes".into(), is_repeatable: false, condition: None },
                ChoiceOption { id: "2".into(), text: "No".into(), is_repeatable: true, condition: None },
            ],
        }];
        snippet.text_lines = vec![text("merge", "Either way")];
        snippet.links = vec![
            Link::new("s", "c"),
            Link::from_port("c", "2", "merge"),
            Link::from_port("c", "1", "merge"),
        ];

        let (graph, _) = parse(&snippet);
        let graph = graph.unwrap();
        let merge = graph.find("merge").unwrap();
        assert_eq!(merge.parent_count, 2);

        let choice = graph.find("c").unwrap();
        assert_eq!(choice.children[0].branch, BranchKey::Choice("1".into()));
        assert_eq!(choice.children[0].target, choice.children[1].target);
    }

    #[test]
    fn test_cycle_is_fatal() {
        let mut snippet = snippet_with_start();
        snippet.text_lines = vec![text("a", "A"), text("b", "B")];
        snippet.links = vec![Link::new("s", "a"), Link::new("a", "b"), Link::new("b", "a")];

        let (graph, errors) = parse(&snippet);
        assert!(graph.is_none());
        assert_eq!(errors.entries()[0].kind, TemplateErrorKind::GraphCycleDetected);
    }

    #[test]
    fn test_structure_errors() {
        let mut no_start = snippet_with_start();
        no_start.start.clear();
        let (graph, errors) = parse(&no_start);
        assert!(graph.is_none());
        assert_eq!(errors.entries()[0].kind, TemplateErrorKind::GraphStructureInvalid);

        let mut dangling = snippet_with_start();
        dangling.links = vec![Link::new("s", "ghost")];
        let (graph, errors) = parse(&dangling);
        assert!(graph.is_none());
        assert!(errors.has_fatal());
    }

    #[test]
    fn test_extra_links_use_first() {
        let mut snippet = snippet_with_start();
        snippet.text_lines = vec![text("a", "A"), text("b", "B"), text("c", "C")];
        snippet.links = vec![Link::new("s", "a"), Link::new("a", "b"), Link::new("a", "c")];

        let (graph, errors) = parse(&snippet);
        let graph = graph.unwrap();
        assert!(errors.is_empty());
        assert_eq!(graph.len(), 2);
        assert!(graph.find("c").is_none());
    }
}

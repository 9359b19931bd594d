use itertools::Itertools;
use petgraph::{
    dot::Dot,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceNode {
    Query(String),
    Pattern { label: String, order: usize },
}

impl std::fmt::Display for TraceNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceNode::Query(q) => write!(f, "query: {}", q),
            TraceNode::Pattern { label, order } => write!(f, "#{} {}", order, label),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceEdge {
    Matches,
    Rejects,
    /// From a pattern to a less specific pattern it shadows.
    MoreSpecific,
    Selects,
}

impl std::fmt::Display for TraceEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TraceEdge::Matches => "matches",
                TraceEdge::Rejects => "rejects",
                TraceEdge::MoreSpecific => "more specific than",
                TraceEdge::Selects => "selects",
            }
        )
    }
}

/// The record of one resolution: every pattern tested, which matched, which shadowed which and
/// which was selected.
#[derive(Clone, Debug)]
pub struct ResolutionTrace {
    graph: DiGraph<TraceNode, TraceEdge>,
    query: NodeIndex,
    patterns: Vec<(usize, NodeIndex)>,
}

impl ResolutionTrace {
    pub(super) fn new(query: String) -> ResolutionTrace {
        let mut graph = DiGraph::new();
        let query = graph.add_node(TraceNode::Query(query));
        ResolutionTrace {
            graph,
            query,
            patterns: vec![],
        }
    }

    fn node(&self, order: usize) -> Option<NodeIndex> {
        self.patterns
            .iter()
            .find_map(|(o, idx)| if *o == order { Some(*idx) } else { None })
    }

    pub(super) fn tested(&mut self, order: usize, label: &str, matched: bool) {
        let idx = self.graph.add_node(TraceNode::Pattern {
            label: label.to_string(),
            order,
        });
        self.patterns.push((order, idx));
        let edge = if matched {
            TraceEdge::Matches
        } else {
            TraceEdge::Rejects
        };
        self.graph.add_edge(self.query, idx, edge);
    }

    pub(super) fn shadows(&mut self, specific: usize, general: usize) {
        if let (Some(a), Some(b)) = (self.node(specific), self.node(general)) {
            self.graph.add_edge(a, b, TraceEdge::MoreSpecific);
        }
    }

    pub(super) fn selected(&mut self, order: usize) {
        if let Some(idx) = self.node(order) {
            self.graph.add_edge(self.query, idx, TraceEdge::Selects);
        }
    }

    pub fn graph(&self) -> &DiGraph<TraceNode, TraceEdge> {
        &self.graph
    }

    fn labels_from_query(&self, kind: TraceEdge) -> Vec<String> {
        self.graph
            .edges(self.query)
            .filter(|e| *e.weight() == kind)
            .filter_map(|e| match &self.graph[e.target()] {
                TraceNode::Pattern { label, order } => Some((*order, label.clone())),
                TraceNode::Query(_) => None,
            })
            .sorted()
            .map(|(_, label)| label)
            .collect()
    }

    /// Labels of the matching patterns, in registration order.
    pub fn matched(&self) -> Vec<String> {
        self.labels_from_query(TraceEdge::Matches)
    }

    pub fn rejected(&self) -> Vec<String> {
        self.labels_from_query(TraceEdge::Rejects)
    }

    /// Label of the selected pattern, if any pattern matched.
    pub fn selection(&self) -> Option<String> {
        self.labels_from_query(TraceEdge::Selects).into_iter().next()
    }

    /// `(more specific, less specific)` label pairs.
    pub fn shadowed(&self) -> Vec<(String, String)> {
        self.graph
            .edge_indices()
            .filter(|e| self.graph[*e] == TraceEdge::MoreSpecific)
            .filter_map(|e| self.graph.edge_endpoints(e))
            .filter_map(|(a, b)| match (&self.graph[a], &self.graph[b]) {
                (TraceNode::Pattern { label: a, .. }, TraceNode::Pattern { label: b, .. }) => {
                    Some((a.clone(), b.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Renders the trace in Graphviz DOT.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }
}

impl std::fmt::Display for ResolutionTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_dot())
    }
}

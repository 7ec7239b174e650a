//! The directed control-flow graph a run follows.
//!
//! A [`WorkflowGraph`] is an immutable value: an entry step, exactly one
//! outgoing [`Edge`] per step, and one branch table translating the router's
//! [`Destination`] into the next hop. It is built once at startup and handed
//! to the executor, which asks it for the next hop after every step.
//!
//! The standard graph is:
//!
//! ```text
//! Researcher ──▶ Writer ──▶ Reviewer ──▶ (router)
//!                  ▲                        │
//!                  └──────── Writer ◀───────┤
//!                            Publisher ◀────┤──▶ END
//!                                │
//!                                └──▶ END
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::{Destination, Router};
use crate::{ArticleState, PipelineError};

/// One of the four agent steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StepName {
    Researcher,
    Writer,
    Reviewer,
    Publisher,
}

impl StepName {
    pub const ALL: [StepName; 4] = [
        StepName::Researcher,
        StepName::Writer,
        StepName::Reviewer,
        StepName::Publisher,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepName::Researcher => "Researcher",
            StepName::Writer => "Writer",
            StepName::Reviewer => "Reviewer",
            StepName::Publisher => "Publisher",
        }
    }
}

impl std::fmt::Display for StepName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The hop after a step finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Next {
    Step(StepName),
    Terminate,
}

/// How control leaves a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Always continue with the given step.
    To(StepName),
    /// Ask the router, then follow the branch table.
    Route,
    /// The run ends after this step.
    End,
}

/// Translation of router destinations into hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BranchTable {
    writer: Next,
    publisher: Next,
}

impl BranchTable {
    fn resolve(&self, destination: Destination) -> Next {
        match destination {
            Destination::Writer => self.writer,
            Destination::Publisher => self.publisher,
            // Budget exhaustion always ends the run; not configurable.
            Destination::Terminate => Next::Terminate,
        }
    }
}

/// An immutable, validated workflow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowGraph {
    entry: StepName,
    edges: BTreeMap<StepName, Edge>,
    branches: BranchTable,
    router: Router,
}

impl WorkflowGraph {
    /// Researcher → Writer → Reviewer → (router) with Publisher → END.
    pub fn standard(router: Router) -> Self {
        Self {
            entry: StepName::Researcher,
            edges: BTreeMap::from([
                (StepName::Researcher, Edge::To(StepName::Writer)),
                (StepName::Writer, Edge::To(StepName::Reviewer)),
                (StepName::Reviewer, Edge::Route),
                (StepName::Publisher, Edge::End),
            ]),
            branches: BranchTable {
                writer: Next::Step(StepName::Writer),
                publisher: Next::Step(StepName::Publisher),
            },
            router,
        }
    }

    /// Like [`WorkflowGraph::standard`], but an approved draft ends the run
    /// instead of being published.
    pub fn without_publishing(router: Router) -> Self {
        Self {
            entry: StepName::Researcher,
            edges: BTreeMap::from([
                (StepName::Researcher, Edge::To(StepName::Writer)),
                (StepName::Writer, Edge::To(StepName::Reviewer)),
                (StepName::Reviewer, Edge::Route),
            ]),
            branches: BranchTable {
                writer: Next::Step(StepName::Writer),
                publisher: Next::Terminate,
            },
            router,
        }
    }

    /// Starts building a custom graph.
    pub fn builder(entry: StepName) -> GraphBuilder {
        GraphBuilder {
            entry,
            edges: Vec::new(),
            on_revise: Next::Step(StepName::Writer),
            on_approve: Next::Step(StepName::Publisher),
            router: Router::default(),
        }
    }

    pub fn entry(&self) -> StepName {
        self.entry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Steps that appear in this graph, in declaration order of [`StepName`].
    pub fn steps(&self) -> impl Iterator<Item = StepName> + '_ {
        self.edges.keys().copied()
    }

    pub fn contains(&self, step: StepName) -> bool {
        self.edges.contains_key(&step)
    }

    pub fn edge(&self, step: StepName) -> Option<Edge> {
        self.edges.get(&step).copied()
    }

    /// Resolves the hop after `step` given the state it left behind.
    ///
    /// A step absent from the graph ends the run; validation guarantees the
    /// executor never reaches one.
    pub fn next(&self, step: StepName, state: &ArticleState) -> Next {
        match self.edges.get(&step) {
            Some(Edge::To(target)) => Next::Step(*target),
            Some(Edge::Route) => self.branches.resolve(self.router.decide(state)),
            Some(Edge::End) | None => Next::Terminate,
        }
    }
}

/// Builder for a custom [`WorkflowGraph`]; validated on [`GraphBuilder::build`].
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    entry: StepName,
    edges: Vec<(StepName, Edge)>,
    on_revise: Next,
    on_approve: Next,
    router: Router,
}

impl GraphBuilder {
    pub fn edge(mut self, from: StepName, edge: Edge) -> Self {
        self.edges.push((from, edge));
        self
    }

    /// Where a [`Destination::Writer`] decision leads.
    pub fn on_revise(mut self, next: Next) -> Self {
        self.on_revise = next;
        self
    }

    /// Where a [`Destination::Publisher`] decision leads.
    pub fn on_approve(mut self, next: Next) -> Self {
        self.on_approve = next;
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Validates and freezes the graph.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidGraph`] if a step has two outgoing edges, the
    /// entry step has none, an edge or branch targets a step with no outgoing
    /// edge, or the graph has no router branch. Loops must pass through the
    /// router, and a branch that leads back to the router must pass through
    /// [`StepName::Writer`], the only step that advances the revision count.
    pub fn build(self) -> Result<WorkflowGraph, PipelineError> {
        let mut edges = BTreeMap::new();
        for (from, edge) in self.edges {
            if edges.insert(from, edge).is_some() {
                return Err(invalid(format!("{from} has more than one outgoing edge")));
            }
        }

        if !edges.contains_key(&self.entry) {
            return Err(invalid(format!("entry step {} has no outgoing edge", self.entry)));
        }

        let routes = edges.values().filter(|e| matches!(e, Edge::Route)).count();
        if routes != 1 {
            return Err(invalid(format!(
                "expected exactly one router branch, found {routes}"
            )));
        }

        for (from, edge) in &edges {
            if let Edge::To(target) = edge {
                if !edges.contains_key(target) {
                    return Err(invalid(format!("{from} → {target}: target is not in the graph")));
                }
            }
        }

        for next in [self.on_revise, self.on_approve] {
            if let Next::Step(target) = next {
                if !edges.contains_key(&target) {
                    return Err(invalid(format!("branch target {target} is not in the graph")));
                }
            }
        }

        for start in edges.keys().copied() {
            static_path(&edges, start)?;
        }

        for next in [self.on_revise, self.on_approve] {
            if let Next::Step(target) = next {
                let (path, last) = static_path(&edges, target)?;
                if edges.get(&last) == Some(&Edge::Route) && !path.contains(&StepName::Writer) {
                    return Err(invalid(format!(
                        "branch to {target} returns to the router without passing {}",
                        StepName::Writer
                    )));
                }
            }
        }

        Ok(WorkflowGraph {
            entry: self.entry,
            edges,
            branches: BranchTable {
                writer: self.on_revise,
                publisher: self.on_approve,
            },
            router: self.router,
        })
    }
}

/// Follows `To` edges from `start` until a `Route` or `End` step; returns the
/// steps visited and the step the walk stopped on.
fn static_path(
    edges: &BTreeMap<StepName, Edge>,
    start: StepName,
) -> Result<(Vec<StepName>, StepName), PipelineError> {
    let mut path = vec![start];
    let mut current = start;
    while let Some(Edge::To(target)) = edges.get(&current) {
        if path.contains(target) {
            return Err(invalid(format!(
                "{current} → {target} closes a loop that never reaches the router"
            )));
        }
        path.push(*target);
        current = *target;
    }
    Ok((path, current))
}

fn invalid(reason: String) -> PipelineError {
    PipelineError::InvalidGraph { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Topic;

    fn state(feedback: &str, count: u32) -> ArticleState {
        let mut state = ArticleState::new(Topic::new("t").unwrap());
        state.review_feedback = feedback.into();
        state.revision_count = count;
        state
    }

    #[test]
    fn standard_graph_static_edges() {
        let graph = WorkflowGraph::standard(Router::default());
        let s = state("", 0);
        assert_eq!(graph.entry(), StepName::Researcher);
        assert_eq!(
            graph.next(StepName::Researcher, &s),
            Next::Step(StepName::Writer)
        );
        assert_eq!(
            graph.next(StepName::Writer, &s),
            Next::Step(StepName::Reviewer)
        );
        assert_eq!(graph.next(StepName::Publisher, &s), Next::Terminate);
    }

    #[test]
    fn standard_graph_reviewer_branches() {
        let graph = WorkflowGraph::standard(Router::default());
        assert_eq!(
            graph.next(StepName::Reviewer, &state("APPROVE", 1)),
            Next::Step(StepName::Publisher)
        );
        assert_eq!(
            graph.next(StepName::Reviewer, &state("Needs work", 1)),
            Next::Step(StepName::Writer)
        );
        assert_eq!(
            graph.next(StepName::Reviewer, &state("APPROVE", 3)),
            Next::Terminate
        );
    }

    #[test]
    fn graph_without_publishing_ends_on_approval() {
        let graph = WorkflowGraph::without_publishing(Router::default());
        assert!(!graph.contains(StepName::Publisher));
        assert_eq!(
            graph.next(StepName::Reviewer, &state("APPROVE", 1)),
            Next::Terminate
        );
        assert_eq!(
            graph.next(StepName::Reviewer, &state("Needs work", 1)),
            Next::Step(StepName::Writer)
        );
    }

    #[test]
    fn builder_reproduces_standard_graph() {
        let built = WorkflowGraph::builder(StepName::Researcher)
            .edge(StepName::Researcher, Edge::To(StepName::Writer))
            .edge(StepName::Writer, Edge::To(StepName::Reviewer))
            .edge(StepName::Reviewer, Edge::Route)
            .edge(StepName::Publisher, Edge::End)
            .build()
            .unwrap();
        assert_eq!(built, WorkflowGraph::standard(Router::default()));
    }

    #[test]
    fn builder_rejects_duplicate_edges() {
        let err = WorkflowGraph::builder(StepName::Researcher)
            .edge(StepName::Researcher, Edge::To(StepName::Writer))
            .edge(StepName::Researcher, Edge::End)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than one outgoing edge"));
    }

    #[test]
    fn builder_requires_exactly_one_branch() {
        let err = WorkflowGraph::builder(StepName::Researcher)
            .edge(StepName::Researcher, Edge::End)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("exactly one router branch"));
    }

    #[test]
    fn builder_rejects_dangling_targets() {
        let err = WorkflowGraph::builder(StepName::Researcher)
            .edge(StepName::Researcher, Edge::To(StepName::Writer))
            .edge(StepName::Writer, Edge::To(StepName::Reviewer))
            .edge(StepName::Reviewer, Edge::Route)
            .build()
            .unwrap_err();
        // Default approve branch targets Publisher, which has no edge.
        assert!(err.to_string().contains("Publisher"));
    }

    #[test]
    fn builder_rejects_missing_entry() {
        let err = WorkflowGraph::builder(StepName::Researcher)
            .edge(StepName::Writer, Edge::Route)
            .on_approve(Next::Terminate)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("entry step"));
    }

    #[test]
    fn builder_rejects_loop_that_bypasses_router() {
        let err = WorkflowGraph::builder(StepName::Researcher)
            .edge(StepName::Researcher, Edge::To(StepName::Writer))
            .edge(StepName::Writer, Edge::To(StepName::Researcher))
            .edge(StepName::Reviewer, Edge::Route)
            .edge(StepName::Publisher, Edge::End)
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidGraph { .. }));
        assert!(err.to_string().contains("never reaches the router"));
    }

    #[test]
    fn builder_rejects_self_loop() {
        let err = WorkflowGraph::builder(StepName::Researcher)
            .edge(StepName::Researcher, Edge::To(StepName::Researcher))
            .edge(StepName::Reviewer, Edge::Route)
            .on_approve(Next::Terminate)
            .on_revise(Next::Step(StepName::Reviewer))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("never reaches the router"));
    }

    #[test]
    fn builder_rejects_revision_loop_without_writer() {
        let err = WorkflowGraph::builder(StepName::Researcher)
            .edge(StepName::Researcher, Edge::To(StepName::Writer))
            .edge(StepName::Writer, Edge::To(StepName::Reviewer))
            .edge(StepName::Reviewer, Edge::Route)
            .on_revise(Next::Step(StepName::Reviewer))
            .on_approve(Next::Terminate)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("without passing Writer"));
    }

    #[test]
    fn every_accepted_graph_terminates_once_budget_is_spent() {
        let graph = WorkflowGraph::builder(StepName::Researcher)
            .edge(StepName::Researcher, Edge::To(StepName::Writer))
            .edge(StepName::Writer, Edge::To(StepName::Reviewer))
            .edge(StepName::Reviewer, Edge::Route)
            .on_approve(Next::Terminate)
            .build()
            .unwrap();

        // Walk the graph, bumping the count whenever Writer runs, as the step does.
        let mut s = state("needs work", 0);
        let mut current = graph.entry();
        let mut hops = 0;
        loop {
            if current == StepName::Writer {
                s.revision_count += 1;
            }
            hops += 1;
            assert!(hops < 100, "graph did not terminate");
            match graph.next(current, &s) {
                Next::Step(next) => current = next,
                Next::Terminate => break,
            }
        }
        assert_eq!(s.revision_count, 3);
    }
}

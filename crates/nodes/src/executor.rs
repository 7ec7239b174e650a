//! The graph executor.
//!
//! [`PipelineExecutor`] pairs a validated [`WorkflowGraph`] with one
//! [`AgentStep`] per graph node and drives a run: invoke the current step,
//! merge its patch, ask the graph for the next hop, repeat until the graph
//! says [`Next::Terminate`]. Steps run strictly one after another; the state
//! is lent to exactly one step at a time.
//!
//! Termination of the revision loop rests on the router's revision budget,
//! which the graph consults on every pass through the reviewer.

use std::collections::BTreeMap;
use std::sync::Arc;

use pipeline::{
    ArticleRequest, ArticleResponse, ArticleState, GenerationCapability, Next, PipelineError,
    PublishCapability, RevisionBudget, Router, RunId, SearchCapability, StepName, Tag,
    Temperature, Timestamp, Topic, WorkflowGraph,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Instrument};

use crate::steps::{default_tags, AgentStep, Publisher, Researcher, Reviewer, Writer};

/// Everything a completed run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub state: ArticleState,
    /// Steps in the order they ran.
    pub trace: Vec<StepName>,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl RunReport {
    /// How many times `step` ran.
    pub fn runs_of(&self, step: StepName) -> usize {
        self.trace.iter().filter(|s| **s == step).count()
    }

    pub fn response(&self) -> ArticleResponse {
        self.state.clone().into_response()
    }

    pub fn into_response(self) -> ArticleResponse {
        self.state.into_response()
    }
}

/// Tunables for the standard four-step pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub writer_temperature: Temperature,
    pub reviewer_temperature: Temperature,
    pub max_revisions: RevisionBudget,
    pub tags: std::collections::BTreeSet<Tag>,
    /// `false` ends the run on approval instead of publishing.
    pub publish: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            writer_temperature: Temperature::CREATIVE,
            reviewer_temperature: Temperature::DETERMINISTIC,
            max_revisions: RevisionBudget::default(),
            tags: default_tags(),
            publish: true,
        }
    }
}

/// Drives a [`WorkflowGraph`] to completion.
pub struct PipelineExecutor {
    graph: WorkflowGraph,
    steps: BTreeMap<StepName, Arc<dyn AgentStep>>,
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("graph", &self.graph)
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PipelineExecutor {
    /// Binds `steps` to the nodes of `graph`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidGraph`] if a graph node has no step, or two
    /// steps claim the same node.
    pub fn new(
        graph: WorkflowGraph,
        steps: impl IntoIterator<Item = Arc<dyn AgentStep>>,
    ) -> Result<Self, PipelineError> {
        let mut by_name = BTreeMap::new();
        for step in steps {
            let name = step.name();
            if by_name.insert(name, step).is_some() {
                return Err(PipelineError::InvalidGraph {
                    reason: format!("more than one step registered for {name}"),
                });
            }
        }

        if let Some(missing) = graph.steps().find(|name| !by_name.contains_key(name)) {
            return Err(PipelineError::InvalidGraph {
                reason: format!("no step registered for {missing}"),
            });
        }

        Ok(Self {
            graph,
            steps: by_name,
        })
    }

    /// Assembles the standard researcher → writer → reviewer → publisher
    /// pipeline from three capabilities.
    pub fn standard(
        search: Arc<dyn SearchCapability>,
        generator: Arc<dyn GenerationCapability>,
        publisher: Arc<dyn PublishCapability>,
        settings: PipelineSettings,
    ) -> Self {
        let router = Router::new(settings.max_revisions);
        let graph = if settings.publish {
            WorkflowGraph::standard(router)
        } else {
            WorkflowGraph::without_publishing(router)
        };

        let mut steps: BTreeMap<StepName, Arc<dyn AgentStep>> = BTreeMap::new();
        steps.insert(StepName::Researcher, Arc::new(Researcher::new(search)));
        steps.insert(
            StepName::Writer,
            Arc::new(Writer::new(generator.clone()).with_temperature(settings.writer_temperature)),
        );
        steps.insert(
            StepName::Reviewer,
            Arc::new(Reviewer::new(generator).with_temperature(settings.reviewer_temperature)),
        );
        if settings.publish {
            steps.insert(
                StepName::Publisher,
                Arc::new(Publisher::new(publisher).with_tags(settings.tags)),
            );
        }

        Self { graph, steps }
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    /// Runs the graph for one topic and returns the full report.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Generation`] if the writer or reviewer cannot reach
    /// the generation capability. The partial state is discarded.
    pub async fn run(&self, request: ArticleRequest) -> Result<RunReport, PipelineError> {
        let run_id = RunId::new_random();
        let span = info_span!("pipeline_run", run_id = %run_id, topic = %request.topic);
        self.execute(run_id, request.topic).instrument(span).await
    }

    /// Runs the graph for one topic and returns the caller-facing response.
    pub async fn invoke(&self, topic: Topic) -> Result<ArticleResponse, PipelineError> {
        Ok(self.run(ArticleRequest { topic }).await?.into_response())
    }

    async fn execute(&self, run_id: RunId, topic: Topic) -> Result<RunReport, PipelineError> {
        let started_at = Timestamp::now();
        let mut state = ArticleState::new(topic);
        let mut trace = Vec::new();
        let mut current = self.graph.entry();

        info!(entry = %current, budget = %self.graph.router().budget(), "Run started");

        loop {
            let step = self.step(current)?;
            let patch = step
                .run(&state)
                .instrument(info_span!("step", step = %current))
                .await?;
            debug!(step = %current, fields = ?patch.touched_fields(), "Merging patch");
            state.merge(patch);
            trace.push(current);

            match self.graph.next(current, &state) {
                Next::Step(next) => {
                    debug!(from = %current, to = %next, revision = state.revision_count, "Transition");
                    current = next;
                }
                Next::Terminate => {
                    info!(
                        last_step = %current,
                        revision_count = state.revision_count,
                        "Run finished"
                    );
                    break;
                }
            }
        }

        let finished_at = Timestamp::now();
        info!(
            steps = trace.len(),
            elapsed_ms = started_at.millis_until(finished_at),
            "Run complete"
        );

        Ok(RunReport {
            run_id,
            state,
            trace,
            started_at,
            finished_at,
        })
    }

    fn step(&self, name: StepName) -> Result<&Arc<dyn AgentStep>, PipelineError> {
        self.steps.get(&name).ok_or_else(|| PipelineError::InvalidGraph {
            reason: format!("no step registered for {name}"),
        })
    }
}

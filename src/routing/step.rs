//! Step-event emission and cooperative cancellation.
//!
//! Algorithms push [`AlgorithmStep`] records into a [`StepSink`] owned by
//! the collaborator; the sink may buffer, forward to a channel, or discard,
//! but must not block algorithm progress. A missing sink never changes the
//! search outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::{AlgorithmKind, AlgorithmStep, StepAction};

/// Receiver of step events during a single algorithm run.
pub trait StepSink: Send {
    fn emit(&mut self, step: AlgorithmStep);
}

impl<F> StepSink for F
where
    F: FnMut(AlgorithmStep) + Send,
{
    fn emit(&mut self, step: AlgorithmStep) {
        self(step)
    }
}

/// Sink that pushes steps into an unbounded channel, for collaborators
/// that fan events out from another task.
pub struct ChannelSink(pub UnboundedSender<AlgorithmStep>);

impl StepSink for ChannelSink {
    fn emit(&mut self, step: AlgorithmStep) {
        // A dropped receiver means the observer went away; the run itself
        // must not care.
        let _ = self.0.send(step);
    }
}

/// Cooperative cancellation flag checked at expand/select boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Numbers the steps of one run and forwards them to the optional sink.
pub struct StepTracer<'a> {
    algo: AlgorithmKind,
    next_step: u64,
    sink: Option<&'a mut dyn StepSink>,
}

impl<'a> StepTracer<'a> {
    pub fn new(algo: AlgorithmKind, sink: Option<&'a mut dyn StepSink>) -> Self {
        Self {
            algo,
            next_step: 0,
            sink,
        }
    }

    fn push(&mut self, step: AlgorithmStep) {
        if let Some(sink) = self.sink.as_deref_mut() {
            sink.emit(step);
        }
    }

    fn blank(&mut self, action: StepAction) -> AlgorithmStep {
        let step = AlgorithmStep {
            algo: self.algo,
            step: self.next_step,
            action,
            node: None,
            from: None,
            to: None,
            open_size: None,
            g: None,
            f: None,
            dist: None,
            path: None,
        };
        self.next_step += 1;
        step
    }

    /// A node was dequeued for expansion. `g`/`f` are A*'s scores, `dist`
    /// is Dijkstra's tentative distance; each algorithm fills its own.
    pub fn expand(
        &mut self,
        node: &str,
        open_size: usize,
        g: Option<f64>,
        f: Option<f64>,
        dist: Option<f64>,
    ) {
        let mut step = self.blank(StepAction::Expand);
        step.node = Some(node.to_string());
        step.open_size = Some(open_size);
        step.g = g;
        step.f = f;
        step.dist = dist;
        self.push(step);
    }

    /// A* relaxation producing an improvement.
    pub fn consider(&mut self, from: &str, to: &str, g: f64, f: f64) {
        let mut step = self.blank(StepAction::Consider);
        step.from = Some(from.to_string());
        step.to = Some(to.to_string());
        step.g = Some(g);
        step.f = Some(f);
        self.push(step);
    }

    /// Dijkstra relaxation producing an improvement.
    pub fn relax(&mut self, from: &str, to: &str, dist: f64) {
        let mut step = self.blank(StepAction::Relax);
        step.from = Some(from.to_string());
        step.to = Some(to.to_string());
        step.dist = Some(dist);
        self.push(step);
    }

    /// Greedy picked its next hop.
    pub fn select(&mut self, from: &str, to: &str) {
        let mut step = self.blank(StepAction::Select);
        step.from = Some(from.to_string());
        step.to = Some(to.to_string());
        self.push(step);
    }

    /// Terminal step; `path` is absent when the search failed.
    pub fn complete(
        &mut self,
        node: Option<&str>,
        path: Option<&[String]>,
        g: Option<f64>,
        dist: Option<f64>,
    ) {
        let mut step = self.blank(StepAction::Complete);
        step.node = node.map(str::to_string);
        step.path = path.map(<[String]>::to_vec);
        step.g = g;
        step.dist = dist;
        self.push(step);
    }
}

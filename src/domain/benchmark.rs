//! Benchmark records: per-node samples, aggregates and creation results.

use std::fmt;

use crate::domain::{DomainError, DomainResult, Node, NodeId};

/// Timed query kinds. Each maps to one field of [`BenchmarkSample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    RootTime,
    SelfAndDescendantsTime,
    SelfAndAncestorsTime,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::RootTime,
        Metric::SelfAndDescendantsTime,
        Metric::SelfAndAncestorsTime,
    ];

    /// Value of this metric in `sample`, in milliseconds.
    pub fn of(self, sample: &BenchmarkSample) -> f64 {
        match self {
            Metric::RootTime => sample.root_ms,
            Metric::SelfAndDescendantsTime => sample.self_and_descendants_ms,
            Metric::SelfAndAncestorsTime => sample.self_and_ancestors_ms,
        }
    }

    /// Name of the query the metric times.
    pub fn query_name(self) -> &'static str {
        match self {
            Metric::RootTime => "root",
            Metric::SelfAndDescendantsTime => "self_and_descendants",
            Metric::SelfAndAncestorsTime => "self_and_ancestors",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_time", self.query_name())
    }
}

/// Snapshot of the node a sample was taken on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub id: NodeId,
    pub label: String,
    pub depth: usize,
}

impl NodeSummary {
    pub fn from_node(node: &Node, depth: usize) -> Self {
        Self {
            id: node.id,
            label: node.display_label(),
            depth,
        }
    }
}

/// Three query timings for one node. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSample {
    node: NodeSummary,
    root_ms: f64,
    self_and_descendants_ms: f64,
    self_and_ancestors_ms: f64,
}

impl BenchmarkSample {
    pub fn new(
        node: NodeSummary,
        root_ms: f64,
        self_and_descendants_ms: f64,
        self_and_ancestors_ms: f64,
    ) -> Self {
        Self {
            node,
            root_ms,
            self_and_descendants_ms,
            self_and_ancestors_ms,
        }
    }

    pub fn node(&self) -> &NodeSummary {
        &self.node
    }

    pub fn value(&self, metric: Metric) -> f64 {
        metric.of(self)
    }
}

/// Describes the tree a [`ResultAggregate`] was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateConfig {
    pub node_count: usize,
    pub generations: usize,
    pub closure_table_size: usize,
}

/// All samples for one tree configuration plus an optional deletion timing.
///
/// Samples can only be appended; the deletion timing can be set exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultAggregate {
    config: AggregateConfig,
    samples: Vec<BenchmarkSample>,
    deletion_ms: Option<f64>,
}

impl ResultAggregate {
    pub fn new(config: AggregateConfig) -> Self {
        Self {
            config,
            samples: Vec::new(),
            deletion_ms: None,
        }
    }

    pub fn config(&self) -> AggregateConfig {
        self.config
    }

    pub fn push(&mut self, sample: BenchmarkSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[BenchmarkSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn deletion_ms(&self) -> Option<f64> {
        self.deletion_ms
    }

    pub fn record_deletion(&mut self, millis: f64) -> DomainResult<()> {
        if self.deletion_ms.is_some() {
            return Err(DomainError::DeletionAlreadyRecorded);
        }
        self.deletion_ms = Some(millis);
        Ok(())
    }

    /// Sample with the smallest value of `metric`; ties go to the earliest sample.
    pub fn min_by(&self, metric: Metric) -> Option<&BenchmarkSample> {
        self.samples.iter().fold(None, |best, s| match best {
            Some(b) if metric.of(b) <= metric.of(s) => Some(b),
            _ => Some(s),
        })
    }

    /// Sample with the largest value of `metric`; ties go to the earliest sample.
    pub fn max_by(&self, metric: Metric) -> Option<&BenchmarkSample> {
        self.samples.iter().fold(None, |best, s| match best {
            Some(b) if metric.of(b) >= metric.of(s) => Some(b),
            _ => Some(s),
        })
    }

    /// Arithmetic mean of `metric`; 0.0 when there are no samples.
    pub fn average_by(&self, metric: Metric) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: f64 = self.samples.iter().map(|s| metric.of(s)).sum();
        total / self.samples.len() as f64
    }
}

/// Outcome of building one synthetic tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreationResult {
    pub node_count: usize,
    pub closure_table_size: usize,
    pub depth: usize,
    pub creation_ms: f64,
}

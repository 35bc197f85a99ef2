//! Benchmark service
//!
//! Builds one tree per configuration, times the three closure queries on every
//! node, then times deletion of the root.

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::application::sampler::Sampler;
use crate::application::services::{TreeGenerator, TreeStore};
use crate::application::ApplicationResult;
use crate::domain::{
    AggregateConfig, BenchmarkSample, CreationResult, DeleteMode, NodeId, NodeSummary,
    ResultAggregate, TreeShape,
};
use crate::infrastructure::traits::{Clock, SystemClock};

/// Creation timing plus query aggregate for one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRun {
    pub shape: TreeShape,
    pub creation: CreationResult,
    pub aggregate: ResultAggregate,
}

/// Options that apply to every configuration of a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkOptions {
    pub delete_mode: DeleteMode,
    pub measure_deletion: bool,
    pub parallel: bool,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        Self {
            delete_mode: DeleteMode::Cascade,
            measure_deletion: true,
            parallel: false,
        }
    }
}

/// Runs the benchmark pipeline against fresh in-memory trees.
#[derive(Debug, Clone)]
pub struct BenchmarkService<C: Clock = SystemClock> {
    sampler: Sampler<C>,
    options: BenchmarkOptions,
}

impl BenchmarkService<SystemClock> {
    /// Create a service timed by the system clock.
    pub fn new(options: BenchmarkOptions) -> Self {
        Self::with_clock(SystemClock::default(), options)
    }
}

impl<C: Clock> BenchmarkService<C> {
    /// Create a service timed by a custom clock (for testing).
    pub fn with_clock(clock: C, options: BenchmarkOptions) -> Self {
        Self {
            sampler: Sampler::new(clock),
            options,
        }
    }

    pub fn options(&self) -> BenchmarkOptions {
        self.options
    }

    /// Benchmark one configuration on its own tree.
    #[instrument(level = "info", skip(self, shape), fields(shape = %shape))]
    pub fn run(&self, shape: &TreeShape) -> ApplicationResult<BenchmarkRun> {
        shape.validate()?;
        let mut store = TreeStore::in_memory();

        let generated = self
            .sampler
            .time(|| TreeGenerator::new(shape.clone()).generate(&mut store));
        let tree = generated.value?;
        let creation = CreationResult {
            node_count: tree.node_count,
            closure_table_size: store.closure().len(),
            depth: tree.depth,
            creation_ms: generated.millis,
        };
        debug!(
            "built {} node(s), {} closure edge(s) in {:.3} ms",
            creation.node_count, creation.closure_table_size, creation.creation_ms
        );

        let mut aggregate = ResultAggregate::new(AggregateConfig {
            node_count: creation.node_count,
            generations: tree.depth,
            closure_table_size: creation.closure_table_size,
        });
        for id in store.node_ids() {
            aggregate.push(self.sample(&store, id)?);
        }

        if self.options.measure_deletion {
            let deleted = self
                .sampler
                .time(|| store.delete_node(tree.root, self.options.delete_mode));
            deleted.value?;
            aggregate.record_deletion(deleted.millis)?;
        }

        info!(
            "benchmarked {} node(s), closure table size {}",
            aggregate.len(),
            creation.closure_table_size
        );
        Ok(BenchmarkRun {
            shape: shape.clone(),
            creation,
            aggregate,
        })
    }

    /// Time the three queries on one node.
    fn sample(&self, store: &TreeStore, id: NodeId) -> ApplicationResult<BenchmarkSample> {
        let closure = store.closure();
        let node = store.node(id)?;
        let depth = closure.depth(id)?;

        let root = self.sampler.time(|| closure.root(id));
        root.value?;
        let descendants = self.sampler.time(|| closure.self_and_descendants(id));
        descendants.value?;
        let ancestors = self.sampler.time(|| closure.self_and_ancestors(id));
        ancestors.value?;

        Ok(BenchmarkSample::new(
            NodeSummary::from_node(&node, depth),
            root.millis,
            descendants.millis,
            ancestors.millis,
        ))
    }

    /// Benchmark every configuration, each on an independent tree.
    ///
    /// With `parallel` set the configurations run on the rayon pool; results
    /// keep the order of `shapes` either way.
    pub fn run_all(&self, shapes: &[TreeShape]) -> ApplicationResult<Vec<BenchmarkRun>> {
        for shape in shapes {
            shape.validate()?;
        }
        if self.options.parallel {
            shapes.par_iter().map(|shape| self.run(shape)).collect()
        } else {
            shapes.iter().map(|shape| self.run(shape)).collect()
        }
    }
}

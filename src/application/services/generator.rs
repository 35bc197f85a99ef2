//! Synthetic tree generator for benchmarks.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::application::services::TreeStore;
use crate::application::ApplicationResult;
use crate::domain::{NodeId, TreeShape};

/// Root and realised size of a generated tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedTree {
    pub root: NodeId,
    pub node_count: usize,
    pub depth: usize,
}

/// Builds trees breadth-first through [`TreeStore::create_node`].
///
/// Labels are path-style: the root is `0`, its children `0.0`, `0.1`, ...
#[derive(Debug, Clone)]
pub struct TreeGenerator {
    shape: TreeShape,
}

impl TreeGenerator {
    pub fn new(shape: TreeShape) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> &TreeShape {
        &self.shape
    }

    #[instrument(level = "debug", skip(self, store), fields(shape = %self.shape))]
    pub fn generate(&self, store: &mut TreeStore) -> ApplicationResult<GeneratedTree> {
        self.shape.validate()?;

        let seed = match self.shape {
            TreeShape::Random { seed, .. } => seed,
            TreeShape::Uniform { .. } => 0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let depth = self.shape.depth();

        let root = store.create_node(Some("0"), None)?;
        let mut node_count = 1;
        let mut queue = VecDeque::new();
        queue.push_back((root, "0".to_string(), 0usize));

        while let Some((parent, label, level)) = queue.pop_front() {
            if level >= depth {
                continue;
            }
            let fanout = match &self.shape {
                TreeShape::Uniform { branching, .. } => *branching,
                TreeShape::Random {
                    min_branching,
                    max_branching,
                    ..
                } => rng.gen_range(*min_branching..=*max_branching),
            };
            for i in 0..fanout {
                let child_label = format!("{label}.{i}");
                let child = store.create_node(Some(&child_label), Some(parent))?;
                node_count += 1;
                queue.push_back((child, child_label, level + 1));
            }
        }

        debug!("generated {} node(s)", node_count);
        Ok(GeneratedTree {
            root,
            node_count,
            depth,
        })
    }
}

//! Storage and clock boundary traits for testability
//!
//! These traits abstract the persistence collaborator and the time source,
//! allowing services to be tested with substitute implementations.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::{ClosureEdge, Node, NodeId};
use crate::infrastructure::StorageResult;

/// Transactional grouping of writes.
///
/// Writes issued between `begin` and `commit` either all persist or,
/// after `rollback`, none do.
pub trait Transactional {
    /// Open a transaction. Nested transactions are not supported.
    fn begin(&mut self) -> StorageResult<()>;

    /// Make all writes since `begin` permanent.
    fn commit(&mut self) -> StorageResult<()>;

    /// Undo all writes since `begin`.
    fn rollback(&mut self) -> StorageResult<()>;

    /// Whether a transaction is currently open.
    fn in_transaction(&self) -> bool;
}

/// Key-indexed table of node records.
pub trait NodeTable: Transactional + Send {
    /// Insert a new node. Fails if the id is already stored.
    fn insert(&mut self, node: Node) -> StorageResult<()>;

    /// Delete a node by key, returning the removed row.
    fn remove(&mut self, id: NodeId) -> StorageResult<Node>;

    /// Replace an existing row, returning the previous version.
    fn update(&mut self, node: Node) -> StorageResult<Node>;

    /// Look up a node by key.
    fn get(&self, id: NodeId) -> Option<Node>;

    /// Equality lookup on the parent column.
    fn children(&self, parent: NodeId) -> Vec<NodeId>;

    /// All stored ids in creation order.
    fn ids(&self) -> Vec<NodeId>;

    /// Number of stored rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Relation of (ancestor, descendant, distance) triples, unique per (ancestor, descendant).
pub trait EdgeRelation: Transactional + Send {
    /// Insert an edge. Fails if the (ancestor, descendant) pair is already stored.
    fn insert(&mut self, edge: ClosureEdge) -> StorageResult<()>;

    /// Delete the edge for a pair, returning it.
    fn remove(&mut self, ancestor: NodeId, descendant: NodeId) -> StorageResult<ClosureEdge>;

    /// Point lookup by pair.
    fn get(&self, ancestor: NodeId, descendant: NodeId) -> Option<ClosureEdge>;

    /// Equality lookup on the ancestor column.
    fn by_ancestor(&self, ancestor: NodeId) -> Vec<ClosureEdge>;

    /// Equality lookup on the descendant column.
    fn by_descendant(&self, descendant: NodeId) -> Vec<ClosureEdge>;

    /// Every stored edge, in unspecified order.
    fn all(&self) -> Vec<ClosureEdge>;

    /// Number of stored edges.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Monotonic time source for the sampler.
pub trait Clock: Send + Sync {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

//! Tree store service
//!
//! Owns the node table and the closure index and keeps them in step:
//! every structural change runs as one transaction spanning both.

use std::collections::BTreeMap;

use tracing::{debug, error, instrument, warn};

use crate::application::services::ClosureIndex;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DeleteMode, DomainError, Node, NodeId};
use crate::infrastructure::traits::{EdgeRelation, NodeTable, Transactional};
use crate::infrastructure::{MemoryEdgeRelation, MemoryNodeTable};

/// Node table plus closure index.
pub struct TreeStore {
    nodes: Box<dyn NodeTable>,
    closure: ClosureIndex,
    next_id: u64,
    next_sequence: u64,
}

impl std::fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStore")
            .field("nodes", &self.nodes.len())
            .field("closure", &self.closure)
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl TreeStore {
    /// Create a store over the given storage collaborators. Both must start empty.
    pub fn new(nodes: Box<dyn NodeTable>, edges: Box<dyn EdgeRelation>) -> Self {
        Self {
            nodes,
            closure: ClosureIndex::new(edges),
            next_id: 1,
            next_sequence: 0,
        }
    }

    /// Create a store backed by in-memory tables.
    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryNodeTable::new()),
            Box::new(MemoryEdgeRelation::new()),
        )
    }

    /// Read access to the closure index for queries.
    pub fn closure(&self) -> &ClosureIndex {
        &self.closure
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in creation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.ids()
    }

    pub fn node(&self, id: NodeId) -> ApplicationResult<Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| DomainError::NotFound(id).into())
    }

    pub fn depth(&self, id: NodeId) -> ApplicationResult<usize> {
        self.closure.depth(id)
    }

    /// Run `op` inside one transaction on both tables; roll both back on error.
    fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> ApplicationResult<T>,
    ) -> ApplicationResult<T> {
        self.nodes.begin()?;
        if let Err(e) = self.closure.begin() {
            self.nodes.rollback()?;
            return Err(e.into());
        }

        match op(self) {
            Ok(value) => {
                self.nodes.commit()?;
                self.closure.commit()?;
                Ok(value)
            }
            Err(e) => {
                warn!("rolling back tree mutation: {}", e);
                let nodes = self.nodes.rollback();
                let edges = self.closure.rollback();
                if let Err(rollback) = nodes.and(edges) {
                    error!("rollback failed: {}", rollback);
                    return Err(DomainError::InconsistentState(format!(
                        "rollback after '{e}' failed: {rollback}"
                    ))
                    .into());
                }
                Err(e)
            }
        }
    }

    /// Create a node below `parent` (or a new root) and index it.
    #[instrument(level = "debug", skip(self))]
    pub fn create_node(
        &mut self,
        label: Option<&str>,
        parent: Option<NodeId>,
    ) -> ApplicationResult<NodeId> {
        if let Some(p) = parent {
            if self.nodes.get(p).is_none() {
                return Err(DomainError::UnknownParent(p).into());
            }
        }

        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        let sequence = self.next_sequence;

        let node = Node::new(id, label.map(str::to_string), parent, sequence);
        self.atomically(|store| {
            store.nodes.insert(node)?;
            store.closure.insert(id, parent)
        })?;
        self.next_sequence += 1;
        Ok(id)
    }

    /// Delete `id` according to `mode`, returning the ids of all removed nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_node(&mut self, id: NodeId, mode: DeleteMode) -> ApplicationResult<Vec<NodeId>> {
        let target = self.node(id)?;

        self.atomically(|store| {
            if mode == DeleteMode::PromoteChildren {
                for child in store.nodes.children(id) {
                    let node = store
                        .nodes
                        .get(child)
                        .ok_or_else(|| ApplicationError::from(DomainError::NotFound(child)))?;
                    store.nodes.update(node.with_parent(target.parent))?;
                }
            }

            let removed = store.closure.delete(id, mode)?;
            for &gone in &removed {
                store.nodes.remove(gone).map_err(|e| {
                    ApplicationError::from(DomainError::InconsistentState(format!(
                        "closure index removed {gone} but node table did not: {e}"
                    )))
                })?;
            }
            debug!("removed {} node(s) starting at {}", removed.len(), id);
            Ok(removed)
        })
    }

    /// Move `id` (with its subtree) below `new_parent`, or make it a root when `None`.
    #[instrument(level = "debug", skip(self))]
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> ApplicationResult<()> {
        let node = self.node(id)?;
        if let Some(p) = new_parent {
            if self.nodes.get(p).is_none() {
                return Err(DomainError::UnknownParent(p).into());
            }
        }

        self.atomically(|store| {
            store.closure.move_subtree(id, new_parent)?;
            store.nodes.update(node.with_parent(new_parent))?;
            Ok(())
        })
    }

    /// Check the closure index against the parent pointers in the node table.
    pub fn verify(&self) -> ApplicationResult<()> {
        let parents: BTreeMap<NodeId, Option<NodeId>> = self
            .nodes
            .ids()
            .into_iter()
            .filter_map(|id| self.nodes.get(id).map(|n| (id, n.parent)))
            .collect();
        self.closure.verify(&parents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_created_nodes_when_listing_then_creation_order_kept() {
        let mut store = TreeStore::in_memory();
        let root = store.create_node(Some("root"), None).unwrap();
        let a = store.create_node(Some("a"), Some(root)).unwrap();
        let b = store.create_node(Some("b"), Some(root)).unwrap();
        assert_eq!(store.node_ids(), vec![root, a, b]);
        assert_eq!(store.closure().len(), 5);
        store.verify().unwrap();
    }

    #[test]
    fn given_deleted_node_when_creating_then_id_not_reused() {
        let mut store = TreeStore::in_memory();
        let root = store.create_node(None, None).unwrap();
        let child = store.create_node(None, Some(root)).unwrap();
        store.delete_node(child, DeleteMode::Cascade).unwrap();
        let next = store.create_node(None, Some(root)).unwrap();
        assert_ne!(next, child);
        assert!(next > child);
    }

    #[test]
    fn given_promote_delete_when_done_then_children_point_to_grandparent() {
        let mut store = TreeStore::in_memory();
        let root = store.create_node(Some("r"), None).unwrap();
        let mid = store.create_node(Some("m"), Some(root)).unwrap();
        let leaf = store.create_node(Some("l"), Some(mid)).unwrap();

        let removed = store.delete_node(mid, DeleteMode::PromoteChildren).unwrap();
        assert_eq!(removed, vec![mid]);
        assert_eq!(store.node(leaf).unwrap().parent, Some(root));
        store.verify().unwrap();
    }
}

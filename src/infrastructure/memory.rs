//! In-memory storage with an undo journal for transactions.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::trace;

use crate::domain::{ClosureEdge, Node, NodeId};
use crate::infrastructure::traits::{EdgeRelation, NodeTable, Transactional};
use crate::infrastructure::{StorageError, StorageResult};

#[derive(Debug)]
enum NodeUndo {
    Inserted(NodeId),
    Removed(Node),
    Updated(Node),
}

/// Node table kept in memory, indexed by id and by parent.
#[derive(Debug, Default)]
pub struct MemoryNodeTable {
    rows: HashMap<NodeId, Node>,
    by_parent: HashMap<NodeId, BTreeSet<NodeId>>,
    journal: Option<Vec<NodeUndo>>,
}

impl MemoryNodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, undo: NodeUndo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo);
        }
    }

    fn link(&mut self, node: &Node) {
        if let Some(parent) = node.parent {
            self.by_parent.entry(parent).or_default().insert(node.id);
        }
    }

    fn unlink(&mut self, node: &Node) {
        if let Some(parent) = node.parent {
            if let Some(children) = self.by_parent.get_mut(&parent) {
                children.remove(&node.id);
                if children.is_empty() {
                    self.by_parent.remove(&parent);
                }
            }
        }
    }

    fn raw_insert(&mut self, node: Node) {
        self.link(&node);
        self.rows.insert(node.id, node);
    }

    fn raw_remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.rows.remove(&id)?;
        self.unlink(&node);
        Some(node)
    }

    fn raw_replace(&mut self, node: Node) -> Option<Node> {
        let previous = self.raw_remove(node.id);
        self.raw_insert(node);
        previous
    }
}

impl Transactional for MemoryNodeTable {
    fn begin(&mut self) -> StorageResult<()> {
        if self.journal.is_some() {
            return Err(StorageError::TransactionAlreadyOpen);
        }
        self.journal = Some(Vec::new());
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        self.journal.take().ok_or(StorageError::NoTransaction)?;
        Ok(())
    }

    fn rollback(&mut self) -> StorageResult<()> {
        let journal = self.journal.take().ok_or(StorageError::NoTransaction)?;
        trace!("node table rollback: {} writes", journal.len());
        for undo in journal.into_iter().rev() {
            match undo {
                NodeUndo::Inserted(id) => {
                    self.raw_remove(id);
                }
                NodeUndo::Removed(node) => self.raw_insert(node),
                NodeUndo::Updated(previous) => {
                    self.raw_replace(previous);
                }
            }
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.journal.is_some()
    }
}

impl NodeTable for MemoryNodeTable {
    fn insert(&mut self, node: Node) -> StorageResult<()> {
        if self.rows.contains_key(&node.id) {
            return Err(StorageError::DuplicateNode(node.id));
        }
        self.record(NodeUndo::Inserted(node.id));
        self.raw_insert(node);
        Ok(())
    }

    fn remove(&mut self, id: NodeId) -> StorageResult<Node> {
        let node = self.raw_remove(id).ok_or(StorageError::MissingNode(id))?;
        self.record(NodeUndo::Removed(node.clone()));
        Ok(node)
    }

    fn update(&mut self, node: Node) -> StorageResult<Node> {
        if !self.rows.contains_key(&node.id) {
            return Err(StorageError::MissingNode(node.id));
        }
        let id = node.id;
        let previous = self.raw_replace(node).ok_or(StorageError::MissingNode(id))?;
        self.record(NodeUndo::Updated(previous.clone()));
        Ok(previous)
    }

    fn get(&self, id: NodeId) -> Option<Node> {
        self.rows.get(&id).cloned()
    }

    fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.by_parent
            .get(&parent)
            .map(|c| c.iter().copied().collect())
            .unwrap_or_default()
    }

    fn ids(&self) -> Vec<NodeId> {
        let mut rows: Vec<&Node> = self.rows.values().collect();
        rows.sort_by_key(|n| n.sequence);
        rows.into_iter().map(|n| n.id).collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug)]
enum EdgeUndo {
    Inserted(NodeId, NodeId),
    Removed(ClosureEdge),
}

/// Closure relation kept in memory with an index on each side of the pair.
#[derive(Debug, Default)]
pub struct MemoryEdgeRelation {
    by_ancestor: HashMap<NodeId, BTreeMap<NodeId, u32>>,
    by_descendant: HashMap<NodeId, BTreeMap<NodeId, u32>>,
    len: usize,
    journal: Option<Vec<EdgeUndo>>,
}

impl MemoryEdgeRelation {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, undo: EdgeUndo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo);
        }
    }

    fn raw_insert(&mut self, edge: ClosureEdge) {
        self.by_ancestor
            .entry(edge.ancestor)
            .or_default()
            .insert(edge.descendant, edge.distance);
        self.by_descendant
            .entry(edge.descendant)
            .or_default()
            .insert(edge.ancestor, edge.distance);
        self.len += 1;
    }

    fn raw_remove(&mut self, ancestor: NodeId, descendant: NodeId) -> Option<ClosureEdge> {
        let row = self.by_ancestor.get_mut(&ancestor)?;
        let distance = row.remove(&descendant)?;
        if row.is_empty() {
            self.by_ancestor.remove(&ancestor);
        }
        if let Some(column) = self.by_descendant.get_mut(&descendant) {
            column.remove(&ancestor);
            if column.is_empty() {
                self.by_descendant.remove(&descendant);
            }
        }
        self.len -= 1;
        Some(ClosureEdge::new(ancestor, descendant, distance))
    }
}

impl Transactional for MemoryEdgeRelation {
    fn begin(&mut self) -> StorageResult<()> {
        if self.journal.is_some() {
            return Err(StorageError::TransactionAlreadyOpen);
        }
        self.journal = Some(Vec::new());
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        self.journal.take().ok_or(StorageError::NoTransaction)?;
        Ok(())
    }

    fn rollback(&mut self) -> StorageResult<()> {
        let journal = self.journal.take().ok_or(StorageError::NoTransaction)?;
        trace!("edge relation rollback: {} writes", journal.len());
        for undo in journal.into_iter().rev() {
            match undo {
                EdgeUndo::Inserted(ancestor, descendant) => {
                    self.raw_remove(ancestor, descendant);
                }
                EdgeUndo::Removed(edge) => self.raw_insert(edge),
            }
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.journal.is_some()
    }
}

impl EdgeRelation for MemoryEdgeRelation {
    fn insert(&mut self, edge: ClosureEdge) -> StorageResult<()> {
        if self.get(edge.ancestor, edge.descendant).is_some() {
            return Err(StorageError::DuplicateEdge {
                ancestor: edge.ancestor,
                descendant: edge.descendant,
            });
        }
        self.record(EdgeUndo::Inserted(edge.ancestor, edge.descendant));
        self.raw_insert(edge);
        Ok(())
    }

    fn remove(&mut self, ancestor: NodeId, descendant: NodeId) -> StorageResult<ClosureEdge> {
        let edge = self
            .raw_remove(ancestor, descendant)
            .ok_or(StorageError::MissingEdge {
                ancestor,
                descendant,
            })?;
        self.record(EdgeUndo::Removed(edge));
        Ok(edge)
    }

    fn get(&self, ancestor: NodeId, descendant: NodeId) -> Option<ClosureEdge> {
        self.by_ancestor
            .get(&ancestor)
            .and_then(|row| row.get(&descendant))
            .map(|&distance| ClosureEdge::new(ancestor, descendant, distance))
    }

    fn by_ancestor(&self, ancestor: NodeId) -> Vec<ClosureEdge> {
        self.by_ancestor
            .get(&ancestor)
            .map(|row| {
                row.iter()
                    .map(|(&d, &distance)| ClosureEdge::new(ancestor, d, distance))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn by_descendant(&self, descendant: NodeId) -> Vec<ClosureEdge> {
        self.by_descendant
            .get(&descendant)
            .map(|column| {
                column
                    .iter()
                    .map(|(&a, &distance)| ClosureEdge::new(a, descendant, distance))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn all(&self) -> Vec<ClosureEdge> {
        self.by_ancestor
            .iter()
            .flat_map(|(&a, row)| {
                row.iter()
                    .map(move |(&d, &distance)| ClosureEdge::new(a, d, distance))
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> NodeId {
        NodeId::new(raw)
    }

    #[test]
    fn given_duplicate_pair_when_inserting_edge_then_rejected() {
        let mut rel = MemoryEdgeRelation::new();
        rel.insert(ClosureEdge::new(id(1), id(2), 1)).unwrap();
        let err = rel.insert(ClosureEdge::new(id(1), id(2), 3)).unwrap_err();
        assert_eq!(
            err,
            StorageError::DuplicateEdge {
                ancestor: id(1),
                descendant: id(2)
            }
        );
        assert_eq!(rel.len(), 1);
    }

    #[test]
    fn given_open_transaction_when_rollback_then_edges_restored() {
        let mut rel = MemoryEdgeRelation::new();
        rel.insert(ClosureEdge::reflexive(id(1))).unwrap();
        rel.insert(ClosureEdge::reflexive(id(2))).unwrap();

        rel.begin().unwrap();
        rel.remove(id(1), id(1)).unwrap();
        rel.insert(ClosureEdge::new(id(2), id(3), 1)).unwrap();
        rel.insert(ClosureEdge::reflexive(id(3))).unwrap();
        rel.rollback().unwrap();

        let mut edges = rel.all();
        edges.sort();
        assert_eq!(
            edges,
            vec![ClosureEdge::reflexive(id(1)), ClosureEdge::reflexive(id(2))]
        );
        assert!(rel.by_descendant(id(3)).is_empty());
        assert!(!rel.in_transaction());
    }

    #[test]
    fn given_no_transaction_when_commit_then_error() {
        let mut rel = MemoryEdgeRelation::new();
        assert_eq!(rel.commit(), Err(StorageError::NoTransaction));
        rel.begin().unwrap();
        assert_eq!(rel.begin(), Err(StorageError::TransactionAlreadyOpen));
    }

    #[test]
    fn given_updates_in_transaction_when_rollback_then_parent_index_restored() {
        let mut table = MemoryNodeTable::new();
        table.insert(Node::new(id(1), None, None, 0)).unwrap();
        table.insert(Node::new(id(2), None, Some(id(1)), 1)).unwrap();
        table.insert(Node::new(id(3), None, Some(id(2)), 2)).unwrap();

        table.begin().unwrap();
        let moved = table.get(id(3)).unwrap().with_parent(Some(id(1)));
        table.update(moved).unwrap();
        table.remove(id(2)).unwrap();
        assert_eq!(table.children(id(1)), vec![id(3)]);
        table.rollback().unwrap();

        assert_eq!(table.children(id(1)), vec![id(2)]);
        assert_eq!(table.children(id(2)), vec![id(3)]);
        assert_eq!(table.ids(), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn given_committed_writes_when_commit_then_kept() {
        let mut table = MemoryNodeTable::new();
        table.begin().unwrap();
        table.insert(Node::new(id(7), Some("seven".into()), None, 0)).unwrap();
        table.commit().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(id(7)).unwrap().label.as_deref(), Some("seven"));
        assert!(table.rollback().is_err());
    }
}

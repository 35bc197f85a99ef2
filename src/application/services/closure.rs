//! Closure-table index
//!
//! Maintains every (ancestor, descendant, distance) triple implied by the tree so that
//! root, ancestor and descendant lookups are single indexed reads instead of
//! recursive walks over parent pointers.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::domain::{ClosureEdge, DeleteMode, DomainError, NodeId};
use crate::infrastructure::traits::{EdgeRelation, Transactional};
use crate::infrastructure::{MemoryEdgeRelation, StorageResult};

/// Transitive closure over node identifiers.
pub struct ClosureIndex {
    edges: Box<dyn EdgeRelation>,
}

impl std::fmt::Debug for ClosureIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureIndex")
            .field("edges", &self.edges.len())
            .finish()
    }
}

impl Default for ClosureIndex {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ClosureIndex {
    /// Create an index over the given relation.
    pub fn new(edges: Box<dyn EdgeRelation>) -> Self {
        Self { edges }
    }

    /// Create an index backed by [`MemoryEdgeRelation`].
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryEdgeRelation::new()))
    }

    /// Whether `id` is indexed (has its reflexive edge).
    pub fn contains(&self, id: NodeId) -> bool {
        self.edges.get(id, id).is_some()
    }

    /// Closure table size.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Sorted snapshot of all edges.
    pub fn edges(&self) -> Vec<ClosureEdge> {
        let mut edges = self.edges.all();
        edges.sort();
        edges
    }

    fn require(&self, id: NodeId) -> ApplicationResult<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(DomainError::NotFound(id).into())
        }
    }

    /// Index a new node below `parent` (or as a root).
    ///
    /// Adds the reflexive edge plus one edge from every ancestor of `parent`,
    /// one generation further away.
    #[instrument(level = "debug", skip(self))]
    pub fn insert(&mut self, id: NodeId, parent: Option<NodeId>) -> ApplicationResult<()> {
        let lineage = match parent {
            Some(p) if !self.contains(p) => return Err(DomainError::UnknownParent(p).into()),
            Some(p) => self.edges.by_descendant(p),
            None => Vec::new(),
        };

        self.edges.insert(ClosureEdge::reflexive(id))?;
        for edge in lineage {
            self.edges
                .insert(ClosureEdge::new(edge.ancestor, id, edge.distance + 1))?;
        }
        Ok(())
    }

    /// The ancestor of `id` farthest away, i.e. the root of its tree.
    pub fn root(&self, id: NodeId) -> ApplicationResult<NodeId> {
        let lineage = self.edges.by_descendant(id);
        let top = lineage
            .iter()
            .max_by_key(|e| e.distance)
            .ok_or(DomainError::NotFound(id))?;

        // A single path: distances 0..=top.distance, one edge each.
        if lineage.len() != top.distance as usize + 1 {
            return Err(DomainError::InconsistentState(format!(
                "node {id} has {} ancestor edges but its root is {} generations away",
                lineage.len(),
                top.distance
            ))
            .into());
        }
        Ok(top.ancestor)
    }

    /// `id` and every node below it, ordered by distance then id.
    pub fn self_and_descendants(&self, id: NodeId) -> ApplicationResult<Vec<NodeId>> {
        let mut below = self.edges.by_ancestor(id);
        if below.is_empty() {
            return Err(DomainError::NotFound(id).into());
        }
        below.sort_by_key(|e| (e.distance, e.descendant));
        Ok(below.into_iter().map(|e| e.descendant).collect())
    }

    /// `id` and every node above it, ordered from `id` up to the root.
    pub fn self_and_ancestors(&self, id: NodeId) -> ApplicationResult<Vec<NodeId>> {
        let mut above = self.edges.by_descendant(id);
        if above.is_empty() {
            return Err(DomainError::NotFound(id).into());
        }
        above.sort_by_key(|e| e.distance);
        Ok(above.into_iter().map(|e| e.ancestor).collect())
    }

    pub fn parent(&self, id: NodeId) -> ApplicationResult<Option<NodeId>> {
        self.require(id)?;
        Ok(self
            .edges
            .by_descendant(id)
            .into_iter()
            .find(|e| e.distance == 1)
            .map(|e| e.ancestor))
    }

    pub fn children(&self, id: NodeId) -> ApplicationResult<Vec<NodeId>> {
        self.require(id)?;
        let mut children: Vec<NodeId> = self
            .edges
            .by_ancestor(id)
            .into_iter()
            .filter(|e| e.distance == 1)
            .map(|e| e.descendant)
            .collect();
        children.sort();
        Ok(children)
    }

    /// Number of generations between `id` and its root.
    pub fn depth(&self, id: NodeId) -> ApplicationResult<usize> {
        self.edges
            .by_descendant(id)
            .iter()
            .map(|e| e.distance as usize)
            .max()
            .ok_or_else(|| DomainError::NotFound(id).into())
    }

    /// Remove `id` from the index, returning every node that left the tree.
    ///
    /// `Cascade` drops the whole subtree. `PromoteChildren` drops only `id`;
    /// every path that ran through it gets one generation shorter.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, id: NodeId, mode: DeleteMode) -> ApplicationResult<Vec<NodeId>> {
        let removed = match mode {
            DeleteMode::Cascade => self.delete_subtree(id)?,
            DeleteMode::PromoteChildren => {
                self.delete_promoting(id)?;
                vec![id]
            }
        };
        debug!("deleted {} node(s) from closure index", removed.len());
        Ok(removed)
    }

    fn delete_subtree(&mut self, id: NodeId) -> ApplicationResult<Vec<NodeId>> {
        let subtree = self.self_and_descendants(id)?;
        for &node in &subtree {
            for edge in self.edges.by_descendant(node) {
                self.edges.remove(edge.ancestor, edge.descendant)?;
            }
        }
        Ok(subtree)
    }

    fn delete_promoting(&mut self, id: NodeId) -> ApplicationResult<()> {
        self.require(id)?;
        let above: Vec<ClosureEdge> = self
            .edges
            .by_descendant(id)
            .into_iter()
            .filter(|e| !e.is_reflexive())
            .collect();
        let below = self.edges.by_ancestor(id);

        for a in &above {
            for d in below.iter().filter(|d| d.distance > 0) {
                let through = self.edges.remove(a.ancestor, d.descendant)?;
                if through.distance != a.distance + d.distance {
                    return Err(DomainError::InconsistentState(format!(
                        "edge ({}, {}) has distance {}, expected {}",
                        a.ancestor,
                        d.descendant,
                        through.distance,
                        a.distance + d.distance
                    ))
                    .into());
                }
                self.edges.insert(ClosureEdge::new(
                    a.ancestor,
                    d.descendant,
                    through.distance - 1,
                ))?;
            }
        }

        // `below` includes the reflexive edge
        for d in &below {
            self.edges.remove(id, d.descendant)?;
        }
        for a in &above {
            self.edges.remove(a.ancestor, id)?;
        }
        Ok(())
    }

    /// Detach the subtree rooted at `id` and hang it below `new_parent`
    /// (or make it a separate root when `None`).
    ///
    /// Edges among `id` and its descendants are kept; edges from the old
    /// lineage are dropped and edges from the new lineage are added with
    /// distances summed through `new_parent`.
    #[instrument(level = "debug", skip(self))]
    pub fn move_subtree(&mut self, id: NodeId, new_parent: Option<NodeId>) -> ApplicationResult<()> {
        let subtree = self.edges.by_ancestor(id);
        if subtree.is_empty() {
            return Err(DomainError::NotFound(id).into());
        }

        let new_lineage = match new_parent {
            Some(p) if !self.contains(p) => return Err(DomainError::UnknownParent(p).into()),
            Some(p) if subtree.iter().any(|e| e.descendant == p) => {
                return Err(DomainError::CycleDetected {
                    node: id,
                    new_parent: p,
                }
                .into())
            }
            Some(p) => self.edges.by_descendant(p),
            None => Vec::new(),
        };

        let old_lineage: Vec<ClosureEdge> = self
            .edges
            .by_descendant(id)
            .into_iter()
            .filter(|e| !e.is_reflexive())
            .collect();

        for a in &old_lineage {
            for d in &subtree {
                self.edges.remove(a.ancestor, d.descendant)?;
            }
        }
        for a in &new_lineage {
            for d in &subtree {
                self.edges.insert(ClosureEdge::new(
                    a.ancestor,
                    d.descendant,
                    a.distance + d.distance + 1,
                ))?;
            }
        }
        debug!(
            "moved {} node(s): dropped {} lineage edge(s), added {}",
            subtree.len(),
            old_lineage.len() * subtree.len(),
            new_lineage.len() * subtree.len()
        );
        Ok(())
    }

    /// Rebuild the closure from `parents` and compare it with the stored edges.
    pub fn verify(&self, parents: &BTreeMap<NodeId, Option<NodeId>>) -> ApplicationResult<()> {
        let mut expected = BTreeSet::new();
        for &node in parents.keys() {
            let mut current = Some(node);
            let mut distance = 0u32;
            while let Some(ancestor) = current {
                if distance as usize > parents.len() {
                    return Err(DomainError::InconsistentState(format!(
                        "parent pointers of {node} form a cycle"
                    ))
                    .into());
                }
                expected.insert(ClosureEdge::new(ancestor, node, distance));
                current = match parents.get(&ancestor) {
                    Some(parent) => *parent,
                    None => {
                        return Err(DomainError::InconsistentState(format!(
                            "node {node} refers to unknown ancestor {ancestor}"
                        ))
                        .into())
                    }
                };
                distance += 1;
            }
        }

        let stored: BTreeSet<ClosureEdge> = self.edges.all().into_iter().collect();
        if let Some(missing) = expected.difference(&stored).next() {
            return Err(DomainError::InconsistentState(format!(
                "missing closure edge ({}, {}, {})",
                missing.ancestor, missing.descendant, missing.distance
            ))
            .into());
        }
        if let Some(extra) = stored.difference(&expected).next() {
            return Err(DomainError::InconsistentState(format!(
                "unexpected closure edge ({}, {}, {})",
                extra.ancestor, extra.descendant, extra.distance
            ))
            .into());
        }
        Ok(())
    }
}

impl Transactional for ClosureIndex {
    fn begin(&mut self) -> StorageResult<()> {
        self.edges.begin()
    }

    fn commit(&mut self) -> StorageResult<()> {
        self.edges.commit()
    }

    fn rollback(&mut self) -> StorageResult<()> {
        self.edges.rollback()
    }

    fn in_transaction(&self) -> bool {
        self.edges.in_transaction()
    }
}

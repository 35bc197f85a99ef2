//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Opaque node identifier. Allocated monotonically and never reused within a process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row of the node table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub label: Option<String>,
    /// `None` marks a root
    pub parent: Option<NodeId>,
    /// Creation order within the owning store
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    pub fn new(id: NodeId, label: Option<String>, parent: Option<NodeId>, sequence: u64) -> Self {
        let now = Utc::now();
        Self {
            id,
            label,
            parent,
            sequence,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Label for display, falling back to the identifier.
    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| format!("#{}", self.id))
    }

    /// Copy of this node attached to `parent`, with a fresh `updated_at`.
    pub fn with_parent(&self, parent: Option<NodeId>) -> Self {
        Self {
            parent,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// One (ancestor, descendant, generations) triple of the closure table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClosureEdge {
    pub ancestor: NodeId,
    pub descendant: NodeId,
    pub distance: u32,
}

impl ClosureEdge {
    pub fn new(ancestor: NodeId, descendant: NodeId, distance: u32) -> Self {
        Self {
            ancestor,
            descendant,
            distance,
        }
    }

    pub fn reflexive(id: NodeId) -> Self {
        Self::new(id, id, 0)
    }

    pub fn is_reflexive(&self) -> bool {
        self.distance == 0
    }
}

/// How `delete` treats the subtree below the deleted node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Remove the node and every descendant
    #[default]
    Cascade,
    /// Remove only the node and reattach its children to its parent
    PromoteChildren,
}

impl fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteMode::Cascade => write!(f, "cascade"),
            DeleteMode::PromoteChildren => write!(f, "promote_children"),
        }
    }
}

impl FromStr for DeleteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "cascade" => Ok(DeleteMode::Cascade),
            "promote" | "promote_children" => Ok(DeleteMode::PromoteChildren),
            other => Err(format!("unknown delete mode: {other}")),
        }
    }
}

/// Shape of a synthetic tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeShape {
    /// Every node above `depth` gets exactly `branching` children.
    Uniform { branching: usize, depth: usize },
    /// Per-node branching drawn uniformly from `min_branching..=max_branching`.
    Random {
        min_branching: usize,
        max_branching: usize,
        depth: usize,
        seed: u64,
    },
}

impl TreeShape {
    pub fn uniform(branching: usize, depth: usize) -> Self {
        TreeShape::Uniform { branching, depth }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeShape::Uniform { depth, .. } | TreeShape::Random { depth, .. } => *depth,
        }
    }

    /// Reject shapes that cannot produce a tree. Called before any node is created.
    pub fn validate(&self) -> DomainResult<()> {
        match self {
            TreeShape::Uniform { branching, .. } if *branching < 1 => Err(
                DomainError::InvalidShape(format!("branching factor must be >= 1, got {branching}")),
            ),
            TreeShape::Random {
                min_branching,
                max_branching,
                ..
            } => {
                if *max_branching < 1 {
                    return Err(DomainError::InvalidShape(format!(
                        "max branching factor must be >= 1, got {max_branching}"
                    )));
                }
                if min_branching > max_branching {
                    return Err(DomainError::InvalidShape(format!(
                        "min branching {min_branching} exceeds max branching {max_branching}"
                    )));
                }
                Ok(())
            }
            TreeShape::Uniform { .. } => Ok(()),
        }
    }

    /// Closed-form node count for uniform shapes, `None` when the shape is randomized.
    pub fn expected_nodes(&self) -> Option<usize> {
        match self {
            TreeShape::Uniform { branching: 1, depth } => Some(depth + 1),
            TreeShape::Uniform { branching, depth } => {
                let exponent = u32::try_from(*depth + 1).ok()?;
                let full = branching.checked_pow(exponent)?;
                Some((full - 1) / (branching - 1))
            }
            TreeShape::Random { .. } => None,
        }
    }
}

impl fmt::Display for TreeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeShape::Uniform { branching, depth } => {
                write!(f, "uniform(branching={branching}, depth={depth})")
            }
            TreeShape::Random {
                min_branching,
                max_branching,
                depth,
                seed,
            } => write!(
                f,
                "random(branching={min_branching}..={max_branching}, depth={depth}, seed={seed})"
            ),
        }
    }
}

//! Domain layer: participants, the multiplier forest and its layout
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod layout;

pub use arena::{create_branches, FollowerLeaf, HierarchyForest, HierarchyNode, TreeNodeConvert};
pub use builder::{BuildReport, HierarchyBuilder};
pub use entities::*;
pub use error::DomainError;
pub use layout::{
    EdgeKind, GraphEdge, GraphNode, LayoutConfig, LayoutEngine, LayoutGraph, NodeKind,
    CAMPAIGN_ROOT_ID,
};

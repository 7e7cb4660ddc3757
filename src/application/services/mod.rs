//! Application services

pub mod hierarchy;
pub mod participants;

pub use hierarchy::{HierarchyService, HierarchyView, TeamSize, TeamSummary};
pub use participants::{CampaignFile, ParticipantService, ParticipantSet};

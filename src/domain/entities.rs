//! Domain entities: participants, roles and campaigns

use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Role of a participant in a campaign.
///
/// Only `Multiplier` and `Follower` take part in the hierarchy; every other
/// role is carried through but ignored by the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Follower,
    Multiplier,
    Link,
    Coordinator,
    Admin,
    SuperAdmin,
    /// Any role string this crate does not know about
    #[serde(other)]
    Other,
}

impl Role {
    pub fn is_multiplier(self) -> bool {
        matches!(self, Role::Multiplier)
    }

    pub fn is_follower(self) -> bool {
        matches!(self, Role::Follower)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Follower => "FOLLOWER",
            Role::Multiplier => "MULTIPLIER",
            Role::Link => "LINK",
            Role::Coordinator => "COORDINATOR",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Other => "OTHER",
        };
        write!(f, "{}", s)
    }
}

/// A registered user as exported from the campaign backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub role: Role,
    /// Referring leader, defines the parent edge
    #[serde(default)]
    pub leader_id: Option<String>,
    /// Declared number of direct recruits (maintained upstream, may be stale)
    #[serde(default)]
    pub participants: Option<u32>,
    #[serde(default)]
    pub campaign_id: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            leader_id: None,
            participants: None,
            campaign_id: None,
        }
    }

    pub fn with_leader(mut self, leader_id: impl Into<String>) -> Self {
        self.leader_id = Some(leader_id.into());
        self
    }

    /// Leader id, `None` when missing or blank.
    pub fn leader(&self) -> Option<&str> {
        self.leader_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Records without an id cannot be placed in a hierarchy.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::InvalidParticipant(format!(
                "{} record without id (name: {:?})",
                self.role, self.name
            )));
        }
        Ok(())
    }

    /// Display label, falls back to the id for unnamed participants.
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.id)
    }
}

/// Campaign the hierarchy is computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
}

/// The campaigns currently selected for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignSelection {
    pub campaigns: Vec<Campaign>,
}

impl CampaignSelection {
    pub fn new(campaigns: Vec<Campaign>) -> Self {
        Self { campaigns }
    }

    /// Label of the synthetic campaign root.
    ///
    /// Several selected campaigns share one combined root.
    pub fn label(&self) -> String {
        match self.campaigns.as_slice() {
            [] => "All campaigns".to_string(),
            [single] => single.name.clone(),
            many => many.iter().map(|c| c.name.as_str()).join(" + "),
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.campaigns.iter().map(|c| c.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_unknown_role_string_when_deserializing_then_maps_to_other() {
        let p: Participant =
            serde_json::from_str(r#"{"id":"a","name":"A","role":"PROMOTER"}"#).unwrap();
        assert_eq!(p.role, Role::Other);
    }

    #[test]
    fn given_camel_case_json_when_deserializing_then_reads_leader_id() {
        let p: Participant = serde_json::from_str(
            r#"{"id":"b","name":"B","role":"SUPER_ADMIN","leaderId":"a","participants":3}"#,
        )
        .unwrap();
        assert_eq!(p.role, Role::SuperAdmin);
        assert_eq!(p.leader(), Some("a"));
        assert_eq!(p.participants, Some(3));
    }

    #[test]
    fn given_blank_leader_when_reading_leader_then_none() {
        let p = Participant::new("x", "X", Role::Multiplier).with_leader("  ");
        assert_eq!(p.leader(), None);
        let p: Participant =
            serde_json::from_str(r#"{"id":"y","role":"FOLLOWER","leaderId":null}"#).unwrap();
        assert_eq!(p.leader(), None);
        assert_eq!(p.label(), "y");
    }

    #[test]
    fn given_selection_when_labeling_then_joins_names() {
        let a = Campaign {
            id: "c1".into(),
            name: "Spring".into(),
        };
        let b = Campaign {
            id: "c2".into(),
            name: "Autumn".into(),
        };
        assert_eq!(CampaignSelection::default().label(), "All campaigns");
        assert_eq!(CampaignSelection::new(vec![a.clone()]).label(), "Spring");
        assert_eq!(CampaignSelection::new(vec![a, b]).label(), "Spring + Autumn");
    }
}

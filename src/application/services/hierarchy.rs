//! Hierarchy service: recomputes the forest, layout and team summary.

use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::domain::{
    BuildReport, CampaignSelection, HierarchyBuilder, HierarchyForest, LayoutConfig, LayoutEngine,
    LayoutGraph, Participant,
};

/// Team size of a single multiplier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSize {
    pub id: String,
    pub label: String,
    pub size: usize,
}

/// Aggregated figures for a computed hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamSummary {
    pub campaign_label: String,
    pub multipliers: usize,
    pub followers: usize,
    pub roots: usize,
    pub max_depth: usize,
    /// Root with the largest team; the first one wins ties
    pub largest_team: Option<TeamSize>,
    pub orphan_followers: usize,
    pub promoted_cycle_roots: usize,
    pub duplicate_ids: usize,
}

/// Everything derived from one participant list.
#[derive(Debug)]
pub struct HierarchyView {
    pub forest: HierarchyForest,
    pub report: BuildReport,
    pub graph: LayoutGraph,
    pub summary: TeamSummary,
}

/// Recompute-on-change entry point for hosting applications.
pub struct HierarchyService {
    engine: LayoutEngine,
}

impl HierarchyService {
    pub fn new(layout: LayoutConfig) -> ApplicationResult<Self> {
        Ok(Self {
            engine: LayoutEngine::new(layout)?,
        })
    }

    /// Rebuild forest, graph and summary from scratch.
    ///
    /// Call again whenever the participant list or the campaign selection
    /// changes; no state is kept between calls.
    #[instrument(level = "debug", skip(self, participants, selection))]
    pub fn build_view(
        &self,
        participants: &[Participant],
        selection: &CampaignSelection,
        exclude_id: Option<&str>,
    ) -> HierarchyView {
        let (forest, report) = HierarchyBuilder::new()
            .exclude(exclude_id)
            .build(participants);
        let label = selection.label();
        let graph = self.engine.layout(&forest, &label);
        let summary = summarize(&forest, &report, label);
        debug!("summary: {:?}", summary);

        HierarchyView {
            forest,
            report,
            graph,
            summary,
        }
    }
}

fn summarize(forest: &HierarchyForest, report: &BuildReport, campaign_label: String) -> TeamSummary {
    let mut largest_team: Option<TeamSize> = None;
    for &root in forest.roots() {
        let Some(node) = forest.get_node(root) else {
            continue;
        };
        let size = forest.team_size(root);
        if largest_team.as_ref().map_or(true, |t| size > t.size) {
            largest_team = Some(TeamSize {
                id: node.participant.id.clone(),
                label: node.participant.label().to_string(),
                size,
            });
        }
    }

    TeamSummary {
        campaign_label,
        multipliers: forest.len(),
        followers: forest.follower_count(),
        roots: forest.roots().len(),
        max_depth: forest.depth(),
        largest_team,
        orphan_followers: report.orphan_followers.len(),
        promoted_cycle_roots: report.promoted_cycle_roots.len(),
        duplicate_ids: report.duplicate_ids.len(),
    }
}

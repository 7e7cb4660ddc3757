//! Hierarchy builder: turns a flat participant list into a multiplier forest.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::HierarchyForest;
use crate::domain::entities::Participant;
use crate::domain::layout::CAMPAIGN_ROOT_ID;

/// Diagnostics collected while building a forest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Multipliers promoted to roots because their leader chain loops
    pub promoted_cycle_roots: Vec<String>,
    /// Followers whose leader is not a multiplier in the forest
    pub orphan_followers: Vec<String>,
    /// Ids seen more than once; only the first record is used
    pub duplicate_ids: Vec<String>,
    /// Records dropped because their id is taken by the synthetic campaign node
    pub reserved_ids: Vec<String>,
    /// Whether the excluded id was present in the input
    pub excluded: bool,
}

/// Builds multiplier forests from participant records.
///
/// The builder is stateless between calls; every `build` recomputes from its
/// inputs and the same input always yields the same forest.
pub struct HierarchyBuilder<'a> {
    exclude_id: Option<&'a str>,
}

impl Default for HierarchyBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new() -> Self {
        Self { exclude_id: None }
    }

    /// Drop this participant from both pools; its recruits become roots.
    pub fn exclude(mut self, id: Option<&'a str>) -> Self {
        self.exclude_id = id.filter(|id| !id.is_empty());
        self
    }

    #[instrument(level = "debug", skip(self, participants), fields(count = participants.len()))]
    pub fn build(&self, participants: &[Participant]) -> (HierarchyForest, BuildReport) {
        let mut report = BuildReport::default();

        // Partition by role, first occurrence of an id wins
        let mut seen: HashSet<&str> = HashSet::new();
        let mut multipliers: Vec<&Participant> = Vec::new();
        let mut followers: Vec<&Participant> = Vec::new();
        for p in participants {
            if Some(p.id.as_str()) == self.exclude_id {
                report.excluded = true;
                continue;
            }
            if p.id == CAMPAIGN_ROOT_ID {
                warn!("participant id {} is reserved, record ignored", p.id);
                report.reserved_ids.push(p.id.clone());
                continue;
            }
            if !seen.insert(p.id.as_str()) {
                warn!("duplicate participant id ignored: {}", p.id);
                report.duplicate_ids.push(p.id.clone());
                continue;
            }
            if p.role.is_multiplier() {
                multipliers.push(p);
            } else if p.role.is_follower() {
                followers.push(p);
            }
        }

        let multiplier_ids: HashSet<&str> = multipliers.iter().map(|m| m.id.as_str()).collect();

        // leader id -> child multipliers, in input order
        let mut relationship_cache: HashMap<&str, Vec<&Participant>> = HashMap::new();
        for m in &multipliers {
            if let Some(leader) = m.leader() {
                relationship_cache.entry(leader).or_default().push(m);
            }
        }

        let roots = find_root_nodes(&multipliers, &multiplier_ids);
        debug!(
            "{} multipliers, {} followers, {} roots",
            multipliers.len(),
            followers.len(),
            roots.len()
        );

        let mut forest = HierarchyForest::new();
        for root in roots {
            build_tree(&mut forest, root, &relationship_cache);
        }

        // Whatever is still unplaced sits on a leader cycle or hangs off one
        let by_id: HashMap<&str, (usize, &Participant)> = multipliers
            .iter()
            .enumerate()
            .map(|(order, m)| (m.id.as_str(), (order, *m)))
            .collect();
        while let Some(unplaced) = multipliers.iter().find(|m| !forest.contains(&m.id)) {
            let entry = match cycle_entry(unplaced, &by_id) {
                entry if forest.contains(&entry.id) => *unplaced,
                entry => entry,
            };
            debug!("breaking leader cycle at {} (reached from {})", entry.id, unplaced.id);
            report.promoted_cycle_roots.push(entry.id.clone());
            build_tree(&mut forest, entry, &relationship_cache);
        }

        for f in followers {
            match f.leader().and_then(|leader| forest.find(leader)) {
                Some(leader_idx) => {
                    forest.add_follower(leader_idx, f.clone());
                }
                None => report.orphan_followers.push(f.id.clone()),
            }
        }

        log_declared_counts(&forest);
        debug!("build report: {:?}", report);

        (forest, report)
    }
}

/// Multipliers without a leader, or whose leader is not a multiplier here.
fn find_root_nodes<'p>(
    multipliers: &[&'p Participant],
    multiplier_ids: &HashSet<&str>,
) -> Vec<&'p Participant> {
    multipliers
        .iter()
        .filter(|m| match m.leader() {
            None => true,
            Some(leader) => !multiplier_ids.contains(leader),
        })
        .copied()
        .collect()
}

/// Follow leader links from `start` until an id repeats and return the cycle
/// member that comes first in input order.
fn cycle_entry<'p>(
    start: &'p Participant,
    by_id: &HashMap<&str, (usize, &'p Participant)>,
) -> &'p Participant {
    let mut path: Vec<&'p Participant> = Vec::new();
    let mut position: HashMap<&'p str, usize> = HashMap::new();
    let mut current = start;
    loop {
        if let Some(&first) = position.get(current.id.as_str()) {
            return path[first..]
                .iter()
                .copied()
                .min_by_key(|m| by_id.get(m.id.as_str()).map_or(usize::MAX, |(order, _)| *order))
                .unwrap_or(current);
        }
        position.insert(current.id.as_str(), path.len());
        path.push(current);
        match current.leader().and_then(|leader| by_id.get(leader)) {
            Some(&(_, leader)) => current = leader,
            None => return current,
        }
    }
}

/// Expand one tree from `root` with an explicit stack.
///
/// Children already placed elsewhere are skipped, which bounds the walk even
/// when leader references loop.
fn build_tree(
    forest: &mut HierarchyForest,
    root: &Participant,
    relationship_cache: &HashMap<&str, Vec<&Participant>>,
) {
    if forest.contains(&root.id) {
        return;
    }
    let root_idx = forest.insert_node(root.clone(), None);
    let mut stack: Vec<Index> = vec![root_idx];

    while let Some(current_idx) = stack.pop() {
        let Some(current_id) = forest.get_node(current_idx).map(|n| n.participant.id.clone())
        else {
            continue;
        };
        let Some(children) = relationship_cache.get(current_id.as_str()) else {
            continue;
        };
        for child in children {
            if forest.contains(&child.id) {
                debug!("skipping back edge {} -> {}", current_id, child.id);
                continue;
            }
            let child_idx = forest.insert_node((*child).clone(), Some(current_idx));
            stack.push(child_idx);
        }
    }
}

fn log_declared_counts(forest: &HierarchyForest) {
    for (_, node) in forest.iter() {
        if let Some(declared) = node.participant.participants {
            let observed = node.children.len() + node.followers.len();
            if declared as usize != observed {
                debug!(
                    "{}: declares {} recruits, {} found",
                    node.participant.id, declared, observed
                );
            }
        }
    }
}

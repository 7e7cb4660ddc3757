//! Weight-based layout of a multiplier forest into a positioned node/edge graph.
//!
//! Every multiplier subtree owns a vertical band whose height is derived from
//! its weight (`1` per multiplier, `0.5` per follower) plus configured gaps.
//! Bands of siblings are stacked top-down and never overlap; a parent is
//! centered between the first and last item it owns (child centers first,
//! then followers). Horizontal position is `depth × horizontal_unit`.

use std::collections::HashMap;

use generational_arena::Index;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::arena::{HierarchyForest, HierarchyNode};
use crate::domain::error::DomainError;

/// Id of the synthetic campaign node.
pub const CAMPAIGN_ROOT_ID: &str = "campaign-root";

/// Weight contributed by each direct follower.
pub const FOLLOWER_WEIGHT: f64 = 0.5;

/// Spacing constants for the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Horizontal distance between depth levels
    pub horizontal_unit: f64,
    /// Vertical space of one multiplier row
    pub row_height: f64,
    /// Vertical space of one follower row
    pub follower_gap: f64,
    /// Gap between consecutive sibling blocks
    pub sibling_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_unit: 250.0,
            row_height: 80.0,
            follower_gap: 40.0,
            sibling_gap: 20.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        let positive = [
            ("horizontal_unit", self.horizontal_unit),
            ("row_height", self.row_height),
            ("follower_gap", self.follower_gap),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(DomainError::InvalidLayout { field, value });
            }
        }
        if !self.sibling_gap.is_finite() || self.sibling_gap < 0.0 {
            return Err(DomainError::InvalidLayout {
                field: "sibling_gap",
                value: self.sibling_gap,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Campaign,
    Multiplier,
    Follower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    MultiplierLink,
    FollowerLink,
}

/// Positioned node handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub x: f64,
    pub y: f64,
    pub child_count: usize,
    pub follower_count: usize,
    pub weight: f64,
    /// Vertical band reserved for this node and everything below it
    pub span_top: f64,
    pub span_bottom: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub kind: EdgeKind,
}

impl GraphEdge {
    fn new(source: &str, target: &str, kind: EdgeKind) -> Self {
        Self {
            id: format!("{}->{}", source, target),
            source_id: source.to_string(),
            target_id: target.to_string(),
            kind,
        }
    }
}

/// Positioned graph: campaign root, multipliers and followers plus edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGraph {
    /// Ids of the top-level multipliers
    pub roots: Vec<String>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LayoutGraph {
    /// Graph without any node, used when no data is available.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).and_then(|&i| self.nodes.get(i))
    }

    pub fn edges_from<'a>(&'a self, source_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges.iter().filter(move |e| e.source_id == source_id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push_node(&mut self, node: GraphNode) {
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }
}

/// Per-node measurements gathered bottom-up.
#[derive(Debug, Clone, Copy, Default)]
struct Metrics {
    weight: f64,
    extent: f64,
    top: f64,
    center: f64,
    /// Center of the first follower slot
    followers_start: f64,
}

/// Computes positioned graphs from forests.
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[instrument(level = "debug", skip(self, forest), fields(multipliers = forest.len()))]
    pub fn layout(&self, forest: &HierarchyForest, campaign_label: &str) -> LayoutGraph {
        let mut metrics = self.measure(forest);
        let total_extent = self.assign_tops(forest, &mut metrics);
        self.assign_centers(forest, &mut metrics);

        let root_center = |idx: Option<&Index>| idx.and_then(|r| metrics.get(r)).map(|m| m.center);
        let campaign_y = match (
            root_center(forest.roots().first()),
            root_center(forest.roots().last()),
        ) {
            (Some(first), Some(last)) => (first + last) / 2.0,
            _ => 0.0,
        };

        let mut graph = LayoutGraph::empty();
        let total_weight: f64 = forest
            .roots()
            .iter()
            .filter_map(|r| metrics.get(r))
            .map(|m| m.weight)
            .sum();
        graph.push_node(GraphNode {
            id: CAMPAIGN_ROOT_ID.to_string(),
            label: campaign_label.to_string(),
            kind: NodeKind::Campaign,
            depth: 0,
            x: 0.0,
            y: campaign_y,
            child_count: forest.roots().len(),
            follower_count: 0,
            weight: total_weight,
            span_top: 0.0,
            span_bottom: total_extent,
        });

        for &root in forest.roots() {
            if let Some(node) = forest.get_node(root) {
                graph.roots.push(node.participant.id.clone());
                graph
                    .edges
                    .push(GraphEdge::new(CAMPAIGN_ROOT_ID, &node.participant.id, EdgeKind::MultiplierLink));
            }
        }

        for (idx, node) in forest.iter() {
            let m = metrics.get(&idx).copied().unwrap_or_default();
            self.emit_node(forest, &mut graph, node, &m);
        }

        debug!(
            "layout: {} nodes, {} edges, extent {}",
            graph.nodes.len(),
            graph.edges.len(),
            total_extent
        );
        graph
    }

    /// Weight and band extent of every node, children before parents.
    fn measure(&self, forest: &HierarchyForest) -> HashMap<Index, Metrics> {
        let c = &self.config;
        let mut metrics: HashMap<Index, Metrics> = HashMap::with_capacity(forest.len());

        for (idx, node) in forest.iter_postorder() {
            let mut weight = 1.0 + FOLLOWER_WEIGHT * node.followers.len() as f64;
            let mut extent = c.row_height + c.follower_gap * node.followers.len() as f64;
            for child in &node.children {
                if let Some(cm) = metrics.get(child) {
                    weight += cm.weight;
                    extent += cm.extent;
                }
            }
            extent += c.sibling_gap * block_count(node).saturating_sub(1) as f64;
            metrics.insert(
                idx,
                Metrics {
                    weight,
                    extent,
                    ..Metrics::default()
                },
            );
        }
        metrics
    }

    /// Assign band tops top-down. Returns the total extent of all roots.
    fn assign_tops(&self, forest: &HierarchyForest, metrics: &mut HashMap<Index, Metrics>) -> f64 {
        let c = &self.config;

        let mut total = 0.0;
        for (i, root) in forest.roots().iter().enumerate() {
            if i > 0 {
                total += c.sibling_gap;
            }
            if let Some(m) = metrics.get_mut(root) {
                m.top = total;
                total += m.extent;
            }
        }

        for (idx, node) in forest.iter() {
            let Some(top) = metrics.get(&idx).map(|m| m.top) else {
                continue;
            };
            if node.is_leaf() {
                continue;
            }
            let mut cursor = top + c.row_height / 2.0;
            for (i, child) in node.children.iter().enumerate() {
                if i > 0 {
                    cursor += c.sibling_gap;
                }
                if let Some(cm) = metrics.get_mut(child) {
                    cm.top = cursor;
                    cursor += cm.extent;
                }
            }
            if !node.children.is_empty() && !node.followers.is_empty() {
                cursor += c.sibling_gap;
            }
            if let Some(m) = metrics.get_mut(&idx) {
                m.followers_start = cursor + c.follower_gap / 2.0;
            }
        }

        total
    }

    /// Compute centers bottom-up from the assigned tops.
    fn assign_centers(&self, forest: &HierarchyForest, metrics: &mut HashMap<Index, Metrics>) {
        let c = &self.config;
        for (idx, node) in forest.iter_postorder() {
            let Some(m) = metrics.get(&idx).copied() else {
                continue;
            };
            let center = if node.is_leaf() {
                m.top + c.row_height / 2.0
            } else {
                let first = node
                    .children
                    .first()
                    .and_then(|child| metrics.get(child))
                    .map(|cm| cm.center)
                    .unwrap_or(m.followers_start);
                let last = if node.followers.is_empty() {
                    node.children
                        .last()
                        .and_then(|child| metrics.get(child))
                        .map(|cm| cm.center)
                        .unwrap_or(first)
                } else {
                    follower_center(&m, node.followers.len() - 1, c.follower_gap)
                };
                (first + last) / 2.0
            };
            if let Some(entry) = metrics.get_mut(&idx) {
                entry.center = center;
            }
        }
    }

    fn emit_node(
        &self,
        forest: &HierarchyForest,
        graph: &mut LayoutGraph,
        node: &HierarchyNode,
        m: &Metrics,
    ) {
        let c = &self.config;
        let id = node.participant.id.as_str();

        graph.push_node(GraphNode {
            id: id.to_string(),
            label: node.participant.label().to_string(),
            kind: NodeKind::Multiplier,
            depth: node.depth,
            x: node.depth as f64 * c.horizontal_unit,
            y: m.center,
            child_count: node.children.len(),
            follower_count: node.followers.len(),
            weight: m.weight,
            span_top: m.top,
            span_bottom: m.top + m.extent,
        });

        for child in node.children.iter().filter_map(|&ch| forest.get_node(ch)) {
            graph
                .edges
                .push(GraphEdge::new(id, &child.participant.id, EdgeKind::MultiplierLink));
        }

        let follower_depth = node.depth + 1;
        for (i, follower) in node.followers.iter().enumerate() {
            let y = follower_center(m, i, c.follower_gap);
            graph.push_node(GraphNode {
                id: follower.participant.id.clone(),
                label: follower.participant.label().to_string(),
                kind: NodeKind::Follower,
                depth: follower_depth,
                x: follower_depth as f64 * c.horizontal_unit,
                y,
                child_count: 0,
                follower_count: 0,
                weight: FOLLOWER_WEIGHT,
                span_top: y - c.follower_gap / 2.0,
                span_bottom: y + c.follower_gap / 2.0,
            });
            graph
                .edges
                .push(GraphEdge::new(id, &follower.participant.id, EdgeKind::FollowerLink));
        }
    }
}

/// Children count as one block each, the follower list as one more.
fn block_count(node: &HierarchyNode) -> usize {
    node.children.len() + usize::from(!node.followers.is_empty())
}

fn follower_center(m: &Metrics, i: usize, follower_gap: f64) -> f64 {
    m.followers_start + follower_gap * i as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::HierarchyBuilder;
    use crate::domain::entities::{Participant, Role};

    fn engine() -> LayoutEngine {
        LayoutEngine::new(LayoutConfig {
            horizontal_unit: 100.0,
            row_height: 80.0,
            follower_gap: 40.0,
            sibling_gap: 0.0,
        })
        .unwrap()
    }

    #[test]
    fn given_zero_sibling_gap_when_measuring_then_extent_is_weight_times_row_height() {
        // follower_gap = row_height / 2 makes pixels proportional to weight
        let input = vec![
            Participant::new("a", "A", Role::Multiplier),
            Participant::new("b", "B", Role::Multiplier).with_leader("a"),
            Participant::new("c", "C", Role::Follower).with_leader("a"),
            Participant::new("d", "D", Role::Follower).with_leader("b"),
        ];
        let (forest, _) = HierarchyBuilder::new().build(&input);
        let graph = engine().layout(&forest, "Spring");

        let a = graph.node("a").unwrap();
        assert_eq!(a.weight, 3.0);
        assert_eq!(a.span_bottom - a.span_top, 3.0 * 80.0);
        let b = graph.node("b").unwrap();
        assert_eq!(b.weight, 1.5);
        assert_eq!(b.span_bottom - b.span_top, 1.5 * 80.0);
    }

    #[test]
    fn given_single_leaf_root_when_laying_out_then_centered_in_first_row() {
        let input = vec![Participant::new("solo", "Solo", Role::Multiplier)];
        let (forest, _) = HierarchyBuilder::new().build(&input);
        let graph = engine().layout(&forest, "Spring");

        let solo = graph.node("solo").unwrap();
        assert_eq!(solo.y, 40.0);
        assert_eq!(solo.x, 100.0);
        assert_eq!(graph.node(CAMPAIGN_ROOT_ID).unwrap().y, 40.0);
    }

    #[test]
    fn given_invalid_config_when_creating_engine_then_errors() {
        let config = LayoutConfig {
            row_height: 0.0,
            ..LayoutConfig::default()
        };
        assert_eq!(
            LayoutEngine::new(config).err(),
            Some(DomainError::InvalidLayout {
                field: "row_height",
                value: 0.0
            })
        );
        let config = LayoutConfig {
            sibling_gap: f64::NAN,
            ..LayoutConfig::default()
        };
        assert!(LayoutEngine::new(config).is_err());
    }

    #[test]
    fn given_graph_when_serializing_then_uses_rendering_field_names() {
        let input = vec![
            Participant::new("a", "A", Role::Multiplier),
            Participant::new("f", "F", Role::Follower).with_leader("a"),
        ];
        let (forest, _) = HierarchyBuilder::new().build(&input);
        let graph = engine().layout(&forest, "Spring");
        let json = serde_json::to_value(&graph).unwrap();

        assert_eq!(json["edges"][1]["kind"], "follower-link");
        assert_eq!(json["edges"][0]["kind"], "multiplier-link");
        assert_eq!(json["edges"][1]["sourceId"], "a");
        assert_eq!(json["nodes"][1]["childCount"], 0);
        assert_eq!(json["nodes"][1]["followerCount"], 1);
        assert_eq!(json["nodes"][0]["kind"], "campaign");
        assert!(json.get("index").is_none());
    }
}

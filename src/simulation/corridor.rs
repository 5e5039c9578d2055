//! Corridor discovery over the intersection graph

use log::debug;

use super::road_graph::RoadGraph;
use super::store::EntityStore;
use super::types::{GreenWaveCorridor, DEFAULT_TARGET_SPEED};

/// Select the corridors to coordinate.
///
/// The lexicographically smallest intersection id is the root of a
/// breadth-first walk; the full visitation order becomes one corridor.
/// Intersections not reachable from the root get no corridor.
pub fn find_main_corridors(store: &EntityStore) -> Vec<GreenWaveCorridor> {
    let mut ids = store.intersection_ids();
    ids.sort();
    let Some(root) = ids.first() else {
        return Vec::new();
    };

    let graph = RoadGraph::from_store(store);
    let order = graph.breadth_first_order(root);
    if order.is_empty() {
        return Vec::new();
    }

    if order.len() < ids.len() {
        debug!(
            "Corridor from {} reaches {} of {} intersections",
            root,
            order.len(),
            ids.len()
        );
    }

    vec![GreenWaveCorridor::new(order, DEFAULT_TARGET_SPEED)]
}

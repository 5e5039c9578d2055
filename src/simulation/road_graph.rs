//! Directed road graph view over the entity store
//!
//! A read-only snapshot built on demand; the store stays the single owner
//! of intersections and their road connections.

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;
use petgraph::Direction;

use super::store::EntityStore;

/// Intersections as nodes, road connections as edges weighted by distance
///
/// When several roads join the same pair of intersections, the first one
/// in the store's iteration order is the one kept.
pub struct RoadGraph<'a> {
    store: &'a EntityStore,
    graph: DiGraphMap<&'a str, f64>,
}

impl<'a> RoadGraph<'a> {
    pub fn from_store(store: &'a EntityStore) -> Self {
        let mut graph = DiGraphMap::with_capacity(store.intersection_count(), 0);

        for intersection in store.all_intersections() {
            graph.add_node(intersection.id.as_str());
        }

        for intersection in store.all_intersections() {
            let from = intersection.id.as_str();
            for (_, road) in intersection.roads() {
                let to = road.to_intersection.as_str();
                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, road.distance);
                }
            }
        }

        Self { store, graph }
    }

    /// Resolve an id to the node key borrowed from the store
    fn node(&self, intersection_id: &str) -> Option<&'a str> {
        let store: &'a EntityStore = self.store;
        store
            .get_intersection(intersection_id)
            .map(|intersection| intersection.id.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, intersection_id: &str) -> bool {
        self.node(intersection_id).is_some()
    }

    /// Destinations of roads leaving `intersection_id`, in road order
    pub fn neighbors(&self, intersection_id: &str) -> Vec<&'a str> {
        match self.node(intersection_id) {
            Some(node) => self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Length of the road from `from` to `to`, if they are directly connected
    pub fn distance(&self, from: &str, to: &str) -> Option<f64> {
        let from = self.node(from)?;
        let to = self.node(to)?;
        self.graph.edge_weight(from, to).copied()
    }

    /// Breadth-first visitation order from `root`.
    ///
    /// Nodes are marked visited when first seen, so none is queued twice.
    pub fn breadth_first_order(&self, root: &str) -> Vec<String> {
        let Some(root) = self.node(root) else {
            return Vec::new();
        };

        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut bfs = Bfs::new(&self.graph, root);
        while let Some(node) = bfs.next(&self.graph) {
            order.push(node.to_string());
        }
        order
    }
}

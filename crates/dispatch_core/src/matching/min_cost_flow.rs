//! Minimum-cost flow via successive shortest augmenting paths.
//!
//! Shortest paths are found with a queue-based Bellman-Ford (SPFA), which copes
//! with the negative reverse-edge costs of the residual graph. Relaxation only
//! accepts strict improvements and adjacency lists keep insertion order, so the
//! same graph always yields the same flow.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
struct Edge {
    to: usize,
    capacity: i64,
    residual: i64,
    cost: i64,
}

/// Handle to a forward edge returned by [`MinCostFlow::add_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeId(usize);

/// Result of [`MinCostFlow::solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowSummary {
    pub flow: i64,
    pub cost: i64,
}

#[derive(Debug, Clone, Default)]
pub struct MinCostFlow {
    adjacency: Vec<Vec<usize>>,
    // Forward edge at even index, its reverse at the following odd index.
    edges: Vec<Edge>,
}

impl MinCostFlow {
    pub fn new(nodes: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); nodes],
            edges: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn add_edge(&mut self, from: usize, to: usize, capacity: i64, cost: i64) -> EdgeId {
        let id = self.edges.len();
        self.edges.push(Edge {
            to,
            capacity,
            residual: capacity,
            cost,
        });
        self.edges.push(Edge {
            to: from,
            capacity: 0,
            residual: 0,
            cost: -cost,
        });
        self.adjacency[from].push(id);
        self.adjacency[to].push(id + 1);
        EdgeId(id)
    }

    /// Units currently routed through `edge`.
    pub fn flow(&self, edge: EdgeId) -> i64 {
        let e = &self.edges[edge.0];
        e.capacity - e.residual
    }

    /// Pushes up to `max_flow` units from `source` to `sink` at minimum total cost.
    ///
    /// Each augmentation follows a cheapest residual path, so after every step the
    /// routed flow is the cheapest flow of its value.
    pub fn solve(&mut self, source: usize, sink: usize, max_flow: i64) -> FlowSummary {
        let mut summary = FlowSummary::default();
        if source == sink {
            return summary;
        }

        while summary.flow < max_flow {
            let prev_edge = self.shortest_path(source);
            if prev_edge[sink].is_none() {
                break;
            }

            let mut push = max_flow - summary.flow;
            let mut node = sink;
            while let Some(edge) = prev_edge[node] {
                push = push.min(self.edges[edge].residual);
                node = self.edges[edge ^ 1].to;
            }

            let mut node = sink;
            while let Some(edge) = prev_edge[node] {
                self.edges[edge].residual -= push;
                self.edges[edge ^ 1].residual += push;
                summary.cost += push * self.edges[edge].cost;
                node = self.edges[edge ^ 1].to;
            }
            summary.flow += push;
        }

        summary
    }

    /// Predecessor edge of every node on a cheapest residual path tree rooted at `source`.
    fn shortest_path(&self, source: usize) -> Vec<Option<usize>> {
        let nodes = self.node_count();
        let mut dist: Vec<Option<i64>> = vec![None; nodes];
        let mut prev_edge: Vec<Option<usize>> = vec![None; nodes];
        let mut queued = vec![false; nodes];
        let mut queue = VecDeque::new();

        dist[source] = Some(0);
        queue.push_back(source);
        queued[source] = true;

        while let Some(node) = queue.pop_front() {
            queued[node] = false;
            let Some(base) = dist[node] else {
                continue;
            };
            for &edge in &self.adjacency[node] {
                let e = &self.edges[edge];
                if e.residual <= 0 {
                    continue;
                }
                let candidate = base + e.cost;
                if dist[e.to].map_or(true, |current| candidate < current) {
                    dist[e.to] = Some(candidate);
                    prev_edge[e.to] = Some(edge);
                    if !queued[e.to] {
                        queued[e.to] = true;
                        queue.push_back(e.to);
                    }
                }
            }
        }

        prev_edge
    }
}

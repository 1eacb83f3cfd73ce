//! Native layered layout.
//!
//! Ranks are longest paths from the sources (Kahn order), nodes within a
//! rank are ordered with two barycenter sweeps, and ranks are packed along
//! the flow axis with a fixed gap.

use std::collections::VecDeque;

use crate::render::{
    Direction,
    layout::{FlatGraph, LayoutEngine, LayoutError, Placement, Point},
};

pub const NAME: &str = "dagre";

#[derive(Debug, Clone, Copy, Default)]
pub struct DagreEngine;

impl LayoutEngine for DagreEngine {
    fn name(&self) -> &str {
        NAME
    }

    fn arrange(&self, graph: &FlatGraph) -> Result<Placement, LayoutError> {
        let count = graph.nodes.len();
        if count == 0 {
            return Ok(Placement::default());
        }

        let ranks = compute_ranks(count, &graph.edges);
        let depth = ranks.iter().copied().max().unwrap_or(0) + 1;
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); depth];
        for (node, rank) in ranks.iter().enumerate() {
            buckets[*rank].push(node);
        }
        order_rank_nodes(&mut buckets, &graph.edges, count);

        let horizontal = matches!(graph.direction, Direction::Right | Direction::Left);
        let main = |i: usize| {
            let size = graph.nodes[i];
            if horizontal { size.width } else { size.height }
        };
        let cross = |i: usize| {
            let size = graph.nodes[i];
            if horizontal { size.height } else { size.width }
        };

        let mut centers = vec![Point::default(); count];
        let mut offset = 0.0;
        for bucket in &buckets {
            let thickness = bucket.iter().map(|&i| main(i)).fold(0.0, f64::max);
            let span: f64 = bucket.iter().map(|&i| cross(i)).sum::<f64>()
                + graph.node_gap * (bucket.len().saturating_sub(1)) as f64;

            let mut along = -span / 2.0;
            for &i in bucket {
                let m = offset + thickness / 2.0;
                let c = along + cross(i) / 2.0;
                along += cross(i) + graph.node_gap;
                centers[i] = match graph.direction {
                    Direction::Right => Point::new(m, c),
                    Direction::Left => Point::new(-m, c),
                    Direction::Down => Point::new(c, m),
                    Direction::Up => Point::new(c, -m),
                };
            }
            offset += thickness + graph.rank_gap;
        }

        Ok(Placement { centers })
    }
}

/// Longest-path rank of every node; nodes left over by a cycle keep rank 0
/// unless an earlier node pushes them further.
fn compute_ranks(count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut indeg = vec![0usize; count];
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); count];
    for &(from, to) in edges {
        if from == to {
            continue;
        }
        adj[from].push(to);
        indeg[to] += 1;
    }

    let mut queue: VecDeque<usize> = (0..count).filter(|&i| indeg[i] == 0).collect();
    let mut order = Vec::with_capacity(count);
    let mut seen = vec![false; count];
    while let Some(node) = queue.pop_front() {
        order.push(node);
        seen[node] = true;
        for &next in &adj[node] {
            indeg[next] -= 1;
            if indeg[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    order.extend((0..count).filter(|&i| !seen[i]));

    let mut ranks = vec![0usize; count];
    let mut placed = vec![false; count];
    for &node in &order {
        placed[node] = true;
        for &next in &adj[node] {
            // back edges of a cycle never pull a node forward
            if !placed[next] {
                ranks[next] = ranks[next].max(ranks[node] + 1);
            }
        }
    }
    ranks
}

fn order_rank_nodes(buckets: &mut [Vec<usize>], edges: &[(usize, usize)], count: usize) {
    if buckets.len() <= 1 {
        return;
    }

    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for &(from, to) in edges {
        outgoing[from].push(to);
        incoming[to].push(from);
    }

    let mut positions = vec![0usize; count];
    update_positions(buckets, &mut positions);

    for _ in 0..2 {
        for rank in 1..buckets.len() {
            sort_bucket(&mut buckets[rank], &incoming, &positions);
            update_positions(buckets, &mut positions);
        }
        for rank in (0..buckets.len() - 1).rev() {
            sort_bucket(&mut buckets[rank], &outgoing, &positions);
            update_positions(buckets, &mut positions);
        }
    }
}

fn update_positions(buckets: &[Vec<usize>], positions: &mut [usize]) {
    for bucket in buckets {
        for (idx, &node) in bucket.iter().enumerate() {
            positions[node] = idx;
        }
    }
}

fn sort_bucket(bucket: &mut [usize], neighbors: &[Vec<usize>], positions: &[usize]) {
    if bucket.len() <= 1 {
        return;
    }
    let mut scored: Vec<(f64, usize, usize)> = bucket
        .iter()
        .enumerate()
        .map(|(current, &node)| (barycenter(node, neighbors, positions, current), current, node))
        .collect();
    // stable on ties: fall back to the current position
    scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    for (slot, (_, _, node)) in bucket.iter_mut().zip(scored) {
        *slot = node;
    }
}

fn barycenter(node: usize, neighbors: &[Vec<usize>], positions: &[usize], current: usize) -> f64 {
    let list = &neighbors[node];
    if list.is_empty() {
        return current as f64;
    }
    list.iter().map(|&n| positions[n] as f64).sum::<f64>() / list.len() as f64
}

use std::collections::HashMap;

use super::types::{BoxSize, OverlapReport};
use crate::ir::{GraphNode, Position};

/// Pairs closer than `(box + padding) / OVERLAP_SPREAD` on both axes collide.
/// Boxes only truly intersect well inside a full box-width spacing.
const OVERLAP_SPREAD: f32 = 1.8;
const PUSH_SCALE: f32 = 1.5;
const SEVERE_RATIO: f32 = 0.7;
const SEVERE_SCALE: f32 = 0.5;
const HISTORY_STEP: f32 = 0.1;
const HISTORY_CAP: f32 = 2.0;
const LEVEL_DAMPING: f32 = 0.1;
const MAX_LEVEL_DAMPING: f32 = 0.7;
const EARLY_EXIT_RESIDUAL: usize = 2;
const EARLY_EXIT_AFTER: usize = 50;
/// Relative slack so asymptotic pushes count as resolved.
const TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, Copy)]
struct Separation {
    min_x: f32,
    min_y: f32,
    slack_x: f32,
    slack_y: f32,
}

impl Separation {
    fn new(node_box: BoxSize, min_padding: f32) -> Self {
        let min_x = ((node_box.width + min_padding) / OVERLAP_SPREAD).max(0.0);
        let min_y = ((node_box.height + min_padding) / OVERLAP_SPREAD).max(0.0);
        Self {
            min_x,
            min_y,
            slack_x: min_x * TOLERANCE,
            slack_y: min_y * TOLERANCE,
        }
    }

    fn collides(&self, a: Position, b: Position) -> bool {
        (a.x - b.x).abs() < self.min_x - self.slack_x
            && (a.y - b.y).abs() < self.min_y - self.slack_y
    }
}

/// Position arena indexed like the input slice.
struct Arena {
    positions: Vec<Position>,
    mobility: Vec<f32>,
}

impl Arena {
    fn from_nodes(nodes: &[GraphNode]) -> Self {
        Self {
            positions: nodes.iter().map(|node| node.position).collect(),
            mobility: nodes.iter().map(|node| mobility(node.level)).collect(),
        }
    }

    fn shift(&mut self, idx: usize, dx: f32, dy: f32) {
        let weight = self.mobility[idx];
        let pos = &mut self.positions[idx];
        pos.x += dx * weight;
        pos.y += dy * weight;
    }
}

/// Deeper levels carry less weight per push; roots move the full amount.
fn mobility(level: usize) -> f32 {
    1.0 - (level as f32 * LEVEL_DAMPING).min(MAX_LEVEL_DAMPING)
}

/// Number of node pairs that collide on both axes.
pub fn count_overlaps(nodes: &[GraphNode], node_box: BoxSize, min_padding: f32) -> usize {
    let separation = Separation::new(node_box, min_padding);
    let positions: Vec<Position> = nodes.iter().map(|node| node.position).collect();
    count_in(&positions, separation)
}

fn count_in(positions: &[Position], separation: Separation) -> usize {
    let mut count = 0;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            if separation.collides(positions[i], positions[j]) {
                count += 1;
            }
        }
    }
    count
}

/// Iterative pairwise repulsion. Colliding pairs are pushed apart along the
/// axis needing the smaller correction, harder each time the same pair keeps
/// colliding, with an extra two-axis nudge for deep overlaps.
///
/// Best effort: the pass stops at `max_iterations`, or once at most two pairs
/// remain after fifty iterations, and reports what is left.
pub fn resolve_overlaps(
    nodes: &[GraphNode],
    node_box: BoxSize,
    min_padding: f32,
    max_iterations: usize,
) -> (Vec<GraphNode>, OverlapReport) {
    if nodes.len() < 2 {
        return (
            nodes.to_vec(),
            OverlapReport {
                iterations: 0,
                residual_overlaps: 0,
                converged: true,
            },
        );
    }

    let separation = Separation::new(node_box, min_padding);
    let mut arena = Arena::from_nodes(nodes);
    let mut history: HashMap<(usize, usize), u32> = HashMap::new();
    let mut iterations = 0;

    for iteration in 0..max_iterations {
        iterations = iteration + 1;
        let colliding = relax_pairs(&mut arena, &mut history, separation);
        if colliding == 0 {
            break;
        }
        if colliding <= EARLY_EXIT_RESIDUAL && iteration > EARLY_EXIT_AFTER {
            break;
        }
    }

    let residual_overlaps = count_in(&arena.positions, separation);
    let report = OverlapReport {
        iterations,
        residual_overlaps,
        converged: residual_overlaps == 0,
    };
    if report.converged {
        tracing::debug!(iterations, nodes = nodes.len(), "overlap resolution converged");
    } else {
        tracing::warn!(
            iterations,
            residual_overlaps,
            nodes = nodes.len(),
            "overlap resolution stopped with residual overlaps"
        );
    }

    let resolved = nodes
        .iter()
        .zip(arena.positions)
        .map(|(node, position)| GraphNode {
            position,
            ..node.clone()
        })
        .collect();
    (resolved, report)
}

/// One sweep over all pairs; returns how many pairs collided during the sweep.
fn relax_pairs(
    arena: &mut Arena,
    history: &mut HashMap<(usize, usize), u32>,
    separation: Separation,
) -> usize {
    let mut colliding = 0;
    let count = arena.positions.len();
    for i in 0..count {
        for j in (i + 1)..count {
            let a = arena.positions[i];
            let b = arena.positions[j];
            if !separation.collides(a, b) {
                continue;
            }
            colliding += 1;

            let seen = history.entry((i, j)).or_insert(0);
            let persistence = (1.0 + *seen as f32 * HISTORY_STEP).min(HISTORY_CAP);
            *seen += 1;

            let overlap_x = separation.min_x - (a.x - b.x).abs();
            let overlap_y = separation.min_y - (a.y - b.y).abs();
            // Coincident pairs split with the lower index moving left/up.
            let dir_x = if b.x >= a.x { 1.0 } else { -1.0 };
            let dir_y = if b.y >= a.y { 1.0 } else { -1.0 };

            if overlap_x <= overlap_y {
                let push = overlap_x * PUSH_SCALE * persistence / 2.0;
                arena.shift(i, -dir_x * push, 0.0);
                arena.shift(j, dir_x * push, 0.0);
            } else {
                let push = overlap_y * PUSH_SCALE * persistence / 2.0;
                arena.shift(i, 0.0, -dir_y * push);
                arena.shift(j, 0.0, dir_y * push);
            }

            if overlap_x > separation.min_x * SEVERE_RATIO
                && overlap_y > separation.min_y * SEVERE_RATIO
            {
                let push_x = overlap_x * SEVERE_SCALE / 2.0;
                let push_y = overlap_y * SEVERE_SCALE / 2.0;
                arena.shift(i, -dir_x * push_x, -dir_y * push_y);
                arena.shift(j, dir_x * push_x, dir_y * push_y);
            }
        }
    }
    colliding
}

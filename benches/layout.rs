use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use kgraph_layout::config::LayoutConfig;
use kgraph_layout::ir::{GraphDocument, GraphEdge, GraphNode};
use kgraph_layout::layout::{
    BoxSize, HierarchyIndex, LayoutMode, compute_layout, label_levels, resolve_overlaps,
};
use std::hint::black_box;

/// Balanced tree with `fanout` children per node, `depth` levels deep.
fn tree_document(fanout: usize, depth: usize) -> GraphDocument {
    let mut nodes = vec![GraphNode::new("n0")];
    let mut edges = Vec::new();
    let mut frontier = vec![0usize];
    for _ in 0..depth {
        let mut next = Vec::new();
        for parent in frontier {
            for _ in 0..fanout {
                let child = nodes.len();
                nodes.push(GraphNode::new(format!("n{child}")));
                edges.push(GraphEdge::parent_child(format!("n{parent}"), format!("n{child}")));
                next.push(child);
            }
        }
        frontier = next;
    }
    GraphDocument::new(nodes, edges)
}

/// Layered DAG where every node links to two nodes of the next layer, plus
/// a few association edges that must not affect levels.
fn dag_document(layers: usize, width: usize) -> GraphDocument {
    let id = |layer: usize, slot: usize| format!("L{layer}N{slot}");
    let mut nodes = Vec::with_capacity(layers * width);
    let mut edges = Vec::new();
    for layer in 0..layers {
        for slot in 0..width {
            nodes.push(GraphNode::new(id(layer, slot)));
            if layer + 1 < layers {
                edges.push(GraphEdge::new(id(layer, slot), id(layer + 1, slot)));
                edges.push(GraphEdge::new(id(layer, slot), id(layer + 1, (slot + 1) % width)));
            }
            if slot % 3 == 0 {
                edges.push(
                    GraphEdge::new(id(layer, slot), id(layers - 1 - layer, width - 1 - slot))
                        .with_type("related"),
                );
            }
        }
    }
    GraphDocument::new(nodes, edges)
}

/// `count` nodes dropped into a small square so nearly every pair collides.
fn dense_cluster(count: usize) -> Vec<GraphNode> {
    (0..count)
        .map(|idx| {
            let x = ((idx * 37) % 97) as f32;
            let y = ((idx * 53) % 89) as f32;
            GraphNode::new(format!("c{idx}")).with_level(idx % 5).at(x, y)
        })
        .collect()
}

fn documents() -> Vec<(&'static str, GraphDocument)> {
    vec![
        ("tree_3x3", tree_document(3, 3)),
        ("tree_2x6", tree_document(2, 6)),
        ("dag_6x8", dag_document(6, 8)),
        ("dag_12x12", dag_document(12, 12)),
    ]
}

fn bench_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("levels");
    for (name, document) in documents() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &document, |b, doc| {
            b.iter(|| {
                let index = HierarchyIndex::build(black_box(&doc.nodes), &doc.edges);
                let levels = label_levels(&doc.nodes, &index);
                black_box(levels.len());
            });
        });
    }
    group.finish();
}

fn bench_overlap(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlap");
    let config = LayoutConfig::default();
    let node_box = BoxSize::new(config.node_width, config.node_height);
    for count in [10usize, 40, 120] {
        let nodes = dense_cluster(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &nodes, |b, nodes| {
            b.iter(|| {
                let (resolved, report) = resolve_overlaps(
                    black_box(nodes),
                    node_box,
                    config.overlap.min_padding,
                    config.overlap.max_iterations,
                );
                black_box((resolved.len(), report.residual_overlaps));
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    let mut preserve = LayoutConfig::default();
    preserve.hierarchy.normalize_with_rank = false;
    for (name, document) in documents() {
        group.bench_with_input(BenchmarkId::new("rank", name), &document, |b, doc| {
            b.iter(|| {
                let layout = compute_layout(black_box(doc), LayoutMode::Rank, &config);
                black_box(layout.nodes.len());
            });
        });
        group.bench_with_input(BenchmarkId::new("hierarchical", name), &document, |b, doc| {
            b.iter(|| {
                let layout = compute_layout(black_box(doc), LayoutMode::Hierarchical, &config);
                black_box(layout.nodes.len());
            });
        });
        group.bench_with_input(BenchmarkId::new("preserve", name), &document, |b, doc| {
            b.iter(|| {
                let layout = compute_layout(black_box(doc), LayoutMode::Hierarchical, &preserve);
                black_box(layout.nodes.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_levels, bench_overlap, bench_layout
);
criterion_main!(benches);

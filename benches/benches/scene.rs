// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Point;
use understory_scene::{Camera, Canvas, CanvasId, NodeId, NodeProps, Reference, Scene, Shape};

/// A balanced tree of rectangles and ellipses, `fanout` children per node.
///
/// Returns the root and one deepest leaf.
fn build_tree(depth: u32, fanout: u32) -> (Scene, CanvasId, NodeId, NodeId) {
    let mut scene = Scene::new();
    let camera = scene.insert_camera(Camera::new());
    let canvas = scene.insert_canvas(Canvas::new(1_200.0, 600.0).with_camera(camera));
    let props = |i: u32| NodeProps {
        x: Some(f64::from(i) * 3.0),
        y: Some(2.0),
        rotation: Some(f64::from(i) * 7.5),
        ..NodeProps::default()
    };
    let root = scene.create(Shape::rectangle(10.0, 10.0), props(0));
    let mut level = vec![root];
    let mut leaf = root;
    for _ in 0..depth {
        let mut next = Vec::with_capacity(level.len() * fanout as usize);
        for &parent in &level {
            for i in 0..fanout {
                let shape = if i % 2 == 0 {
                    Shape::rectangle(8.0, 4.0)
                } else {
                    Shape::ellipse(4.0, 2.0)
                };
                let child = scene.create(shape, props(i));
                scene.add_child(parent, child).unwrap();
                next.push(child);
                leaf = child;
            }
        }
        level = next;
    }
    (scene, canvas, root, leaf)
}

fn bench_scene(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_scene");
    group.sample_size(50);

    for &(depth, fanout) in &[(4_u32, 4_u32), (6_u32, 3_u32)] {
        group.bench_function(format!("cached_global(d={depth},f={fanout})"), |b| {
            let (mut scene, canvas, _, leaf) = build_tree(depth, fanout);
            scene.global_transformation_matrix(leaf, canvas).unwrap();
            b.iter(|| {
                black_box(*scene.global_transformation_matrix(leaf, canvas).unwrap());
            });
        });

        group.bench_function(format!("move_root_then_read_leaf(d={depth},f={fanout})"), |b| {
            let (mut scene, canvas, root, leaf) = build_tree(depth, fanout);
            scene.global_vertices_for_tree(root, canvas).unwrap();
            let mut x = 0.0;
            b.iter(|| {
                x += 1.0;
                scene.node_mut(root).unwrap().set_x(x);
                black_box(scene.global_point(leaf, Point::ZERO, canvas).unwrap());
            });
        });

        group.bench_function(format!("tree_vertices_cold(d={depth},f={fanout})"), |b| {
            b.iter_batched(
                || build_tree(depth, fanout),
                |(mut scene, canvas, root, _)| {
                    black_box(scene.global_vertices_for_tree(root, canvas).unwrap().len());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("tree_vertices_after_leaf_move(d={depth},f={fanout})"), |b| {
            let (mut scene, canvas, root, leaf) = build_tree(depth, fanout);
            scene.global_vertices_for_tree(root, canvas).unwrap();
            let mut y = 0.0;
            b.iter(|| {
                y += 1.0;
                scene.node_mut(leaf).unwrap().set_y(y);
                black_box(scene.tree_bounds(root, canvas).unwrap());
            });
        });

        group.bench_function(format!("reference_vertices(d={depth},f={fanout})"), |b| {
            let (mut scene, _, root, leaf) = build_tree(depth, fanout);
            let mut rotation = 0.0;
            b.iter(|| {
                rotation += 1.0;
                scene.node_mut(root).unwrap().set_rotation(rotation);
                black_box(
                    scene
                        .vertices_relative_to(leaf, Reference::Node(root))
                        .unwrap()
                        .len(),
                );
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scene);
criterion_main!(benches);

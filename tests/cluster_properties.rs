//! Frame-level behaviour of the cluster assignment pass.
//!
//! Lights are placed in view space and fed through an identity view matrix;
//! the assigner mirrors world z, so a view-space depth `d` is world z `-d`.

use cluster_lighting::cluster::{AxisRange, SnapshotSink};
use cluster_lighting::{Camera, ClusterAssigner, ClusterConfig, Perspective, PointLight};
use glam::{Mat4, Vec3};
use rstest::rstest;

fn light_at_view(position: Vec3, radius: f32) -> PointLight {
    PointLight::new(Vec3::new(position.x, position.y, -position.z), radius)
}

fn create_assigner(x: u32, y: u32, z: u32) -> ClusterAssigner {
    let config = ClusterConfig::default().with_slices(x, y, z);
    ClusterAssigner::new(config).unwrap()
}

/// Deterministic spread of lights through the frustum, some outside it.
fn scattered_lights(count: usize, radius: f32) -> Vec<PointLight> {
    (0..count)
        .map(|i| {
            let f = i as f32;
            let depth = 0.5 + (f * 7.31) % 40.0;
            let x = ((f * 0.618).fract() - 0.5) * depth * 2.5;
            let y = ((f * 0.414).fract() - 0.5) * depth * 1.5;
            light_at_view(Vec3::new(x, y, depth), radius)
        })
        .collect()
}

fn lit_clusters(assigner: &ClusterAssigner, light: u32) -> Vec<usize> {
    let storage = assigner.storage();
    (0..storage.num_clusters())
        .filter(|&c| storage.light_indices(c).contains(&light))
        .collect()
}

// ============================================================================
// Reset and capacity
// ============================================================================

#[test]
fn test_counts_reset_between_frames() {
    let mut assigner = create_assigner(8, 8, 8);
    let projection = Perspective::new(60.0, 1.5, 0.5, 50.0);

    let stats = assigner.update_clusters(&projection, &Mat4::IDENTITY, &scattered_lights(64, 3.0));
    assert!(stats.assignments > 0);

    assigner.update_clusters(&projection, &Mat4::IDENTITY, &[]);
    let storage = assigner.storage();
    for cluster in 0..storage.num_clusters() {
        assert_eq!(storage.light_count(cluster), 0);
    }
}

#[rstest]
#[case::tiny(1)]
#[case::small(4)]
#[case::default(100)]
fn test_capacity_never_exceeded(#[case] capacity: usize) {
    let config = ClusterConfig::default()
        .with_slices(6, 4, 8)
        .with_max_lights_per_cluster(capacity);
    let mut assigner = ClusterAssigner::new(config).unwrap();
    let projection = Perspective::new(75.0, 16.0 / 9.0, 0.1, 40.0);

    let lights = scattered_lights(400, 6.0);
    let stats = assigner.update_clusters(&projection, &Mat4::IDENTITY, &lights);

    let storage = assigner.storage();
    let stored: usize = (0..storage.num_clusters())
        .map(|c| storage.light_count(c))
        .inspect(|&count| assert!(count <= capacity))
        .sum();
    assert_eq!(stored, stats.assignments);
}

#[test]
fn test_full_column_does_not_stop_other_columns() {
    // Two columns of two depth slices, one light per cluster.
    let config = ClusterConfig::default()
        .with_slices(2, 1, 2)
        .with_max_lights_per_cluster(1);
    let mut assigner = ClusterAssigner::new(config).unwrap();
    let projection = Perspective::new(90.0, 1.0, 1.0, 5.0);

    // Light 0 fills both depth cells of column x=0, light 1 spans both columns.
    let lights = [
        light_at_view(Vec3::new(-1.6, 0.0, 3.0), 1.5),
        light_at_view(Vec3::new(-1.0, 0.0, 3.0), 1.5),
    ];

    let grid = *assigner.grid();
    let first = assigner
        .light_bounds(&projection, &Mat4::IDENTITY, &lights[0])
        .unwrap();
    assert_eq!((first.x, first.z), (AxisRange::new(0, 0), AxisRange::new(0, 1)));
    let spanning = assigner
        .light_bounds(&projection, &Mat4::IDENTITY, &lights[1])
        .unwrap();
    assert_eq!(spanning.x, AxisRange::new(0, 1));
    assert_eq!(spanning.z, AxisRange::new(0, 1));

    let stats = assigner.update_clusters(&projection, &Mat4::IDENTITY, &lights);
    let storage = assigner.storage();
    assert_eq!(storage.light_indices(grid.index(0, 0, 0)), vec![0]);
    assert_eq!(storage.light_indices(grid.index(0, 0, 1)), vec![0]);
    assert_eq!(storage.light_indices(grid.index(1, 0, 0)), vec![1]);
    assert_eq!(storage.light_indices(grid.index(1, 0, 1)), vec![1]);
    assert_eq!(stats.assignments, 4);
    assert_eq!(stats.dropped, 2);
}

#[test]
fn test_full_cluster_keeps_first_lights() {
    let config = ClusterConfig::default()
        .with_slices(2, 2, 2)
        .with_max_lights_per_cluster(3);
    let mut assigner = ClusterAssigner::new(config).unwrap();
    let projection = Perspective::new(90.0, 1.0, 1.0, 11.0);

    let lights = vec![light_at_view(Vec3::new(-1.0, -1.0, 3.0), 0.2); 10];
    let stats = assigner.update_clusters(&projection, &Mat4::IDENTITY, &lights);

    let cluster = assigner.grid().index(0, 0, 0);
    assert_eq!(assigner.storage().light_indices(cluster), vec![0, 1, 2]);
    assert_eq!(stats.assignments, 3);
    assert_eq!(stats.dropped, 7);
}

// ============================================================================
// Placement
// ============================================================================

/// The 0.3 radius stays inside the cluster measured perpendicular to its
/// slicing planes (at least 0.35 at depth 2), not against the 0.5 slice
/// width at unit depth. A radius of 0.45 at cluster (0, 0, 0) already
/// crosses a boundary plane and is written to neighbouring clusters.
#[rstest]
#[case::first(0, 0, 0)]
#[case::middle(1, 2, 3)]
#[case::last(3, 3, 3)]
fn test_light_contained_in_one_cluster(#[case] cx: u32, #[case] cy: u32, #[case] cz: u32) {
    // 90 degrees, aspect 1: slices of 0.5 at unit depth, depth slices of 2.
    let mut assigner = create_assigner(4, 4, 4);
    let projection = Perspective::new(90.0, 1.0, 1.0, 9.0);

    let depth = projection.near + 2.0 * cz as f32 + 1.0;
    let slope_x = -1.0 + 0.5 * cx as f32 + 0.25;
    let slope_y = -1.0 + 0.5 * cy as f32 + 0.25;
    let light = light_at_view(Vec3::new(slope_x * depth, slope_y * depth, depth), 0.3);

    let stats = assigner.update_clusters(&projection, &Mat4::IDENTITY, &[light]);
    assert_eq!(stats.assignments, 1);
    assert_eq!(lit_clusters(&assigner, 0), vec![assigner.grid().index(cx, cy, cz)]);
}

#[test]
fn test_boundary_scenario() {
    let mut assigner = create_assigner(2, 2, 2);
    let projection = Perspective::new(90.0, 1.0, 1.0, 11.0);
    let depth_z = projection.depth() / 2.0;
    let light = light_at_view(
        Vec3::new(0.0, 0.0, projection.near + depth_z / 2.0),
        0.01 * depth_z,
    );

    assigner.update_clusters(&projection, &Mat4::IDENTITY, &[light]);

    let storage = assigner.storage();
    let lit: Vec<usize> = (0..8).filter(|&c| storage.light_count(c) == 1).collect();
    assert_eq!(lit.len(), 1);
    let (_, _, z) = assigner.grid().coords(lit[0]);
    assert_eq!(z, 0);
    assert_eq!(storage.light_indices(lit[0]), vec![0]);
}

#[rstest]
#[case::before_near(-0.5, 1.0)]
#[case::behind_eye(-20.0, 5.0)]
#[case::past_far(32.0, 1.5)]
fn test_light_outside_depth_range(#[case] depth: f32, #[case] radius: f32) {
    let mut assigner = create_assigner(4, 4, 4);
    let projection = Perspective::new(60.0, 1.0, 1.0, 30.0);
    let light = light_at_view(Vec3::new(0.0, 0.0, depth), radius);

    let stats = assigner.update_clusters(&projection, &Mat4::IDENTITY, &[light]);
    assert_eq!(stats.culled, 1);
    assert!(lit_clusters(&assigner, 0).is_empty());
}

#[test]
fn test_light_beside_frustum_culled() {
    let mut assigner = create_assigner(4, 4, 4);
    let projection = Perspective::new(60.0, 1.0, 1.0, 30.0);
    let light = light_at_view(Vec3::new(50.0, 0.0, 10.0), 1.0);

    let stats = assigner.update_clusters(&projection, &Mat4::IDENTITY, &[light]);
    assert_eq!(stats.culled, 1);
}

#[rstest]
#[case(-3.0)]
#[case(-0.7)]
#[case(0.4)]
#[case(2.5)]
fn test_x_shift_leaves_y_and_z(#[case] x: f32) {
    let assigner = create_assigner(8, 6, 10);
    let projection = Perspective::new(70.0, 1.6, 0.5, 40.0);
    let baseline = light_at_view(Vec3::new(0.0, 1.1, 12.0), 1.5);
    let shifted = light_at_view(Vec3::new(x, 1.1, 12.0), 1.5);

    let a = assigner
        .light_bounds(&projection, &Mat4::IDENTITY, &baseline)
        .unwrap();
    let b = assigner
        .light_bounds(&projection, &Mat4::IDENTITY, &shifted)
        .unwrap();
    assert_eq!(a.y, b.y);
    assert_eq!(a.z, b.z);
}

#[test]
fn test_x_shift_moves_x_range() {
    let assigner = create_assigner(8, 6, 10);
    let projection = Perspective::new(70.0, 1.6, 0.5, 40.0);
    let left = light_at_view(Vec3::new(-6.0, 0.0, 12.0), 1.0);
    let right = light_at_view(Vec3::new(6.0, 0.0, 12.0), 1.0);

    let left = assigner
        .light_bounds(&projection, &Mat4::IDENTITY, &left)
        .unwrap();
    let right = assigner
        .light_bounds(&projection, &Mat4::IDENTITY, &right)
        .unwrap();
    assert!(left.x.max < right.x.min);
    assert_eq!(left.z, right.z);
}

#[test]
fn test_bounds_stay_on_grid() {
    let assigner = create_assigner(5, 7, 9);
    let projection = Perspective::new(80.0, 1.3, 0.2, 45.0);

    for light in scattered_lights(300, 4.0) {
        if let Some(bounds) = assigner.light_bounds(&projection, &Mat4::IDENTITY, &light) {
            for (range, slices) in [(bounds.x, 5), (bounds.y, 7), (bounds.z, 9)] {
                assert!(!range.is_empty());
                assert!(range.min >= 0 && range.max < slices, "{range:?}");
            }
        }
    }
}

// ============================================================================
// Determinism and publishing
// ============================================================================

#[test]
fn test_identical_inputs_identical_buffers() {
    let projection = Perspective::new(65.0, 16.0 / 9.0, 0.1, 60.0);
    let camera = Camera::new(Vec3::new(0.5, 0.2, 0.0), Vec3::new(0.5, 0.2, -1.0));
    let view = camera.view_matrix();
    let lights = scattered_lights(256, 2.5);

    let mut first = create_assigner(12, 8, 16);
    let mut second = create_assigner(12, 8, 16);
    let a = first.update_clusters(&projection, &view, &lights);
    let b = second.update_clusters(&projection, &view, &lights);

    assert_eq!(a, b);
    assert_eq!(first.storage().as_bytes(), second.storage().as_bytes());

    // Running again on the same storage gives the same lists.
    let before = first.storage().as_slice().to_vec();
    first.update_clusters(&projection, &view, &lights);
    assert_eq!(first.storage().as_slice(), before.as_slice());
}

#[test]
fn test_publish_once_per_frame() {
    let sink = SnapshotSink::new();
    let config = ClusterConfig::default().with_slices(4, 4, 4);
    let mut assigner = ClusterAssigner::with_sink(config, Box::new(sink.clone())).unwrap();
    let projection = Perspective::new(60.0, 1.0, 1.0, 30.0);
    let lights = scattered_lights(32, 2.0);

    for frame in 1..=3u64 {
        assigner.update_clusters(&projection, &Mat4::IDENTITY, &lights);
        let published = sink.latest().unwrap();
        assert_eq!(published.generation, frame);
        assert_eq!(published.data.as_slice(), assigner.storage().as_slice());
    }

    let (width, height) = assigner.storage().texel_dimensions();
    let published = sink.latest().unwrap();
    assert_eq!((published.width, published.height), (width, height));
    assert_eq!(height as usize, 64);
}

#[test]
fn test_full_range_axis() {
    assert_eq!(AxisRange::full(15), AxisRange::new(0, 14));
}

//! Cluster a ring of animated lights and print per-frame statistics.
//!
//! ```bash
//! RUST_LOG=debug cargo run --example cluster_stats -- --lights 500 --frames 5
//! ```

use clap::Parser;
use cluster_lighting::scene::DEFAULT_LIGHT_RADIUS;
use cluster_lighting::{
    Camera, ClusterAssigner, ClusterConfig, Perspective, PointLight, SnapshotSink,
    MAX_LIGHTS_PER_CLUSTER,
};
use glam::Vec3;

/// Cluster statistics demo arguments.
#[derive(Parser, Debug)]
#[command(
    name = "cluster_stats",
    about = "Assign a ring of point lights to frustum clusters and report occupancy",
    version
)]
struct Args {
    /// Slices across the screen width.
    #[arg(long, default_value = "15")]
    x_slices: u32,

    /// Slices across the screen height.
    #[arg(long, default_value = "15")]
    y_slices: u32,

    /// Slices between the near and far planes.
    #[arg(long, default_value = "15")]
    z_slices: u32,

    /// Light indices kept per cluster.
    #[arg(long, default_value_t = MAX_LIGHTS_PER_CLUSTER)]
    capacity: usize,

    /// Number of point lights.
    #[arg(long, default_value = "200")]
    lights: usize,

    /// Radius of every light.
    #[arg(long, default_value_t = DEFAULT_LIGHT_RADIUS)]
    radius: f32,

    /// Frames to simulate.
    #[arg(long, default_value = "3")]
    frames: u32,

    /// Busiest clusters listed after the last frame.
    #[arg(long, default_value = "5")]
    top: usize,
}

/// Lights spiralling away from the camera, turning a little every frame.
fn light_ring(count: usize, radius: f32, frame: u32) -> Vec<PointLight> {
    let turn = frame as f32 * 0.1;
    (0..count)
        .map(|i| {
            let f = i as f32;
            let angle = f * 2.399 + turn;
            let distance = 2.0 + (f * 0.37) % 12.0;
            let depth = 1.0 + (f * 1.73) % 60.0;
            let position = Vec3::new(
                angle.cos() * distance,
                angle.sin() * distance * 0.6,
                -depth,
            );
            PointLight::new(position, radius)
        })
        .collect()
}

fn main() {
    env_logger::init();

    let args = Args::parse();

    let config = ClusterConfig::default()
        .with_slices(args.x_slices, args.y_slices, args.z_slices)
        .with_max_lights_per_cluster(args.capacity);

    let sink = SnapshotSink::new();
    let mut assigner = match ClusterAssigner::with_sink(config, Box::new(sink.clone())) {
        Ok(assigner) => assigner,
        Err(err) => {
            eprintln!("Invalid cluster configuration: {err}");
            std::process::exit(2);
        }
    };

    // Eye at the origin looking down -Z, so lights at negative z are in view.
    let camera = Camera::new(Vec3::ZERO, Vec3::NEG_Z)
        .with_projection(Perspective::new(45.0, 16.0 / 9.0, 0.1, 80.0));
    let view = camera.view_matrix();

    println!(
        "Grid {}x{}x{} ({} clusters), {} lights of radius {}",
        args.x_slices,
        args.y_slices,
        args.z_slices,
        config.num_clusters(),
        args.lights,
        args.radius
    );

    for frame in 0..args.frames {
        let lights = light_ring(args.lights, args.radius, frame);
        let stats = assigner.update_clusters(&camera.projection, &view, &lights);
        println!(
            "frame {frame}: visible {:>5}  culled {:>5}  assignments {:>7}  dropped {:>6}",
            stats.visible(),
            stats.culled,
            stats.assignments,
            stats.dropped
        );
    }

    let Some(published) = sink.latest() else {
        return;
    };
    println!(
        "Published buffer #{}: {}x{} texels, {} bytes",
        published.generation,
        published.width,
        published.height,
        published.data.len() * std::mem::size_of::<f32>()
    );

    let storage = assigner.storage();
    let mut busiest: Vec<(usize, usize)> = (0..storage.num_clusters())
        .map(|cluster| (cluster, storage.light_count(cluster)))
        .filter(|&(_, count)| count > 0)
        .collect();
    busiest.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    for &(cluster, count) in busiest.iter().take(args.top) {
        let (x, y, z) = assigner.grid().coords(cluster);
        let preview: Vec<u32> = storage.light_indices(cluster).into_iter().take(8).collect();
        println!("  cluster ({x:>2}, {y:>2}, {z:>2}): {count:>3} lights {preview:?}");
    }
}

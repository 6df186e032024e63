//! Summary statistics for each particle-field silhouette.
//!
//! Usage: `shape_stats [COUNT] [SEED]` (defaults: 8000 points, random seed).

use particle_shapes::{generate_with, Shape, DEFAULT_PARTICLE_COUNT};
use rand::{rngs::StdRng, SeedableRng};

fn main() {
    let mut args = std::env::args().skip(1);
    let count: usize = args.next()
        .and_then(|a| a.trim().parse().ok())
        .unwrap_or(DEFAULT_PARTICLE_COUNT)
        .max(1);
    let mut rng = match args.next().and_then(|a| a.trim().parse::<u64>().ok()) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    };

    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            Particle Field Shape Statistics           ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    println!("  {} points per shape", count);
    println!();

    for shape in Shape::ALL.iter().copied().chain([Shape::Scatter]) {
        let cloud = generate_with(count, shape, &mut rng);
        let (min, max) = cloud.iter().fold(
            (glam::Vec3::splat(f32::INFINITY), glam::Vec3::splat(f32::NEG_INFINITY)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        );
        let radii: Vec<f32> = cloud.iter().map(|p| p.length()).collect();
        let mean = radii.iter().sum::<f32>() / radii.len() as f32;
        let far  = radii.iter().copied().fold(0.0_f32, f32::max);

        println!("  ┌─ {} ({})", shape.label(), shape.name());
        println!("  │  x      : {:>7.3} … {:>7.3}", min.x, max.x);
        println!("  │  y      : {:>7.3} … {:>7.3}", min.y, max.y);
        println!("  │  z      : {:>7.3} … {:>7.3}", min.z, max.z);
        println!("  │  |p|    : mean {:.3}  max {:.3}", mean, far);
        println!("  └─");
        println!();
    }
}

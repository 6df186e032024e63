//! gesture_particles: interactive entry point.
//!
//! `gesture_particles [--quick] [--config PATH]`
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::io::{self, Write};
use std::path::PathBuf;

use gesture_particles::{run, AppConfig};
use gesture_particles::render::{parse_hex_color, DEFAULT_COLOR};
use particle_shapes::{Shape, DEFAULT_PARTICLE_COUNT};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Gesture Particles · Hand-Driven Point Cloud         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Keyboard simulation  (use --features leap for hardware)");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from);

    let cfg = if let Some(path) = config_path {
        match AppConfig::load(&path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    } else if args.iter().any(|a| a == "--quick") {
        println!("  Quick-start: heart, {} particles, camera on\n", DEFAULT_PARTICLE_COUNT);
        AppConfig::default()
    } else {
        configure_interactively()
    };

    println!();
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn configure_interactively() -> AppConfig {
    let shape          = pick_shape();
    let particle_count = pick_count();
    let color          = pick_color();
    let camera_enabled = !read_line("  Start with camera on? (Y/n): ")
        .trim().eq_ignore_ascii_case("n");

    AppConfig {
        shape,
        particle_count,
        color,
        camera_enabled,
        ..AppConfig::default()
    }
}

fn pick_shape() -> Shape {
    println!("  Shape:");
    for (i, shape) in Shape::ALL.iter().enumerate() {
        println!("    {}. {}", i + 1, shape.label());
    }
    let choice = read_line("  Choice (1–4, default 1): ").trim().parse::<usize>().unwrap_or(1);
    Shape::ALL.get(choice.wrapping_sub(1)).copied().unwrap_or_default()
}

fn pick_count() -> usize {
    loop {
        let line = read_line(&format!("  Particle count (default {}): ", DEFAULT_PARTICLE_COUNT));
        let line = line.trim();
        if line.is_empty() { return DEFAULT_PARTICLE_COUNT; }
        match line.parse::<usize>() {
            Ok(n) if (1..=200_000).contains(&n) => return n,
            _ => println!("    ⚠  1–200000 only."),
        }
    }
}

fn pick_color() -> String {
    loop {
        let line = read_line(&format!("  Color #rrggbb (default {}): ", DEFAULT_COLOR));
        let line = line.trim();
        if line.is_empty() { return DEFAULT_COLOR.to_string(); }
        match parse_hex_color(line) {
            Ok(_)  => return line.to_string(),
            Err(e) => println!("    ⚠  {}", e),
        }
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}

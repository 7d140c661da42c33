//! Debug script to print a terrain's heights and hill peaks as ASCII

use std::error::Error;
use std::fs::File;
use std::io::{self, Write};

use clap::Parser;
use glam::Vec3;

use arena_generator::peaks::{PeakScanner, SCAN_MARGIN};
use arena_generator::progress::ProgressLog;
use arena_generator::terrain::{TerrainBuilder, TerrainStage, DEFAULT_ARENA_SIZE};
use arena_generator::{ArenaBounds, ArenaConfig, ArenaSeeds};

/// Height ramp, low to high.
const RAMP: &[u8] = b" .:-=+*#%@";

#[derive(Parser, Debug)]
#[command(name = "debug_peaks")]
struct Args {
    #[arg(short, long, default_value = "12345")]
    seed: u64,

    /// Horizontal arena extent; height follows the default arena
    #[arg(long, default_value_t = DEFAULT_ARENA_SIZE.x)]
    size: f32,

    /// Print every Nth sample
    #[arg(long, default_value = "2")]
    stride: usize,

    #[arg(short, long)]
    config: Option<String>,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("debug_peaks: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => ArenaConfig::load(path)?,
        None => ArenaConfig::default(),
    };
    let seeds = ArenaSeeds::from_master(args.seed);
    let bounds = ArenaBounds::new(Vec3::ZERO, Vec3::new(args.size, DEFAULT_ARENA_SIZE.y, args.size));

    let mut builder = TerrainBuilder::new(bounds, config.terrain.clone(), seeds.heightmap)?;
    let mut progress = ProgressLog::default();
    while builder.state() != TerrainStage::Ready {
        builder.step(&mut progress)?;
    }
    let terrain = builder.terrain()?;
    let grid = &terrain.grid;
    let peaks = PeakScanner::new(config.peaks.clone())?.scan(grid);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };

    let (w, h) = (grid.heightmap_width(), grid.heightmap_height());
    let stride = args.stride.max(1);
    writeln!(out, "=== HILL PEAKS {}x{} seed={} ===", w, h, args.seed)?;
    writeln!(
        out,
        "max height {:.1} | border {:.1} | scan margin {} | {} peaks",
        grid.max_height_world(),
        grid.border_height_world(),
        SCAN_MARGIN,
        peaks.len()
    )?;
    writeln!(out, "LEGEND: '{}' low -> high, P = peak", String::from_utf8_lossy(RAMP))?;
    writeln!(out)?;

    let max = grid.max_height().max(f32::EPSILON);
    for z in (0..h).step_by(stride) {
        let line: String = (0..w)
            .step_by(stride)
            .map(|x| {
                let is_peak = peaks
                    .iter()
                    .any(|p| p.grid_x / stride == x / stride && p.grid_z / stride == z / stride);
                if is_peak {
                    'P'
                } else {
                    let t = (grid.normalized_height(x, z) / max).clamp(0.0, 1.0);
                    RAMP[((t * (RAMP.len() - 1) as f32).round() as usize).min(RAMP.len() - 1)] as char
                }
            })
            .collect();
        writeln!(out, "{}", line)?;
    }

    writeln!(out)?;
    for (i, peak) in peaks.iter().enumerate() {
        let pos = peak.world_position(grid);
        writeln!(
            out,
            "{:>3}: cell ({:>3}, {:>3})  world ({:>7.1}, {:>5.1}, {:>7.1})  slope {:>4.1} deg",
            i,
            peak.grid_x,
            peak.grid_z,
            pos.x,
            pos.y,
            pos.z,
            grid.steepness_at(peak.grid_x, peak.grid_z)
        )?;
    }
    Ok(())
}

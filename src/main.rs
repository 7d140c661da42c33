use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use glam::Vec3;

use arena_generator::export;
use arena_generator::terrain::DEFAULT_ARENA_SIZE;
use arena_generator::{
    generate, ArenaBounds, ArenaConfig, ArenaSeeds, Difficulty, DifficultyProvider, SessionDifficulty,
};

#[derive(Parser, Debug)]
#[command(name = "arena_generator")]
#[command(about = "Generate a procedural arena: terrain, hill peaks and platform layers")]
struct Args {
    /// Arena width (x) in world units
    #[arg(short = 'W', long, default_value_t = DEFAULT_ARENA_SIZE.x)]
    width: f32,

    /// Arena height (y) in world units
    #[arg(short = 'H', long, default_value_t = DEFAULT_ARENA_SIZE.y)]
    height: f32,

    /// Arena depth (z) in world units
    #[arg(short = 'D', long, default_value_t = DEFAULT_ARENA_SIZE.z)]
    depth: f32,

    /// Terrain seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Placement seed (random unless given, so layouts vary per run)
    #[arg(long)]
    placement_seed: Option<u64>,

    #[arg(short, long, value_enum, default_value_t = Difficulty::Medium)]
    difficulty: Difficulty,

    /// JSON config file (defaults used for anything it omits)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective config as JSON and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,

    /// Export the heightmap (spectral colormap, peaks marked) to PNG
    #[arg(long)]
    export_heightmap: Option<PathBuf>,

    /// Export the texture blend weights to PNG
    #[arg(long)]
    export_splat: Option<PathBuf>,

    /// Export peaks, platforms and markers as JSON
    #[arg(long)]
    export_layout: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run(Args::parse()) {
        log::error!("Arena generation failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => ArenaConfig::load(path)?,
        None => ArenaConfig::default(),
    };

    if let Some(path) = &args.dump_config {
        std::fs::write(path, config.to_json()?)?;
        log::info!("Wrote config to {}", path.display());
        return Ok(());
    }

    let master = args.seed.unwrap_or_else(rand::random);
    let seeds = match args.placement_seed {
        Some(placement) => ArenaSeeds::from_master(master).placement(placement),
        None => ArenaSeeds::with_random_placement(master),
    };
    let difficulty = SessionDifficulty {
        level: args.difficulty,
        factors: config.difficulty_factors,
    };
    log::info!(
        "Difficulty: {} (factor {:.2})",
        args.difficulty,
        difficulty.difficulty_factor()
    );

    let bounds = ArenaBounds::new(Vec3::ZERO, Vec3::new(args.width, args.height, args.depth));
    let result = generate(config, bounds, seeds, &difficulty)?;

    log::info!(
        "Arena ready: {} peaks, {} sky layers, start {:?}, exit {:?}",
        result.peaks.len(),
        result.sky_layers.len(),
        result.markers.start(),
        result.markers.exit()
    );

    if let Some(path) = &args.export_heightmap {
        export::export_heightmap(&result.terrain.grid, &result.peaks, path)?;
        log::info!("Exported heightmap to {}", path.display());
    }
    if let Some(path) = &args.export_splat {
        export::export_blend_weights(&result.terrain.blend_weights, path)?;
        log::info!("Exported blend weights to {}", path.display());
    }
    if let Some(path) = &args.export_layout {
        export::export_layout(&result, path)?;
        log::info!("Exported layout to {}", path.display());
    }

    Ok(())
}

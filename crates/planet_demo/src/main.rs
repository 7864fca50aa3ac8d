//! Headless planet fly-in.
//!
//! Drops an observer from orbit towards the surface of one planet and runs
//! the LOD quadtrees and chunk forge tick by tick, printing how the tree and
//! the forge evolve. Meshes land in an in-memory store instead of a GPU.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use glam::DVec3;
use planet_terrain::{ChunkForge, Execution, LodStats, MeshStore, Observer, Planet};
use std::path::PathBuf;
use std::sync::Arc;

use config::DemoConfig;

/// Planet terrain fly-in driver.
#[derive(Parser, Debug)]
#[command(name = "planet_demo")]
#[command(about = "Descends an observer onto a procedural planet and reports LOD statistics")]
struct Args {
	/// Path to configuration TOML file (defaults are used otherwise).
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Override the number of ticks.
	#[arg(short, long)]
	ticks: Option<u32>,

	/// Override the planet seed.
	#[arg(long)]
	seed: Option<u64>,

	/// Build chunks on the main thread instead of the worker pool.
	#[arg(long)]
	inline: bool,

	/// Ticks to keep running after the descent so the forge can drain.
	#[arg(long, default_value_t = 500)]
	drain_ticks: u32,
}

fn main() -> Result<()> {
	env_logger::init();
	let args = Args::parse();

	let mut config = match &args.config {
		Some(path) => {
			println!("Loading config from: {}", path.display());
			DemoConfig::load(path)?
		}
		None => DemoConfig::default(),
	};
	if let Some(ticks) = args.ticks {
		config.ticks = ticks;
	}
	if let Some(seed) = args.seed {
		config.planet.seed = seed;
	}
	if args.inline {
		config.forge.execution = Execution::Inline;
	}
	config.validate()?;

	let terrain = Arc::new(config.terrain_settings());
	let mut forge = ChunkForge::new(&config.forge).context("Failed to start chunk forge")?;
	let mut store = MeshStore::new();
	let mut planet = Planet::new(config.planet.clone(), terrain, &mut forge)
		.context("Failed to create planet")?;

	let radius = planet.radius();
	let heading = DVec3::new(0.3, 0.8, 0.5).normalize();
	let mut altitude = radius * config.start_altitude_factor;

	println!(
		"Planet radius {:.0}, depth {}..={}, {} workers ({:?})",
		radius,
		config.planet.min_depth,
		config.planet.max_depth,
		forge.worker_count(),
		config.forge.execution
	);

	let mut totals = LodStats::default();
	for tick in 0..config.ticks {
		altitude = (altitude * config.descent_rate).max(config.floor_altitude);
		let observer = Observer::looking_at_origin(heading * (radius + altitude));

		totals += planet.update_lod(&observer, &mut forge);
		if let Some(applied) = forge.update(&mut store) {
			planet.record_applied(&applied);
		}

		if config.report_every > 0 && tick % config.report_every == 0 {
			report(tick, altitude, &planet, &forge, &store);
		}
	}

	// Let outstanding builds land
	let observer = Observer::looking_at_origin(heading * (radius + altitude));
	let mut drained = 0;
	while !forge.is_idle() && drained < args.drain_ticks {
		totals += planet.update_lod(&observer, &mut forge);
		if let Some(applied) = forge.update(&mut store) {
			planet.record_applied(&applied);
		}
		drained += 1;
		if forge.pool().has_task() || forge.in_flight() > 0 {
			std::thread::sleep(std::time::Duration::from_millis(1));
		}
	}
	report(config.ticks + drained, altitude, &planet, &forge, &store);

	let below = planet.leaf_containing(heading * radius);
	if let Some(chunk) = below {
		println!(
			"\nChunk below observer: {} (depth {}, side {:.1}, resource: {:?})",
			chunk.id,
			chunk.depth(),
			chunk.side_length,
			chunk.mesh.resource()
		);
	}

	println!(
		"\nLOD: {} splits, {} merges, {} builds, {} deletions, {} deferred",
		totals.splits, totals.merges, totals.builds_issued, totals.deletions_issued, totals.deferred
	);
	let metrics = forge.metrics();
	let (fastest, slowest) = metrics.build_timings.min_max().unwrap_or((0, 0));
	println!(
		"Forge: {} submitted, {} applied, {} discarded, {} cancelled, {} failed, peak {} concurrent",
		metrics.submitted,
		metrics.applied,
		metrics.discarded,
		metrics.cancelled,
		metrics.failed,
		metrics.peak_concurrent
	);
	println!(
		"Builds: {:.0}us avg ({}..{}us over the last {})",
		metrics.build_timings.average(),
		fastest,
		slowest,
		metrics.build_timings.len()
	);

	let deleted = planet.dispose(&mut forge);
	for _ in 0..args.drain_ticks {
		forge.update(&mut store);
		if forge.is_idle() {
			break;
		}
		std::thread::sleep(std::time::Duration::from_millis(1));
	}
	log::info!("disposed {} chunks, {} meshes still live", deleted, store.len());

	Ok(())
}

fn report(tick: u32, altitude: f64, planet: &Planet, forge: &ChunkForge, store: &MeshStore) {
	println!(
		"[{:>5}] alt {:>12.1}  leaves {:>5} (ready {:>5}, max depth {:>2})  queued {:>4}  in flight {:>2}  meshes {:>5} ({} tris, {:.1} MiB)",
		tick,
		altitude,
		planet.leaf_count(),
		planet.ready_count(),
		planet.max_leaf_depth(),
		forge.queued(),
		forge.in_flight(),
		store.len(),
		store.triangle_count(),
		store.byte_size() as f64 / (1024.0 * 1024.0)
	);
}

//! brickweld CLI - headless driver for the snap-assembly engine
//!
//! Inspects scene documents and configs, and replays scripted hand input
//! against a Rapier world.

use anyhow::{Context, Result};
use brickweld::{FrameInput, PhysicsBackend, Workshop, WorkshopConfig};
use brickweld_ir::naming::parse_connector_name;
use brickweld_ir::SceneDoc;
use brickweld_physics::RapierWorld;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

mod logs;
mod script;

use script::Script;

#[derive(Parser)]
#[command(name = "brickweld")]
#[command(about = "Snap-together brick assembly engine", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the parts, connectors and instances of a scene
    Info {
        /// Scene document (.json)
        scene: PathBuf,
    },
    /// Parse a config file and print the effective settings
    CheckConfig {
        /// Config file (.toml)
        config: PathBuf,
    },
    /// Load a scene, replay scripted hand input and print the result
    Replay {
        /// Scene document (.json)
        scene: PathBuf,
        /// Input script (.json)
        script: PathBuf,
        /// Config file (.toml); defaults are used when absent
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Idle frames simulated after the script ends
        #[arg(short, long, default_value_t = 60)]
        frames: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logs::init_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { scene } => show_info(&scene),
        Commands::CheckConfig { config } => check_config(&config),
        Commands::Replay {
            scene,
            script,
            config,
            frames,
        } => replay(&scene, &script, config.as_deref(), frames),
    }
}

fn read_scene(path: &Path) -> Result<SceneDoc> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    SceneDoc::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

fn show_info(path: &Path) -> Result<()> {
    let doc = read_scene(path)?;

    println!("brickweld scene: {}", path.display());
    println!("  Version: {}", doc.version);
    println!("  Parts: {}", doc.parts.len());
    println!("  Instances: {}", doc.instances.len());

    let mut names: Vec<&String> = doc.parts.keys().collect();
    names.sort();
    if !names.is_empty() {
        println!("\nParts:");
    }
    for name in names {
        let part = &doc.parts[name];
        println!("  {} ({} connectors)", name, part.connectors.len());
        for connector in &part.connectors {
            match parse_connector_name(&connector.name) {
                Some((kind, channel)) => {
                    println!("    {} {:?} channel {:?}", connector.name, kind, channel)
                }
                None => println!("    {} (not a connector name)", connector.name),
            }
        }
    }

    if !doc.instances.is_empty() {
        println!("\nInstances:");
        for (i, instance) in doc.instances.iter().enumerate() {
            let t = &instance.transform.translation;
            let known = if doc.parts.contains_key(instance.part_name()) {
                ""
            } else {
                " [missing part]"
            };
            println!(
                "  {}: {} -> {} at ({:.3}, {:.3}, {:.3}){}",
                i + 1,
                instance.name,
                instance.part_name(),
                t.x,
                t.y,
                t.z,
                known
            );
        }
    }

    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config =
        WorkshopConfig::load(path).with_context(|| format!("loading {}", path.display()))?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// Load `doc` into a fresh Rapier world, play `frames`, then hold the last
/// input for `idle` more ticks.
fn simulate(
    doc: &SceneDoc,
    config: WorkshopConfig,
    frames: &[FrameInput],
    idle: u32,
) -> Result<(Workshop, RapierWorld)> {
    let mut world = RapierWorld::new(&config.world);
    let mut workshop = Workshop::load(doc, config, &mut world, &mut ())?;
    info!(
        assemblies = workshop.registry().len(),
        frames = frames.len(),
        idle,
        "replaying"
    );

    for frame in frames {
        workshop.tick(frame, &mut world, &mut ());
    }
    let last = frames.last().copied().unwrap_or_default();
    for _ in 0..idle {
        workshop.tick(&last, &mut world, &mut ());
    }
    Ok((workshop, world))
}

fn replay(scene: &Path, script: &Path, config: Option<&Path>, idle: u32) -> Result<()> {
    let doc = read_scene(scene)?;
    let config = match config {
        Some(path) => {
            WorkshopConfig::load(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => WorkshopConfig::default(),
    };
    let text = std::fs::read_to_string(script)
        .with_context(|| format!("reading {}", script.display()))?;
    let frames = Script::from_json(&text)
        .with_context(|| format!("parsing {}", script.display()))?
        .expand();

    let (workshop, world) = simulate(&doc, config, &frames, idle)?;

    let registry = workshop.registry();
    println!("{} assemblies", registry.len());
    for (i, (key, assembly)) in registry.assemblies().enumerate() {
        let names: Vec<&str> = registry
            .pieces_of(key)
            .map(|(_, piece)| piece.name.as_str())
            .collect();
        let t = assembly.pose.translation.vector;
        let holder = assembly
            .holder
            .map(|hand| format!(" held by {hand}"))
            .unwrap_or_default();
        let body = assembly
            .body
            .filter(|body| world.body_pose(*body).is_some())
            .map(|body| format!(" body {}", body.0))
            .unwrap_or_else(|| " no body".to_string());
        println!(
            "  {}: [{}] at ({:.3}, {:.3}, {:.3}){}{}",
            i + 1,
            names.join(", "),
            t.x,
            t.y,
            t.z,
            holder,
            body
        );
    }

    Ok(())
}

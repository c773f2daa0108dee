use anyhow::Context;
use clap::Parser;
use primordium_core::{AppConfig, World};
use primordium_io::registry::FileRegistryStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file overlaid on the built-in defaults.
    #[arg(short, long)]
    config: Option<String>,

    /// Number of ticks to run; runs until the population dies out if unset.
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Seconds of simulated time advanced per tick.
    #[arg(long, default_value_t = 1.0)]
    dt: f32,

    /// How often (in ticks) to print a population summary.
    #[arg(long, default_value_t = 100)]
    summary_interval: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {path}"))?;
            AppConfig::from_toml(&content)?
        }
        None => AppConfig::default(),
    };

    tracing::info!(fingerprint = %config.fingerprint(), "starting run");

    let registry_path = config.registry_path.clone();
    let initial_count = config.world.initial_organism_count;

    let mut world = World::new(config)?;
    if let Some(path) = &registry_path {
        world = world.with_registry_store(Box::new(FileRegistryStore::new(path)));
    }
    world.spawn_random_organisms(initial_count, None);

    let mut tick: u64 = 0;
    loop {
        if let Some(limit) = args.ticks {
            if tick >= limit {
                break;
            }
        }
        if world.living_population() == 0 {
            tracing::info!(tick, "population died out");
            break;
        }

        world.tick(args.dt);
        tick += 1;

        if tick.is_multiple_of(args.summary_interval) {
            tracing::info!(
                tick,
                population = world.living_population(),
                living_species = world.species_stats.living_species,
                extinct_species = world.species_stats.extinct_species,
                "summary"
            );
        }
    }

    if let Some(path) = &registry_path {
        if let Err(e) = world.persist_registry() {
            tracing::error!(error = %e, path, "failed to persist species registry");
        } else {
            tracing::info!(path, "species registry persisted");
        }
    }

    println!(
        "Finished after {tick} ticks. Final population: {}",
        world.living_population()
    );
    Ok(())
}

//! Gapflight entry point
//!
//! `train` runs the generation driver with the baseline search; `replay`
//! loads a saved winner and flies it alone through one episode.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use gapflight::driver::{GenerationReport, Observer};
use gapflight::persistence;
use gapflight::sim::{Session, Shapes, Snapshot, tick};
use gapflight::{GenerationDriver, Perceptron, RandomSearch, Settings};

#[derive(Parser, Debug)]
#[command(name = "gapflight")]
#[command(about = "Score flying agent populations against a scrolling obstacle field")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evolve decision functions over several generations
    Train {
        /// JSON settings file; missing fields use the built-in defaults
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        generations: Option<u32>,
        #[arg(long)]
        population: Option<usize>,
        /// Run at the nominal tick rate instead of as fast as possible
        #[arg(long, default_value_t = false)]
        paced: bool,
        /// Where to write the winning decision function (default `winner.json`)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fly a saved winner through a single episode
    Replay {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Logs episode progress at trace level
struct LogObserver;

impl Observer for LogObserver {
    fn wants_snapshots(&self) -> bool {
        log::log_enabled!(log::Level::Trace)
    }

    fn on_tick(&mut self, snapshot: &Snapshot) {
        log::trace!(
            "tick {}: {} alive, score {}",
            snapshot.tick,
            snapshot.agents.len(),
            snapshot.score
        );
    }

    fn on_generation(&mut self, report: &GenerationReport) {
        if let Some((id, fitness)) = report.best() {
            log::debug!("Generation {} best candidate {} ({fitness:.1})", report.generation, id.0);
        }
    }
}

fn load_settings(config: Option<&PathBuf>) -> Result<Settings> {
    match config {
        Some(path) => Settings::load(path).with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

fn train(
    config: Option<PathBuf>,
    seed: Option<u64>,
    generations: Option<u32>,
    population: Option<usize>,
    paced: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut settings = load_settings(config.as_ref())?;
    if let Some(seed) = seed {
        settings.driver.base_seed = seed;
    }
    if let Some(generations) = generations {
        settings.driver.generations = generations;
    }
    if let Some(population) = population {
        settings.driver.population_size = population;
    }
    settings.driver.paced |= paced;
    if out.is_some() {
        settings.driver.winner_path = out;
    }

    let search = RandomSearch::new(
        settings.driver.population_size,
        settings.driver.search_scale,
        settings.driver.base_seed,
    );
    let mut driver =
        GenerationDriver::new(settings, Shapes::standard(), search).context("invalid settings")?;
    let summary = driver.run(&mut LogObserver)?;

    match &summary.winner {
        Some(winner) => log::info!(
            "Best fitness {:.1} from generation {} after {} generations",
            winner.fitness,
            winner.generation,
            summary.reports.len()
        ),
        None => log::warn!("No generation completed"),
    }
    Ok(())
}

fn replay(model: PathBuf, config: Option<PathBuf>, seed: Option<u64>) -> Result<()> {
    let mut settings = load_settings(config.as_ref())?;
    if let Some(seed) = seed {
        settings.session.seed = seed;
    }

    let record = persistence::load_winner(&model)?;
    let brain = Perceptron::from_state(&record.blob)
        .map_err(|e| anyhow!("winner at {} is not a perceptron: {e}", model.display()))?;
    log::info!(
        "Replaying winner from generation {} (fitness {:.1})",
        record.generation,
        record.fitness
    );

    let mut session = Session::new(settings.session, Shapes::standard(), record.generation, [&brain])
        .context("building replay session")?;
    let mut observer = LogObserver;
    while session.phase.is_running() {
        tick(&mut session);
        if observer.wants_snapshots() {
            observer.on_tick(&session.snapshot());
        }
    }

    let fitness = session.final_fitness().first().map_or(0.0, |&(_, f)| f);
    log::info!(
        "Replay ended {:?} after {} ticks: score {}, fitness {fitness:.1}",
        session.phase,
        session.time_ticks,
        session.score
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Train {
            config,
            seed,
            generations,
            population,
            paced,
            out,
        } => train(config, seed, generations, population, paced, out),
        Commands::Replay { model, config, seed } => replay(model, config, seed),
    }
}

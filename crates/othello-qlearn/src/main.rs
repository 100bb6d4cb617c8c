use std::io::{stdin, stdout};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use othello::Color;
use othello_qlearn::play::play_game;
use othello_qlearn::{LearnerConfig, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Tabular Q-learning Othello agent
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with learner settings; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Where the Q-table is loaded from and saved to
    #[arg(long, global = true)]
    qtable: Option<PathBuf>,

    /// Where learning statistics are kept
    #[arg(long, global = true)]
    stats: Option<PathBuf>,

    /// Learning rate
    #[arg(long, global = true)]
    alpha: Option<f64>,

    /// Discount factor
    #[arg(long, global = true)]
    gamma: Option<f64>,

    /// Exploration rate
    #[arg(long, global = true)]
    epsilon: Option<f64>,

    /// Seed for reproducible runs
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train the agent against itself
    Train {
        /// Number of self-play episodes
        #[arg(short, long, default_value_t = 1000)]
        episodes: u64,
    },
    /// Play a game against the agent in the terminal
    Play {
        /// Which color the human plays
        #[arg(short, long, value_enum, default_value_t = HumanColor::Black)]
        color: HumanColor,
    },
}

/// Selects which color is human
#[derive(Clone, Copy, Debug, ValueEnum)]
enum HumanColor {
    Black,
    White,
}

impl From<HumanColor> for Color {
    fn from(color: HumanColor) -> Self {
        match color {
            HumanColor::Black => Color::Black,
            HumanColor::White => Color::White,
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<LearnerConfig> {
    let mut config = match &args.config {
        Some(path) => LearnerConfig::from_json_file(path)?,
        None => LearnerConfig::default(),
    };

    if let Some(path) = &args.qtable {
        config = config.with_qtable_path(path);
    }
    if let Some(path) = &args.stats {
        config = config.with_learning_stats_path(path);
    }
    if let Some(alpha) = args.alpha {
        config = config.with_alpha(alpha);
    }
    if let Some(gamma) = args.gamma {
        config = config.with_gamma(gamma);
    }
    if let Some(epsilon) = args.epsilon {
        config = config.with_epsilon(epsilon);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let mut session = Session::open(config).context("failed to open learner session")?;

    match args.command {
        Command::Train { episodes } => {
            let summary = session.selfplay(episodes)?;
            println!("{}", summary);
            println!("All time: {}", session.stats().totals);
        }
        Command::Play { color } => {
            info!("Starting a game against the agent ({} Q-values)", session.table().len());
            play_game(&mut session, color.into(), &mut stdin().lock(), &mut stdout())?;
        }
    }

    Ok(())
}

//! Backgammon-Engine command line.
//!
//! ## Usage
//!
//! - `backgammon` - Show a demo
//! - `backgammon protocol` - Serve the text protocol on stdin/stdout
//! - `backgammon selfplay` - Play agent-vs-agent games and report results
//! - `backgammon demo` - Play one short seeded game

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, info};

use backgammon_engine::board::Color;
use backgammon_engine::constants::DEFAULT_DEPTH;
use backgammon_engine::game::{Game, SideConfig};
use backgammon_engine::protocol::ProtocolEngine;
use backgammon_engine::search::{WindowMode, format_moves};

/// Backgammon-Engine: backgammon rules with an expectiminimax agent
#[derive(Parser)]
#[command(name = "backgammon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write debug-level logs to this file
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the line-oriented text protocol on stdin/stdout
    Protocol(AgentArgs),
    /// Play agent-vs-agent games
    Selfplay {
        /// Number of games to play
        #[arg(short, long, default_value_t = 10)]
        games: usize,

        #[command(flatten)]
        agents: AgentArgs,
    },
    /// Play one short seeded game and print the board
    Demo,
}

#[derive(Args)]
struct AgentArgs {
    /// Evaluation factor codes for White (0-4)
    #[arg(long, default_value = "")]
    white_factors: String,

    /// Evaluation factor codes for Black (0-4)
    #[arg(long, default_value = "")]
    black_factors: String,

    /// Search depth in plies beyond the current roll
    #[arg(short, long, env = "BACKGAMMON_DEPTH", default_value_t = DEFAULT_DEPTH)]
    depth: u32,

    /// Search depth for White only
    #[arg(long)]
    white_depth: Option<u32>,

    /// Search depth for Black only
    #[arg(long)]
    black_depth: Option<u32>,

    /// Dice seed for reproducible games
    #[arg(short, long, env = "BACKGAMMON_SEED")]
    seed: Option<u64>,

    /// Abandon a search after this many milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// How alpha-beta bounds are shared between dice outcomes
    #[arg(long, value_enum, default_value_t = WindowArg::Shared)]
    window: WindowArg,
}

#[derive(Copy, Clone, ValueEnum)]
enum WindowArg {
    /// One window per chance node
    Shared,
    /// A copy of the inherited window per outcome
    PerOutcome,
    /// No pruning
    Exhaustive,
}

impl From<WindowArg> for WindowMode {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Shared => WindowMode::Shared,
            WindowArg::PerOutcome => WindowMode::PerOutcome,
            WindowArg::Exhaustive => WindowMode::Exhaustive,
        }
    }
}

impl AgentArgs {
    fn side(&self, factors: &str, depth: Option<u32>) -> Result<SideConfig> {
        if let Some(bad) = factors.chars().find(|c| !('0'..='4').contains(c)) {
            bail!("unknown evaluation factor code '{bad}' in \"{factors}\"");
        }
        let mut side = SideConfig::ai(factors, depth.unwrap_or(self.depth));
        side.search = side.search.with_window(self.window.into());
        if let Some(ms) = self.deadline_ms {
            side.search = side.search.with_deadline(Duration::from_millis(ms));
        }
        Ok(side)
    }

    fn sides(&self) -> Result<(SideConfig, SideConfig)> {
        let white = self
            .side(&self.white_factors, self.white_depth)
            .context("invalid --white-factors")?;
        let black = self
            .side(&self.black_factors, self.black_depth)
            .context("invalid --black-factors")?;
        Ok((white, black))
    }
}

fn setup_logger(verbose: u8, log_file: Option<&str>) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let log_dispatcher = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}[{}][{}] {}",
            chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
            record.target(),
            record.level(),
            message
        ))
    });

    let log_dispatcher = if let Some(log_file) = log_file {
        log_dispatcher.chain(
            fern::Dispatch::new()
                .level(level.max(LevelFilter::Debug))
                .chain(
                    fern::log_file(log_file)
                        .with_context(|| format!("cannot open log file {log_file}"))?,
                ),
        )
    } else {
        log_dispatcher
    };

    log_dispatcher
        .chain(fern::Dispatch::new().level(level).chain(io::stderr()))
        .apply()
        .context("logger already initialized")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Some(Commands::Protocol(agents)) => {
            let (white, black) = agents.sides()?;
            let mut engine = ProtocolEngine::with_sides(white, black, agents.seed);
            engine.run().context("protocol I/O failed")?;
        }
        Some(Commands::Selfplay { games, agents }) => run_selfplay(games, &agents)?,
        Some(Commands::Demo) | None => run_demo()?,
    }
    Ok(())
}

fn run_selfplay(games: usize, agents: &AgentArgs) -> Result<()> {
    let (white, black) = agents.sides()?;
    let base_seed = agents.seed.unwrap_or_else(|| fastrand::u64(..));
    println!(
        "Self-play: {games} games, White \"{}\" depth {} vs Black \"{}\" depth {}",
        white.factors, white.search.depth, black.factors, black.search.depth
    );

    let started = Instant::now();
    let mut wins = [0usize; 2];
    let mut total_turns = 0usize;
    for n in 0..games {
        let mut game = Game::with_seed(base_seed.wrapping_add(n as u64));
        game.set_side(Color::White, white.clone());
        game.set_side(Color::Black, black.clone());

        while !game.is_game_over() {
            game.play_ai_turn()
                .with_context(|| format!("game {n} stalled after {} turns", game.turns()))?;
        }
        if !game.is_consistent() {
            bail!("game {n} ended with checker totals {:?}", game.checker_totals());
        }

        let Some(winner) = game.winner() else {
            bail!("game {n} finished without a winner");
        };
        wins[winner.index()] += 1;
        total_turns += game.turns();
        info!("game {n}: {winner} wins in {} turns", game.turns());
    }

    println!("White wins: {}", wins[Color::White.index()]);
    println!("Black wins: {}", wins[Color::Black.index()]);
    if games > 0 {
        println!("Average turns: {:.1}", total_turns as f64 / games as f64);
    }
    println!("Elapsed: {:.2?}", started.elapsed());
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("Backgammon-Engine: expectiminimax backgammon agent\n");

    let mut game = Game::with_seed(2024);
    game.set_side(Color::White, SideConfig::ai("02", 0));
    game.set_side(Color::Black, SideConfig::ai("14", 0));
    println!("{}", game.board());

    for _ in 0..6 {
        let color = game.current_color();
        game.roll_dice().context("demo roll failed")?;
        let (die1, die2) = (game.dice().die1(), game.dice().die2());
        let moves = game.get_best_move_for_current_player();
        let applied = game.execute_ai_moves(&moves);
        game.end_turn();
        println!("{color} rolled {die1}-{die2}: {}", format_moves(&moves[..applied]));
    }

    println!("\n{}", game.board());
    println!(
        "Pips: White {} Black {}",
        game.board().pip_count(Color::White),
        game.board().pip_count(Color::Black)
    );
    Ok(())
}

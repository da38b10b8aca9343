//! Cube Packing Solver
//!
//! Searches for a way to pack the six pieces of the wooden cube puzzle into a
//! 3x3x3 cube and prints the first packing found.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use cube_packer::pieces::{wooden_cube_pieces, WOODEN_CUBE_SIZE};
use cube_packer::{CubeSolver, OrientedPiece, Outcome, SolverConfig};

/// Solves the wooden cube packing puzzle by brute force.
#[derive(Parser)]
#[command(name = "cube-packer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Search for a packing and print the filled cube.
    Solve(SolveArgs),
    /// Print each piece and its number of distinct orientations.
    Pieces,
}

#[derive(Args)]
struct SolveArgs {
    /// Cells per side of the cube.
    #[arg(long, default_value_t = WOODEN_CUBE_SIZE)]
    size: usize,
    /// Log progress every this many rejected placements (0 disables).
    #[arg(long, default_value_t = 1_000_000)]
    progress_interval: u64,
    /// Split the first piece's orientations across worker threads.
    #[arg(long)]
    parallel: bool,
}

impl Default for SolveArgs {
    fn default() -> Self {
        let config = SolverConfig::default();
        Self {
            size: config.cube_size,
            progress_interval: config.progress_interval,
            parallel: false,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Solve(args)) => run_solver(&args),
        Some(Command::Pieces) => run_pieces(),
        None => run_solver(&SolveArgs::default()),
    }
}

/// Solves the puzzle and prints the grid, stopping early on Ctrl-C.
fn run_solver(args: &SolveArgs) -> anyhow::Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler({
        let cancel = Arc::clone(&cancel);
        move || cancel.store(true, Ordering::Relaxed)
    })?;

    let config = SolverConfig::default()
        .with_cube_size(args.size)
        .with_progress_interval(args.progress_interval);
    let mut solver = CubeSolver::new(config)
        .with_pieces(wooden_cube_pieces())
        .with_cancel_flag(cancel);

    let outcome = if args.parallel {
        solver.solve_parallel()?
    } else {
        solver.solve()?
    };

    match outcome {
        Outcome::Found => {
            println!("Cube:");
            print!("{}", solver.grid());
        }
        Outcome::Exhausted => {
            println!("No solution exists for a {0}x{0}x{0} cube", args.size);
        }
    }
    println!("Iterations: {}", solver.iterations());
    Ok(())
}

/// Lists the puzzle pieces.
fn run_pieces() -> anyhow::Result<()> {
    for piece in wooden_cube_pieces() {
        let mut wrapped = OrientedPiece::new(piece, WOODEN_CUBE_SIZE);
        wrapped.orientate(0)?;
        print!("{}", wrapped.original());
        println!(
            "Distinct orientations: {}, locations: {}",
            wrapped.distinct_orientations(),
            wrapped.number_of_locations()
        );
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_solve_arguments() {
        let cli =
            Cli::try_parse_from(["cube-packer", "solve", "--size", "2", "--parallel"]).unwrap();
        let Some(Command::Solve(args)) = cli.command else {
            panic!("expected the solve subcommand");
        };
        assert_eq!(args.size, 2);
        assert_eq!(args.progress_interval, 1_000_000);
        assert!(args.parallel);
    }

    #[test]
    fn test_default_arguments_match_config() {
        let args = SolveArgs::default();
        assert_eq!(args.size, WOODEN_CUBE_SIZE);
        assert!(!args.parallel);
    }
}

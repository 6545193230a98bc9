use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

mod commands;

use commands::IoParameters;
use commands::{bonds, info, xyz, zmat};
use zmat_forge::io::{write_bond_list, write_xyz, write_zmat};

#[derive(Parser, Debug)]
#[command(
    name = "zforge",
    about = "A command-line tool for covalent bond perception and Cartesian/Z-matrix conversion of molecular geometries.",
    version,
    author,
    arg_required_else_help = true
)]
struct Cli {
    /// Input file path. When omitted, stdin is used.
    #[arg(short, long, value_name = "FILE", global = true)]
    input: Option<PathBuf>,
    /// Output file path. When omitted, stdout is used.
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,
    /// Increase log verbosity (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize an XYZ molecule and its bonds.
    Info(info::InfoArgs),
    /// Perceive covalent bonds of an XYZ molecule and list them.
    Bonds(bonds::BondsArgs),
    /// Convert an XYZ molecule into a Z-matrix.
    Zmat(zmat::ZmatArgs),
    /// Convert a Z-matrix back into XYZ coordinates.
    Xyz(xyz::XyzArgs),
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let io_params = IoParameters {
        input: cli.input.clone(),
        output: cli.output.clone(),
    };

    match cli.command {
        Command::Info(args) => {
            let molecule = commands::load_molecule(&io_params)?;
            info::run(&molecule, &args)?;
        }
        Command::Bonds(args) => {
            let molecule = commands::load_molecule(&io_params)?;
            let graph = bonds::run(&molecule, &args)?;
            commands::save_with(&io_params, "bond list", |writer| {
                write_bond_list(writer, &molecule, &graph)
            })?;
        }
        Command::Zmat(args) => {
            let molecule = commands::load_molecule(&io_params)?;
            let zmat = zmat::run(&molecule, &args)?;
            commands::save_with(&io_params, "Z-matrix", |writer| write_zmat(writer, &zmat))?;
        }
        Command::Xyz(args) => {
            let zmat = commands::load_zmatrix(&io_params)?;
            let molecule = xyz::run(&zmat, &args)?;
            commands::save_with(&io_params, "XYZ", |writer| {
                write_xyz(writer, &molecule, "generated by zforge from a z-matrix")
            })?;
        }
    }

    Ok(())
}

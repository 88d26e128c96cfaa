use clap::{Args, Parser, Subcommand};
use rmsdkit::engine::config::Method;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "rmsdkit - Superpose protein structures and rank candidates by Cα RMSD against a reference.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare candidate structures against a reference and write a ranked CSV report.
    Compare(CompareArgs),
}

/// Arguments for the `compare` subcommand.
#[derive(Args, Debug)]
pub struct CompareArgs {
    // --- Inputs ---
    /// Reference structure (PDB or mmCIF).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub reference: PathBuf,

    /// A single candidate structure.
    #[arg(long, value_name = "PATH")]
    pub candidate: Option<PathBuf>,

    /// Several candidate structures. Missing files are skipped with a warning.
    #[arg(long, value_name = "PATH", num_args(1..))]
    pub candidates: Vec<PathBuf>,

    /// Directory scanned for `.pdb` and `.cif` candidates.
    #[arg(long, value_name = "DIR")]
    pub candidate_dir: Option<PathBuf>,

    // --- Method ---
    /// Alignment method: default, kabsch, robust or external.
    #[arg(short, long, value_name = "METHOD")]
    pub method: Option<Method>,

    /// Chain of the reference used by the robust method.
    #[arg(long, value_name = "ID")]
    pub chain_ref: Option<String>,

    /// Chain of each candidate used by the robust method.
    #[arg(long, value_name = "ID")]
    pub chain_mob: Option<String>,

    /// Outlier rejection cutoff in Ångströms for the robust method.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Maximum number of refinement cycles for the robust method.
    #[arg(long, value_name = "INT")]
    pub cycles: Option<usize>,

    /// Deviations strictly below this value are reported as acceptable.
    #[arg(short, long, value_name = "FLOAT")]
    pub threshold: Option<f64>,

    // --- Output ---
    /// File name of the CSV report.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory the CSV report is written into. Created if missing.
    #[arg(long, value_name = "DIR")]
    pub outdir: Option<PathBuf>,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S robust.cutoff=1.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

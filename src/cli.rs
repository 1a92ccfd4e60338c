// Standard Library Imports
use std::path::PathBuf;

// External Crate Imports
use clap::{ArgAction, Parser, ValueEnum};
use peptide::{Conversion, DEFAULT_HELM_ID};

#[derive(Parser, Debug)]
#[command(version, about = "Translate peptides between HELM, MAP, and SMILES")]
pub struct Cli {
    /// The direction to translate in
    #[arg(value_enum)]
    pub mode: Mode,

    /// A single peptide, or a file containing one peptide per line. Without this, an interactive prompt is started
    #[arg(short, long, value_name = "TEXT_OR_PATH")]
    pub input: Option<String>,

    /// Write translations to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// The HELM polymer id used when translating MAP to HELM. Lines written as `MAP,ID` override it
    #[arg(long, default_value_t = DEFAULT_HELM_ID, value_name = "NUM")]
    pub id: u32,

    /// Load monomers from this KDL file instead of the built-in library
    #[arg(short, long, value_name = "PATH")]
    pub library: Option<PathBuf>,

    /// Read and write numeric cyclization tags the way older tools did (1 is the N-terminus, the last position is
    /// the C-terminus)
    #[arg(long)]
    pub legacy: bool,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a file in addition to stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// The number of threads used for batch translation. Defaults to the number of logical cores
    #[arg(short = 'j', long, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum Mode {
    HelmToMap,
    MapToHelm,
    MapToSmiles,
    HelmToSmiles,
}

impl Mode {
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::HelmToMap | Self::HelmToSmiles => "HELM: ",
            Self::MapToHelm | Self::MapToSmiles => "MAP: ",
        }
    }
}

impl From<Mode> for Conversion {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::HelmToMap => Self::HelmToMap,
            Mode::MapToHelm => Self::MapToHelm,
            Mode::MapToSmiles => Self::MapToSmiles,
            Mode::HelmToSmiles => Self::HelmToSmiles,
        }
    }
}

// Module Tests ========================================================================================================

use std::num::ParseIntError;

use derive_more::Display;
use miette::Diagnostic;
use molzip::{GraphEngineError, Site};
use nom::error::ErrorKind;
use nom_miette::{FromExternalError, LabeledError, LabeledErrorKind, LabeledParseError};
use thiserror::Error;

use crate::{Linkage, LinkageError, planner::Consumption};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] LabeledError<NotationErrorKind>),

    #[diagnostic(help("double-check for typos, or add a monomer with this name to the library"))]
    #[error("the {notation} text {token:?} does not name a monomer in the library")]
    UnknownMonomer { notation: Notation, token: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    MalformedLinkage(#[from] LinkageError),

    #[diagnostic(help("the two ends of a cyclization must be attachment points left free by the backbone"))]
    #[error("the linkage site {site} is already used by a {consumption}")]
    ConflictingLinkage { site: Site, consumption: Consumption },

    #[diagnostic(help("N-terminal caps can only start a chain, and C-terminal caps can only end one"))]
    #[error("the {symbol:?} at position {} has no {} attachment to continue the backbone", .site.position, .site.attachment)]
    BrokenBackbone { site: Site, symbol: String },

    #[error("the peptide contains no monomers")]
    EmptyPeptide,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Assembly(#[from] AssemblyError),
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Notation {
    #[display("HELM")]
    Helm,
    #[display("MAP")]
    Map,
}

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum AssemblyError {
    #[error("failed to load the structure of {symbol:?} at position {position}")]
    Fragment {
        position: usize,
        symbol: String,
        #[source]
        #[diagnostic_source]
        source: GraphEngineError,
    },

    #[error("failed to cap the attachment point {site} with {cap:?}")]
    Cap {
        site: Site,
        cap: String,
        #[source]
        #[diagnostic_source]
        source: GraphEngineError,
    },

    #[error("failed to join {left} to {right}")]
    Join {
        left: Site,
        right: Site,
        #[source]
        #[diagnostic_source]
        source: GraphEngineError,
    },

    #[error("failed to close the ring along {link}")]
    Ring {
        link: Linkage,
        #[source]
        #[diagnostic_source]
        source: GraphEngineError,
    },

    #[error("failed to write out the assembled structure")]
    Write {
        #[source]
        #[diagnostic_source]
        source: GraphEngineError,
    },
}

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum NotationErrorKind {
    #[diagnostic(help("HELM peptides start with a polymer id like PEPTIDE1"))]
    #[error("expected a polymer id")]
    ExpectedPolymerId,

    #[error("expected a monomer, either as a single character, or as a [bracketed] symbol")]
    ExpectedMonomer,

    #[error("expected '{0}' to open a list of monomers")]
    ExpectedOpening(char),

    #[diagnostic(help("you've probably forgotten to close an earlier '{{' or '['"))]
    #[error("expected '{0}' to close the opening bracket")]
    ExpectedClosing(char),

    #[diagnostic(help("connections are written like PEPTIDE1,PEPTIDE1,1:R1-6:R2"))]
    #[error("expected a connection")]
    ExpectedConnection,

    #[error("expected an attachment point like 3:R2")]
    ExpectedSite,

    #[error("expected a positive integer")]
    ExpectedInteger,

    #[diagnostic(help(
        "this is an internal error that you shouldn't ever see! If you have gotten this error, \
        then please report it as a bug!"
    ))]
    #[error("internal `nom` error: {0:?}")]
    NomError(ErrorKind),

    #[diagnostic(help(
        "check the unparsed region for errors, or remove it from the rest of the HELM string"
    ))]
    #[error("could not interpret the full input as a HELM peptide")]
    Incomplete,
}

impl LabeledErrorKind for NotationErrorKind {
    fn label(&self) -> Option<&'static str> {
        Some(match self {
            Self::ExpectedPolymerId => "expected polymer id",
            Self::ExpectedMonomer => "expected monomer",
            Self::ExpectedOpening(_) => "expected opening bracket",
            Self::ExpectedClosing(_) => "unclosed bracket",
            Self::ExpectedConnection => "expected connection",
            Self::ExpectedSite => "expected attachment point",
            Self::ExpectedInteger => "expected integer",
            Self::Incomplete => "input was valid up until this point",
            Self::NomError(_) => "the region that triggered this bug!",
        })
    }
}

impl<'a> FromExternalError<'a, ParseIntError> for NotationErrorKind {
    fn from_external_error(input: &'a str, _: ParseIntError) -> LabeledParseError<'a, Self> {
        LabeledParseError::new(input, Self::ExpectedInteger)
    }
}

impl From<ErrorKind> for NotationErrorKind {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::Eof => Self::Incomplete,
            kind => Self::NomError(kind),
        }
    }
}

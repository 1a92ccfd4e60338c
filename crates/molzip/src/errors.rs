use miette::Diagnostic;
use nom::error::ErrorKind;
use nom_miette::{FromExternalError, LabeledError, LabeledErrorKind, LabeledParseError};
use thiserror::Error;

use crate::Site;

pub type Result<T, E = GraphEngineError> = std::result::Result<T, E>;

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum GraphEngineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Smiles(#[from] LabeledError<SmilesErrorKind>),

    #[error("the attachment point {0} is labelled more than once")]
    DuplicateAttachment(Site),

    #[error("the attachment point {0} could not be found in the fragment")]
    MissingAttachment(Site),

    #[diagnostic(help("attachment dummies like [*:1] must be bonded to exactly one other atom"))]
    #[error("the attachment point {0} is not a terminal dummy atom")]
    NotTerminal(Site),

    #[diagnostic(help(
        "a dummy that starts a fragment must be followed directly by its neighbour, like [*:1]NC, not by a branch \
        or ring closure"
    ))]
    #[error("the layout around attachment point {0} is not supported")]
    UnsupportedAttachment(Site),

    #[error("the attachment points {0} and {1} are bonded directly to each other")]
    AdjacentAttachments(Site, Site),

    #[error("the attachment points {0} and {1} sit on the same atom, so bonding them would form a self-loop")]
    SharedNeighbour(Site, Site),

    #[error("the attachment points {0} and {1} carry conflicting bond orders")]
    BondMismatch(Site, Site),

    #[error("every ring-closure label from 1 to 99 is already open at this point of the structure")]
    RingLabelsExhausted,

    #[error("the ring-closure label {0} is opened but never closed")]
    UnclosedRing(u8),

    #[error("malformed structure: {0}")]
    Malformed(&'static str),

    #[diagnostic(help("substituents are written as the inside of a bracket atom, like H or OH"))]
    #[error("the capping substituent {0:?} is not a valid bracket atom")]
    InvalidSubstituent(String),

    #[error("the attachment point {0} was never capped or bonded")]
    DanglingAttachment(Site),

    #[error("the assembled structure is split into {0} disconnected pieces")]
    Disconnected(usize),
}

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum SmilesErrorKind {
    #[diagnostic(help("attachment points are numbered [*:1], [*:2], or [*:3]"))]
    #[error("the attachment label {0} is not one of 1, 2, or 3")]
    UnknownAttachmentLabel(String),

    #[diagnostic(help("you've probably forgotten to close an earlier '[' bracket"))]
    #[error("expected ']' to close a bracket atom")]
    ExpectedBracketEnd,

    #[diagnostic(help(
        "this is an internal error that you shouldn't ever see! If you have gotten this error, \
        then please report it as a bug!"
    ))]
    #[error("internal `nom` error: {0:?}")]
    NomError(ErrorKind),

    #[diagnostic(help(
        "only the organic subset, bracket atoms, bonds, branches, ring closures, and '.' are understood"
    ))]
    #[error("could not interpret the full input as a SMILES string")]
    Incomplete,
}

impl LabeledErrorKind for SmilesErrorKind {
    fn label(&self) -> Option<&'static str> {
        Some(match self {
            Self::UnknownAttachmentLabel(_) => "unknown label",
            Self::ExpectedBracketEnd => "expected ']'",
            Self::Incomplete => "input was valid up until this point",
            Self::NomError(_) => "the region that triggered this bug!",
        })
    }
}

impl<'a> FromExternalError<'a, Self> for SmilesErrorKind {
    const FATAL: bool = true;

    fn from_external_error(input: &'a str, error: Self) -> LabeledParseError<'a, Self> {
        LabeledParseError::new(input, error)
    }
}

impl From<ErrorKind> for SmilesErrorKind {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::Eof => Self::Incomplete,
            kind => Self::NomError(kind),
        }
    }
}

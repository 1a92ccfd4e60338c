use knus::span::Span;
use miette::{Diagnostic, LabeledSpan, NamedSource};
use molzip::{AttachmentId, GraphEngineError};
use thiserror::Error;

use crate::MonomerKind;

#[derive(Debug, Diagnostic, Error)]
pub enum LibraryLoadError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] knus::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Invalid(#[from] InvalidLibrary),
}

#[derive(Debug, Error)]
#[error("failed to validate monomer library file")]
pub struct InvalidLibrary {
    kdl: NamedSource<String>,
    #[source]
    kind: LibraryErrorKind,
}

impl InvalidLibrary {
    #[must_use]
    pub const fn kind(&self) -> &LibraryErrorKind {
        &self.kind
    }
}

// NOTE: The labels depend on the variant of `self.kind`, so this can't be derived
impl Diagnostic for InvalidLibrary {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.kdl)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.kind.labels().into_iter().map(|(s, l)| {
            LabeledSpan::new_with_span(Some(l.to_owned()), *s)
        })))
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        Some(&self.kind)
    }
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum LibraryErrorKind {
    #[error("the monomer symbol {2:?} has already been defined")]
    #[diagnostic(help("every monomer needs its own HELM symbol"))]
    DuplicateSymbol(Span, Span, String),

    #[error("the MAP token {2:?} has already been assigned to another monomer")]
    #[diagnostic(help("two monomers sharing a MAP token can never be told apart when reading MAP"))]
    DuplicateToken(Span, Span, String),

    #[error("the monomer {1:?} has an empty {2}")]
    Blank(Span, String, &'static str),

    #[error("the {2} {1:?} is missing its {3} attachment")]
    #[diagnostic(help("residues need R1 and R2, N-terminal caps need R2, and C-terminal caps need R1"))]
    MissingAttachment(Span, String, MonomerKind, AttachmentId),

    #[error("the attachment {1:?} is not one of R1, R2, or R3")]
    UnknownAttachment(Span, String),

    #[error("the attachment {2} has already been declared")]
    DuplicateAttachment(Span, Span, AttachmentId),

    #[error("the cap {1:?} is not a valid substituent")]
    #[diagnostic(help("caps are written as the inside of a bracket atom, like H or OH"))]
    InvalidCap(Span, String),

    #[error("the fragment SMILES could not be loaded")]
    InvalidFragment(
        Span,
        #[source]
        #[diagnostic_source]
        GraphEngineError,
    ),

    #[error("the fragment has a [*:{}] dummy, but no {1} attachment is declared", .1.number())]
    #[diagnostic(help("declare the attachment along with its cap, or remove the dummy from the SMILES"))]
    UndeclaredDummy(Span, AttachmentId),

    #[error("the attachment {1} is declared, but the fragment has no [*:{}] dummy", .1.number())]
    MissingDummy(Span, AttachmentId),
}

impl LibraryErrorKind {
    fn labels(&self) -> Vec<(&Span, &'static str)> {
        match self {
            Self::DuplicateSymbol(s1, s2, _)
            | Self::DuplicateToken(s1, s2, _)
            | Self::DuplicateAttachment(s1, s2, _) => {
                vec![(s1, "first defined here"), (s2, "then again here")]
            }
            Self::Blank(s, _, _) => vec![(s, "blank value")],
            Self::MissingAttachment(s, _, _, _) => vec![(s, "incomplete monomer")],
            Self::UnknownAttachment(s, _) => vec![(s, "unknown attachment")],
            Self::InvalidCap(s, _) => vec![(s, "invalid cap")],
            Self::InvalidFragment(s, _) => vec![(s, "invalid fragment")],
            Self::UndeclaredDummy(s, _) => vec![(s, "undeclared dummy")],
            Self::MissingDummy(s, _) => vec![(s, "no matching dummy")],
        }
    }

    pub(crate) fn finalize(self, file_name: impl AsRef<str>, kdl: impl AsRef<str>) -> InvalidLibrary {
        let kdl = NamedSource::new(file_name, kdl.as_ref().to_owned());
        InvalidLibrary { kdl, kind: self }
    }
}

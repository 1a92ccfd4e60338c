//! Labelled `miette` diagnostics for `nom` parsers over `&str`
//!
//! Parsers return [`LabeledParseError`]s while running; [`final_parser`] turns the last of those into a
//! [`LabeledError`] that owns a copy of the input and can be rendered with source snippets.

// Standard Library Imports
use std::fmt;

// External Crate Imports
use ahash::HashMap;
use miette::{Diagnostic, LabeledSpan, SourceCode, SourceSpan};
use nom::{
    Err, Finish, IResult, Parser,
    combinator::{all_consuming, complete},
    error::{ErrorKind, ParseError},
};
use thiserror::Error;

// Public API ==========================================================================================================

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{tree}")]
pub struct LabeledError<E: LabeledErrorKind> {
    full_input: String,
    labels: Vec<LabeledSpan>,
    tree: ErrorTree<E>,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ErrorTree<E: LabeledErrorKind> {
    #[error("{kind}")]
    Node {
        kind: E,
        #[source]
        source: Option<Box<LabeledError<E>>>,
    },
    #[error("attempted {} parse branches unsuccessfully", .0.len())]
    Branch(Vec<LabeledError<E>>),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LabeledParseError<'a, E> {
    input: &'a str,
    length: usize,
    tree: ParseTree<'a, E>,
}

pub trait LabeledErrorKind: Diagnostic + Clone + Eq + From<ErrorKind> {
    fn label(&self) -> Option<&'static str> {
        None
    }
}

pub trait FromExternalError<'a, X>: LabeledErrorKind {
    const FATAL: bool = false;

    fn from_external_error(input: &'a str, error: X) -> LabeledParseError<'a, Self>;
}

impl<E: LabeledErrorKind> LabeledError<E> {
    #[must_use]
    pub const fn tree(&self) -> &ErrorTree<E> {
        &self.tree
    }

    /// The innermost error kind along the first branch of the tree
    #[must_use]
    pub fn root_kind(&self) -> &E {
        match &self.tree {
            ErrorTree::Node {
                source: Some(source),
                ..
            } => source.root_kind(),
            ErrorTree::Node { kind, .. } => kind,
            ErrorTree::Branch(alternatives) => alternatives[0].root_kind(),
        }
    }
}

impl<'a, E: LabeledErrorKind> LabeledParseError<'a, E> {
    pub const fn new(input: &'a str, kind: E) -> Self {
        Self {
            input,
            length: 0,
            tree: ParseTree::Node { kind, source: None },
        }
    }

    #[must_use]
    pub fn wrapping(input: &'a str, kind: E, source: Self) -> Self {
        Self {
            input,
            length: 0,
            tree: ParseTree::Node {
                kind,
                source: Some(Box::new(source)),
            },
        }
    }

    /// Widens the labelled region to cover `length` bytes of the input
    #[must_use]
    pub const fn spanning(mut self, length: usize) -> Self {
        self.length = length;
        self
    }
}

pub fn final_parser<'a, O, P, E>(parser: P) -> impl FnMut(&'a str) -> Result<O, LabeledError<E>>
where
    E: LabeledErrorKind,
    P: Parser<&'a str, O, LabeledParseError<'a, E>>,
{
    let mut parser = all_consuming(complete(parser));
    move |input| {
        parser
            .parse(input)
            .finish()
            .map(|(_, output)| output)
            .map_err(|e| e.into_labeled_error(input))
    }
}

pub fn map_res<'a, O1, O2, X, E, P, F>(
    mut parser: P,
    mut f: F,
) -> impl FnMut(&'a str) -> IResult<&'a str, O2, LabeledParseError<'a, E>>
where
    E: FromExternalError<'a, X>,
    P: Parser<&'a str, O1, LabeledParseError<'a, E>>,
    F: FnMut(O1) -> Result<O2, X>,
{
    move |input| {
        let (rest, output) = parser.parse(input)?;
        f(output).map(|mapped| (rest, mapped)).map_err(|x| {
            let consumed = input.len() - rest.len();
            let error = E::from_external_error(input, x).spanning(consumed);
            if E::FATAL {
                Err::Failure(error)
            } else {
                Err::Error(error)
            }
        })
    }
}

/// Keeps the error from `parser`, but reports it as the cause of a higher-level `kind`
pub fn wrap_err<'a, O, P, E>(
    mut parser: P,
    kind: E,
) -> impl FnMut(&'a str) -> IResult<&'a str, O, LabeledParseError<'a, E>>
where
    E: LabeledErrorKind,
    P: Parser<&'a str, O, LabeledParseError<'a, E>>,
{
    move |input| {
        parser
            .parse(input)
            .map_err(|e| e.map(|e| LabeledParseError::wrapping(input, kind.clone(), e)))
    }
}

/// Throws away the error from `parser` and replaces it with `kind`
pub fn expect<'a, O, P, E>(
    mut parser: P,
    kind: E,
) -> impl FnMut(&'a str) -> IResult<&'a str, O, LabeledParseError<'a, E>>
where
    E: LabeledErrorKind,
    P: Parser<&'a str, O, LabeledParseError<'a, E>>,
{
    move |input| {
        parser
            .parse(input)
            .map_err(|e| e.map(|_| LabeledParseError::new(input, kind.clone())))
    }
}

// Private Types and Conversions =======================================================================================

#[derive(Debug, Clone, Eq, PartialEq)]
enum ParseTree<'a, E> {
    Node {
        kind: E,
        source: Option<Box<LabeledParseError<'a, E>>>,
    },
    Branch(Vec<LabeledParseError<'a, E>>),
}

impl<E: LabeledErrorKind> LabeledParseError<'_, E> {
    fn into_labeled_error(self, full_input: &str) -> LabeledError<E> {
        let mut error = self.convert(full_input);
        error.bubble_labels();
        error
    }

    fn convert(self, full_input: &str) -> LabeledError<E> {
        let span = self.span_within(full_input);
        // NOTE: The trailing space lets labels point just past the end of the input
        let padded_input = format!("{full_input} ");
        match self.tree {
            ParseTree::Node { kind, source } => {
                let labels = kind
                    .label()
                    .map(|label| LabeledSpan::new_with_span(Some(label.to_owned()), span))
                    .into_iter()
                    .collect();
                let source = source.map(|e| Box::new(e.convert(full_input)));
                LabeledError {
                    full_input: padded_input,
                    labels,
                    tree: ErrorTree::Node { kind, source },
                }
            }
            ParseTree::Branch(alternatives) => LabeledError {
                full_input: padded_input,
                labels: Vec::new(),
                tree: ErrorTree::Branch(
                    alternatives
                        .into_iter()
                        .map(|e| e.convert(full_input))
                        .collect(),
                ),
            },
        }
    }

    fn span_within(&self, full_input: &str) -> SourceSpan {
        // SAFETY: every `input` slice handed to a parser is a suffix of the `full_input` given to `final_parser`,
        // so the address difference is the byte offset of this error
        let offset = (self.input.as_ptr() as usize).saturating_sub(full_input.as_ptr() as usize);
        SourceSpan::from(offset..offset + self.length)
    }
}

impl<E: LabeledErrorKind> LabeledError<E> {
    fn bubble_labels(&mut self) {
        if !self.labels.is_empty() {
            return;
        }
        match &mut self.tree {
            ErrorTree::Node {
                source: Some(child),
                ..
            } => {
                child.bubble_labels();
                self.labels = std::mem::take(&mut child.labels);
            }
            ErrorTree::Branch(alternatives) => {
                let labels = alternatives.iter_mut().flat_map(|child| {
                    child.bubble_labels();
                    std::mem::take(&mut child.labels)
                });
                self.labels = merge_labels(labels);
            }
            ErrorTree::Node { source: None, .. } => (),
        }
    }
}

fn merge_labels(labels: impl IntoIterator<Item = LabeledSpan>) -> Vec<LabeledSpan> {
    let mut spans: Vec<SourceSpan> = Vec::new();
    let mut texts: HashMap<SourceSpan, Vec<String>> = HashMap::default();
    for labeled_span in labels {
        let span = *labeled_span.inner();
        let Some(label) = labeled_span.label() else {
            continue;
        };
        let entry = texts.entry(span).or_insert_with(|| {
            spans.push(span);
            Vec::new()
        });
        if !entry.iter().any(|existing| existing == label) {
            entry.push(label.to_owned());
        }
    }
    spans
        .into_iter()
        .map(|span| LabeledSpan::new_with_span(Some(texts[&span].join(" or ")), span))
        .collect()
}

impl<E: LabeledErrorKind> Diagnostic for LabeledError<E> {
    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.full_input)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.tree {
            ErrorTree::Node { kind, .. } => kind.help(),
            ErrorTree::Branch(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.labels.iter().cloned()))
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        match &self.tree {
            ErrorTree::Branch(alternatives) => {
                Some(Box::new(alternatives.iter().map(|e| e as &dyn Diagnostic)))
            }
            ErrorTree::Node { .. } => None,
        }
    }

    fn diagnostic_source(&self) -> Option<&dyn Diagnostic> {
        match &self.tree {
            ErrorTree::Node {
                source: Some(source),
                ..
            } => Some(&**source),
            ErrorTree::Node { .. } | ErrorTree::Branch(_) => None,
        }
    }
}

impl<'a, E: LabeledErrorKind> ParseError<&'a str> for LabeledParseError<'a, E> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self::new(input, kind.into())
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    fn or(self, other: Self) -> Self {
        let input = self.input;
        let alternatives = match self.tree {
            ParseTree::Branch(mut alternatives) => {
                alternatives.push(other);
                alternatives
            }
            node @ ParseTree::Node { .. } => vec![
                Self {
                    tree: node,
                    ..self
                },
                other,
            ],
        };
        Self {
            input,
            length: 0,
            tree: ParseTree::Branch(alternatives),
        }
    }
}

// Module Tests ========================================================================================================

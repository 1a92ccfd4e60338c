//! Reading and writing single-chain HELM, like `PEPTIDE1{L.L.L.[dL].P.Y}$PEPTIDE1,PEPTIDE1,1:R1-6:R2$$$`

// Standard Library Imports
use std::str::FromStr;

// External Crate Imports
use itertools::Itertools;
use molzip::{AttachmentId, Site};
use monomers::{MonomerKind, MonomerLibrary};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{char, digit1},
    combinator::{cut, map, opt, peek, recognize, value},
    multi::{count, many0, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
};
use nom_miette::{LabeledParseError, expect, final_parser, map_res, wrap_err};
use tracing::trace;

// Local Crate Imports
use crate::{
    Error, Linkage, LinkageError, Notation, NotationErrorKind, Peptide, Result, Unit,
    errors::NotationErrorKind as Kind,
};

// Public API ==========================================================================================================

/// Reads a single `PEPTIDE` polymer, resolving every symbol against `library`
///
/// Bracketed and bare symbols must name a library monomer. Curly-brace tags are kept as text: `{nt:...}` and
/// `{ct:...}` become terminal modifications, and anything else is carried through the chain as a literal.
///
/// # Errors
///
/// Fails if the text isn't valid HELM, if a symbol isn't in the library, or if the connection section holds more than
/// one link, a link to another polymer, or a link that doesn't fit the chain.
pub fn parse<'l>(library: &'l MonomerLibrary, helm: &str) -> Result<Peptide<'l>> {
    let HelmPeptide {
        id,
        elements,
        connections,
    } = final_parser(helm_peptide)(helm.trim())?;

    let mut sequence = Vec::new();
    let mut n_term_mods = Vec::new();
    let mut c_term_mods = Vec::new();
    for element in elements {
        match element {
            Element::Symbol(symbol) => {
                let monomer = library.by_symbol(symbol).ok_or_else(|| Error::UnknownMonomer {
                    notation: Notation::Helm,
                    token: symbol.to_owned(),
                })?;
                sequence.push(Unit::Monomer(monomer));
            }
            Element::Tag(tag) => match MonomerKind::of_token(tag) {
                MonomerKind::NTerminalCap => n_term_mods.push(tag.to_owned()),
                MonomerKind::CTerminalCap => c_term_mods.push(tag.to_owned()),
                MonomerKind::Residue => sequence.push(Unit::Literal(tag.to_owned())),
            },
        }
    }

    let link = match connections.as_slice() {
        [] => None,
        [connection] => Some(connection.to_linkage(id)?),
        _ => return Err(LinkageError::MultipleLinks(connections.len()).into()),
    };

    let peptide = Peptide::new(sequence, n_term_mods, c_term_mods, link)?;
    trace!(id, length = peptide.len(), "parsed HELM peptide");
    Ok(peptide)
}

/// Writes `peptide` as the polymer `PEPTIDE{id}`, bracketing every symbol longer than a single character
#[must_use]
pub fn write(peptide: &Peptide, id: u32) -> String {
    let sequence = peptide.sequence().iter().map(|unit| match unit {
        Unit::Monomer(monomer) if monomer.symbol.chars().count() > 1 => format!("[{}]", monomer.symbol),
        Unit::Monomer(monomer) => monomer.symbol.clone(),
        Unit::Literal(text) if is_tag(text) => text.clone(),
        Unit::Literal(text) => format!("{{{text}}}"),
    });
    let elements = peptide
        .n_term_mods()
        .iter()
        .cloned()
        .chain(sequence)
        .chain(peptide.c_term_mods().iter().cloned())
        .join(".");

    match peptide.link() {
        Some(link) => format!("PEPTIDE{id}{{{elements}}}$PEPTIDE{id},PEPTIDE{id},{link}$$$"),
        None => format!("PEPTIDE{id}{{{elements}}}$$$$"),
    }
}

// Literals that aren't already a `{...}` tag are wrapped in one, since bare text would be read back as a symbol
fn is_tag(text: &str) -> bool {
    text.starts_with('{') && text.find('}') == Some(text.len() - 1)
}

// Private Types =======================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
struct HelmPeptide<'a> {
    id: u32,
    elements: Vec<Element<'a>>,
    connections: Vec<Connection>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Element<'a> {
    Symbol(&'a str),
    Tag(&'a str),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct Connection {
    from: u32,
    to: u32,
    source: (usize, u32),
    target: (usize, u32),
}

impl Connection {
    fn to_linkage(self, id: u32) -> Result<Linkage, LinkageError> {
        if let Some(found) = [self.from, self.to].into_iter().find(|&p| p != id) {
            return Err(LinkageError::ForeignPolymer { expected: id, found });
        }
        let site = |(position, number): (usize, u32)| {
            AttachmentId::from_number(number)
                .map(|attachment| Site::new(position, attachment))
                .ok_or(LinkageError::UnknownAttachment(number))
        };
        Ok(Linkage::new(site(self.source)?, site(self.target)?))
    }
}

// Private Parsers =====================================================================================================

type ParseResult<'a, O> = IResult<&'a str, O, LabeledParseError<'a, NotationErrorKind>>;

/// HELM = Polymer , [ "$" , [ Connections ] , 3 * ( "$" , Section ) ] ;
fn helm_peptide(i: &str) -> ParseResult<HelmPeptide> {
    let no_connections = value(Vec::new(), peek(char('$')));
    let links = alt((no_connections, cut(connections)));
    let sections = count(preceded(char('$'), section), 3);
    let tail = preceded(char('$'), terminated(links, sections));
    map(pair(polymer, opt(tail)), |((id, elements), connections)| HelmPeptide {
        id,
        elements,
        connections: connections.unwrap_or_default(),
    })(i)
}

/// Polymer = Polymer Id , "{" , Element , { "." , Element } , "}" ;
fn polymer(i: &str) -> ParseResult<(u32, Vec<Element>)> {
    let open = expect(char('{'), Kind::ExpectedOpening('{'));
    let close = cut(expect(char('}'), Kind::ExpectedClosing('}')));
    let rest = many0(preceded(char('.'), cut(element)));
    let elements = map(pair(element, rest), |(first, mut rest)| {
        rest.insert(0, first);
        rest
    });
    pair(polymer_id, delimited(open, elements, close))(i)
}

/// Polymer Id = "PEPTIDE" , Integer ;
fn polymer_id(i: &str) -> ParseResult<u32> {
    expect(preceded(tag("PEPTIDE"), integer), Kind::ExpectedPolymerId)(i)
}

/// Element = "[" , Symbol Text , "]" | Tag | Symbol Char ;
fn element(i: &str) -> ParseResult<Element> {
    // NOTE: Every opening character is expected as a monomer, so a failed element reports a single, merged label
    let bracketed = preceded(
        expect(char('['), Kind::ExpectedMonomer),
        cut(terminated(is_not("]"), expect(char(']'), Kind::ExpectedClosing(']')))),
    );
    let symbol = expect(is_not("[]{}.$|, \t"), Kind::ExpectedMonomer);
    alt((
        map(bracketed, Element::Symbol),
        map(curly_tag, Element::Tag),
        map(symbol, Element::Symbol),
    ))(i)
}

/// Tag = "{" , Tag Text , "}" ;
fn curly_tag(i: &str) -> ParseResult<&str> {
    let close = expect(char('}'), Kind::ExpectedClosing('}'));
    let body = cut(pair(is_not("}"), close));
    recognize(preceded(expect(char('{'), Kind::ExpectedMonomer), body))(i)
}

/// Connections = Connection , { "|" , Connection } ;
fn connections(i: &str) -> ParseResult<Vec<Connection>> {
    separated_list1(char('|'), connection)(i)
}

/// Connection = Polymer Id , "," , Polymer Id , "," , Site , "-" , Site ;
fn connection(i: &str) -> ParseResult<Connection> {
    let polymers = separated_pair(polymer_id, char(','), polymer_id);
    let sites = separated_pair(site, char('-'), site);
    let parser = map(
        separated_pair(polymers, char(','), sites),
        |((from, to), (source, target))| Connection {
            from,
            to,
            source,
            target,
        },
    );
    wrap_err(parser, Kind::ExpectedConnection)(i)
}

/// Site = Integer , ":" , "R" , Integer ;
fn site(i: &str) -> ParseResult<(usize, u32)> {
    let parser = tuple((integer, char(':'), char('R'), integer));
    wrap_err(map(parser, |(position, _, _, number)| (position, number)), Kind::ExpectedSite)(i)
}

/// Section = { ? any character except "$" ? } ;
fn section(i: &str) -> ParseResult<&str> {
    take_while(|c| c != '$')(i)
}

/// Integer = digit , { digit } ;
fn integer<T: FromStr<Err = std::num::ParseIntError>>(i: &str) -> ParseResult<T> {
    map_res(expect(digit1, Kind::ExpectedInteger), str::parse)(i)
}

// Module Tests ========================================================================================================

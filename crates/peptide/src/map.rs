//! Reading and writing MAP, like `{nnr:ABU}G{nnm:NMX}L{nnm:NMX}V{cyc:N-C}`

// Standard Library Imports
use std::{mem, sync::LazyLock};

// External Crate Imports
use monomers::{MonomerKind, MonomerLibrary};
use regex::{Captures, Regex};
use tracing::trace;

// Local Crate Imports
use crate::{Convention, CycTag, Error, LinkageError, Peptide, Result, Unit};

// Public API ==========================================================================================================

/// Reads a MAP string by greedily matching the longest library token at each position
///
/// Before scanning, the `{cyc:...}` tag is pulled out, and `{nt:...}` tags are moved to the front of the chain.
/// Terminal tags that aren't library tokens are kept as opaque modifications, and any other text that doesn't match a
/// token is carried through as a literal.
///
/// # Errors
///
/// Fails if there is more than one `{cyc:...}` tag, if that tag can't be read or doesn't fit the chain, or if the
/// string holds no monomers or literals at all.
pub fn parse<'l>(library: &'l MonomerLibrary, convention: Convention, map: &str) -> Result<Peptide<'l>> {
    let map = map.trim();

    let tags: Vec<CycTag> = CYC_TAG
        .captures_iter(map)
        .map(|c| c[1].parse())
        .collect::<Result<_, _>>()?;
    let tag = match tags.as_slice() {
        [] => None,
        &[tag] => Some(tag),
        _ => return Err(LinkageError::MultipleLinks(tags.len()).into()),
    };
    let map = CYC_TAG.replace_all(map, "");

    let mut sequence = Vec::new();
    let mut n_term_mods = Vec::new();
    for nt in N_TERMINAL_TAG.find_iter(&map).map(|m| m.as_str()) {
        match library.by_token(nt) {
            Some(monomer) => sequence.push(Unit::Monomer(monomer)),
            None => n_term_mods.push(nt.to_owned()),
        }
    }
    let map = N_TERMINAL_TAG.replace_all(&map, "");

    let mut c_term_mods = Vec::new();
    let map = C_TERMINAL_TAG.replace_all(&map, |c: &Captures| {
        let ct = &c[0];
        if library.by_token(ct).is_some() {
            ct.to_owned()
        } else {
            c_term_mods.push(ct.to_owned());
            String::new()
        }
    });

    scan(library, &map, &mut sequence);
    if sequence.is_empty() {
        return Err(Error::EmptyPeptide);
    }

    let length = sequence.iter().filter(|u| matches!(u, Unit::Monomer(_))).count();
    let link = tag.map(|tag| tag.to_linkage(length, convention)).transpose()?;

    let peptide = Peptide::new(sequence, n_term_mods, c_term_mods, link)?;
    trace!(length, literals = peptide.literals().count(), "parsed MAP peptide");
    Ok(peptide)
}

/// Writes `peptide` as MAP: residue tokens and literals in order, then N-terminal caps and tags, then C-terminal caps
/// and tags, and finally the `{cyc:...}` tag
#[must_use]
pub fn write(peptide: &Peptide, convention: Convention) -> String {
    let of_kind = |kind: MonomerKind| {
        peptide
            .sequence()
            .iter()
            .filter(move |&unit| unit_kind(unit) == kind)
            .map(unit_token)
    };
    let n_term_mods = peptide.n_term_mods().iter().map(String::as_str);
    let c_term_mods = peptide.c_term_mods().iter().map(String::as_str);

    let mut map: String = of_kind(MonomerKind::Residue)
        .chain(of_kind(MonomerKind::NTerminalCap))
        .chain(n_term_mods)
        .chain(of_kind(MonomerKind::CTerminalCap))
        .chain(c_term_mods)
        .collect();

    if let Some(link) = peptide.link() {
        let tag = CycTag::from_linkage(link, peptide.len(), convention);
        map.push_str(&format!("{{cyc:{tag}}}"));
    }
    map
}

// Private Helper Code =================================================================================================

// SAFETY: These patterns are fixed and known to be valid
static CYC_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{cyc:([^}]*)\}").unwrap());
static N_TERMINAL_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{nt:[^}]+\}").unwrap());
static C_TERMINAL_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{ct:[^}]+\}").unwrap());

fn scan<'l>(library: &'l MonomerLibrary, mut rest: &str, sequence: &mut Vec<Unit<'l>>) {
    let mut literal = String::new();
    while let Some(c) = rest.chars().next() {
        if let Some(monomer) = library.scan_order().find(|m| rest.starts_with(&m.token)) {
            if !literal.is_empty() {
                sequence.push(Unit::Literal(mem::take(&mut literal)));
            }
            sequence.push(Unit::Monomer(monomer));
            rest = &rest[monomer.token.len()..];
        } else {
            literal.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    if !literal.is_empty() {
        sequence.push(Unit::Literal(literal));
    }
}

fn unit_kind(unit: &Unit) -> MonomerKind {
    match unit {
        Unit::Monomer(monomer) => monomer.kind,
        Unit::Literal(_) => MonomerKind::Residue,
    }
}

fn unit_token<'a>(unit: &'a Unit) -> &'a str {
    match unit {
        Unit::Monomer(monomer) => &monomer.token,
        Unit::Literal(text) => text,
    }
}

// Module Tests ========================================================================================================

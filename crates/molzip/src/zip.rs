// External Crate Imports
use ahash::{HashMap, HashSet};
use tracing::trace;

// Local Crate Imports
use crate::{
    GraphEngine, GraphEngineError, Result, Site,
    fragment::{Atom, Bond, Fragment, Token},
    layout::Layout,
};

// Public API ==========================================================================================================

/// A [`GraphEngine`] that edits SMILES text directly, bonding attachment points with ring-closure labels
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct SmilesEngine;

impl GraphEngine for SmilesEngine {
    type Fragment = Fragment;

    fn fragment(&self, smiles: &str, position: usize) -> Result<Fragment> {
        Fragment::new(smiles, position)
    }

    fn cap_attachment(&self, mut fragment: Fragment, site: Site, substituent: &str) -> Result<Fragment> {
        if substituent.is_empty() || substituent.contains(['[', ']']) {
            return Err(GraphEngineError::InvalidSubstituent(substituent.to_owned()));
        }
        let index = fragment.find(site)?;
        fragment.tokens[index] = Token::Atom(Atom::Bracket(substituent.to_owned()));
        Ok(fragment)
    }

    fn join_fragments(&self, left: Fragment, left_site: Site, right: Fragment, right_site: Site) -> Result<Fragment> {
        left.find(left_site)?;
        right.find(right_site)?;

        let mut tokens = left.tokens;
        tokens.push(Token::Dot);
        tokens.extend(right.tokens);
        zip(tokens, left_site, right_site)
    }

    fn close_ring(&self, fragment: Fragment, a: Site, b: Site) -> Result<Fragment> {
        zip(fragment.tokens, a, b)
    }

    fn write(&self, fragment: &Fragment) -> Result<String> {
        if let Some(site) = fragment.attachments().next() {
            return Err(GraphEngineError::DanglingAttachment(site));
        }
        match fragment.component_count()? {
            1 => Ok(fragment.to_string()),
            pieces => Err(GraphEngineError::Disconnected(pieces)),
        }
    }
}

// Zipping Attachment Points ===========================================================================================

/// What needs to change to remove a dummy atom and hand its bond over to its neighbour
#[derive(Debug)]
struct Detached {
    neighbour: usize,
    bond: Option<Bond>,
    removed: Vec<usize>,
}

enum Slot {
    Kept(Token),
    Closure(Option<Bond>),
}

/// Removes the dummies for `a` and `b`, then bonds their neighbours with a fresh ring-closure label
fn zip(tokens: Vec<Token>, a: Site, b: Site) -> Result<Fragment> {
    let layout = Layout::new(&tokens)?;
    let fragment = Fragment { tokens };
    let (index_a, index_b) = (fragment.find(a)?, fragment.find(b)?);
    let tokens = fragment.tokens;

    let detached_a = detach(&tokens, &layout, index_a, a)?;
    let detached_b = detach(&tokens, &layout, index_b, b)?;
    if detached_a.neighbour == index_b || detached_b.neighbour == index_a {
        return Err(GraphEngineError::AdjacentAttachments(a, b));
    }
    if detached_a.neighbour == detached_b.neighbour {
        return Err(GraphEngineError::SharedNeighbour(a, b));
    }
    if let (Some(bond_a), Some(bond_b)) = (detached_a.bond, detached_b.bond) {
        let conflicting = !bond_a.is_directional() && !bond_b.is_directional() && bond_a != bond_b;
        if conflicting {
            return Err(GraphEngineError::BondMismatch(a, b));
        }
    }

    let removed: HashSet<usize> = detached_a
        .removed
        .iter()
        .chain(&detached_b.removed)
        .copied()
        .collect();
    let closures: HashMap<usize, Option<Bond>> = [&detached_a, &detached_b]
        .into_iter()
        .map(|d| (ring_run_end(&tokens, d.neighbour), d.bond))
        .collect();

    let mut slots = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.into_iter().enumerate() {
        if !removed.contains(&index) {
            slots.push(Slot::Kept(token));
        }
        if let Some(&bond) = closures.get(&index) {
            slots.push(Slot::Closure(bond));
        }
    }

    let label = free_label(&slots)?;
    trace!(%a, %b, label, "zipping attachment points");
    let tokens = slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Kept(token) => token,
            Slot::Closure(bond) => Token::Ring { bond, label },
        })
        .collect();

    let zipped = Fragment { tokens };
    Layout::new(&zipped.tokens)?;
    Ok(zipped)
}

fn detach(tokens: &[Token], layout: &Layout, index: usize, site: Site) -> Result<Detached> {
    if layout.degree(index) != 1 {
        return Err(GraphEngineError::NotTerminal(site));
    }
    let bond_at = |i: usize| match tokens[i] {
        Token::Bond(bond) => Some(bond),
        _ => None,
    };

    if let Some(link) = layout.link(index) {
        let mut removed = vec![index];
        removed.extend(link.bond);
        // A dummy alone in its branch takes the parentheses with it
        let first = link.bond.unwrap_or(index);
        let in_own_branch = first > 0
            && tokens[first - 1] == Token::Open
            && tokens.get(index + 1) == Some(&Token::Close);
        if in_own_branch {
            removed.extend([first - 1, index + 1]);
        }
        Ok(Detached {
            neighbour: link.atom,
            bond: link.bond.and_then(bond_at),
            removed,
        })
    } else {
        // The dummy starts its component, so its only neighbour is the atom written after it
        let (neighbour, link) = layout
            .successor(index)
            .ok_or(GraphEngineError::UnsupportedAttachment(site))?;
        if tokens.get(index + 1) == Some(&Token::Open) {
            return Err(GraphEngineError::UnsupportedAttachment(site));
        }
        let mut removed = vec![index];
        removed.extend(link.bond);
        Ok(Detached {
            neighbour,
            bond: link.bond.and_then(bond_at).map(Bond::reversed),
            removed,
        })
    }
}

/// The index of the last ring-closure token directly following the atom at `atom`
fn ring_run_end(tokens: &[Token], atom: usize) -> usize {
    let mut end = atom;
    while matches!(tokens.get(end + 1), Some(Token::Ring { .. })) {
        end += 1;
    }
    end
}

/// The lowest label that isn't open across the span between the two new ring-closure slots
fn free_label(slots: &[Slot]) -> Result<u8> {
    let mut closures = slots
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| matches!(slot, Slot::Closure(_)).then_some(i));
    let (Some(first), Some(second)) = (closures.next(), closures.next()) else {
        return Err(GraphEngineError::Malformed("expected exactly two ring-closure slots"));
    };
    let uses = |range: &[Slot], label: u8| {
        range
            .iter()
            .filter(|slot| matches!(slot, Slot::Kept(token) if token.is_ring(label)))
            .count()
    };
    (1..=99)
        .find(|&label| uses(&slots[..first], label) % 2 == 0 && uses(&slots[first..second], label) == 0)
        .ok_or(GraphEngineError::RingLabelsExhausted)
}

// Module Tests ========================================================================================================

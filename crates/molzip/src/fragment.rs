// Standard Library Imports
use std::fmt::{self, Display, Formatter};

// External Crate Imports
use ahash::HashMap;
use itertools::Itertools;
use nom_miette::final_parser;
use petgraph::{algo::connected_components, graph::UnGraph};

// Local Crate Imports
use crate::{
    GraphEngineError, Result, Site,
    layout::Layout,
    parser::smiles,
};

// Public API ==========================================================================================================

/// A tokenized SMILES string whose attachment dummies have been tagged with a chain position
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Fragment {
    pub(crate) tokens: Vec<Token>,
}

impl Fragment {
    pub fn new(smiles_text: &str, position: usize) -> Result<Self> {
        let tokens = final_parser(smiles(position))(smiles_text)?;
        let fragment = Self { tokens };

        if let Some(site) = fragment.attachments().duplicates().next() {
            return Err(GraphEngineError::DuplicateAttachment(site));
        }

        let layout = Layout::new(&fragment.tokens)?;
        for (index, site) in fragment.indexed_attachments() {
            if layout.degree(index) != 1 {
                return Err(GraphEngineError::NotTerminal(site));
            }
        }

        Ok(fragment)
    }

    pub fn attachments(&self) -> impl Iterator<Item = Site> + '_ {
        self.indexed_attachments().map(|(_, site)| site)
    }

    #[must_use]
    pub fn has_attachment(&self, site: Site) -> bool {
        self.attachments().contains(&site)
    }

    /// The molecular graph, with atoms labelled by their SMILES text. Attachment dummies are included as atoms.
    pub fn graph(&self) -> Result<UnGraph<String, ()>> {
        let layout = Layout::new(&self.tokens)?;
        let mut graph = UnGraph::default();
        let nodes: HashMap<_, _> = self
            .tokens
            .iter()
            .enumerate()
            .filter_map(|(index, token)| match token {
                Token::Atom(atom) => Some((index, graph.add_node(atom.to_string()))),
                _ => None,
            })
            .collect();
        for &(a, b) in layout.edges() {
            graph.add_edge(nodes[&a], nodes[&b], ());
        }
        Ok(graph)
    }

    pub fn component_count(&self) -> Result<usize> {
        Ok(connected_components(&self.graph()?))
    }

    pub(crate) fn indexed_attachments(&self) -> impl Iterator<Item = (usize, Site)> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .filter_map(|(index, token)| match token {
                Token::Atom(Atom::Attachment(site)) => Some((index, *site)),
                _ => None,
            })
    }

    pub(crate) fn find(&self, site: Site) -> Result<usize> {
        self.indexed_attachments()
            .find_map(|(index, s)| (s == site).then_some(index))
            .ok_or(GraphEngineError::MissingAttachment(site))
    }
}

impl Display for Fragment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.tokens.iter().try_for_each(|token| write!(f, "{token}"))
    }
}

// Tokens ==============================================================================================================

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Token {
    Atom(Atom),
    Bond(Bond),
    Ring { bond: Option<Bond>, label: u8 },
    Open,
    Close,
    Dot,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Atom {
    Organic(String),
    Bracket(String),
    Attachment(Site),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Bond {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    Up,
    Down,
}

impl Token {
    pub const fn is_ring(&self, label: u8) -> bool {
        matches!(self, Self::Ring { label: l, .. } if *l == label)
    }
}

impl Bond {
    pub const fn is_directional(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// The same bond, as seen from the atom at its other end
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            other => other,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atom) => write!(f, "{atom}"),
            Self::Bond(bond) => write!(f, "{bond}"),
            Self::Ring { bond, label } => {
                if let Some(bond) = bond {
                    write!(f, "{bond}")?;
                }
                if *label < 10 {
                    write!(f, "{label}")
                } else {
                    write!(f, "%{label:02}")
                }
            }
            Self::Open => write!(f, "("),
            Self::Close => write!(f, ")"),
            Self::Dot => write!(f, "."),
        }
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organic(symbol) => write!(f, "{symbol}"),
            Self::Bracket(inner) => write!(f, "[{inner}]"),
            Self::Attachment(site) => write!(f, "[*:{}]", site.attachment.number()),
        }
    }
}

impl Display for Bond {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Single => '-',
            Self::Double => '=',
            Self::Triple => '#',
            Self::Quadruple => '$',
            Self::Aromatic => ':',
            Self::Up => '/',
            Self::Down => '\\',
        };
        write!(f, "{symbol}")
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use crate::AttachmentId;

    use super::*;

    const TYROSINE: &str = "[*:1]N[C@@H](Cc1ccc(O)cc1)C([*:2])=O";

    #[test]
    fn round_trips_through_display() {
        for smiles in [TYROSINE, "O=C([*:2])[C@@H]1CCCN1[*:1]", "C=1%12CC/C=C\\C1CC%12"] {
            assert_eq!(Fragment::new(smiles, 1).unwrap().to_string(), smiles);
        }
    }

    #[test]
    fn attachments() {
        let tyrosine = Fragment::new(TYROSINE, 4).unwrap();
        let sites: Vec<_> = tyrosine.attachments().collect();
        assert_eq!(
            sites,
            [
                Site::new(4, AttachmentId::A1),
                Site::new(4, AttachmentId::A2)
            ]
        );
        assert!(tyrosine.has_attachment(Site::new(4, AttachmentId::A2)));
        assert!(!tyrosine.has_attachment(Site::new(4, AttachmentId::A3)));
        assert!(!tyrosine.has_attachment(Site::new(1, AttachmentId::A1)));
    }

    #[test]
    fn graph() {
        let tyrosine = Fragment::new(TYROSINE, 1).unwrap();
        let graph = tyrosine.graph().unwrap();
        // 12 heavy atoms and 2 dummies, with one extra edge closing the phenol ring
        assert_eq!(graph.node_count(), 14);
        assert_eq!(graph.edge_count(), 14);
        assert_eq!(tyrosine.component_count(), Ok(1));

        let salt = Fragment::new("[Na+].[Cl-]", 1).unwrap();
        assert_eq!(salt.component_count(), Ok(2));
    }

    #[test]
    fn invalid_fragments() {
        assert_eq!(
            Fragment::new("[*:1]CC[*:1]", 2),
            Err(GraphEngineError::DuplicateAttachment(Site::new(
                2,
                AttachmentId::A1
            )))
        );
        assert_eq!(
            Fragment::new("C[*:2]C", 2),
            Err(GraphEngineError::NotTerminal(Site::new(2, AttachmentId::A2)))
        );
        assert_eq!(
            Fragment::new("C1CC", 2),
            Err(GraphEngineError::UnclosedRing(1))
        );
        assert!(matches!(
            Fragment::new("CC)", 2),
            Err(GraphEngineError::Malformed(_))
        ));
        assert!(matches!(
            Fragment::new("C[C@H", 2),
            Err(GraphEngineError::Smiles(_))
        ));
    }
}

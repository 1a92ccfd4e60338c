use ahash::HashMap;

use crate::{GraphEngineError, Result, fragment::Token};

/// The connectivity implied by a token stream, indexed by token position
#[derive(Clone, Debug)]
pub struct Layout {
    links: Vec<Option<Link>>,
    degrees: Vec<usize>,
    edges: Vec<(usize, usize)>,
}

/// How an atom is bonded to the atom written before it in its chain or branch
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Link {
    pub atom: usize,
    pub bond: Option<usize>,
}

impl Layout {
    pub fn new(tokens: &[Token]) -> Result<Self> {
        let mut layout = Self {
            links: vec![None; tokens.len()],
            degrees: vec![0; tokens.len()],
            edges: Vec::new(),
        };

        let mut branches: Vec<usize> = Vec::new();
        let mut open_rings: HashMap<u8, usize> = HashMap::default();
        let mut current: Option<usize> = None;
        let mut bond: Option<usize> = None;

        for (index, token) in tokens.iter().enumerate() {
            match token {
                Token::Atom(_) => {
                    if let Some(previous) = current {
                        layout.links[index] = Some(Link {
                            atom: previous,
                            bond: bond.take(),
                        });
                        layout.connect(previous, index);
                    } else if bond.is_some() {
                        return Err(GraphEngineError::Malformed("a bond must follow an atom"));
                    }
                    current = Some(index);
                }
                Token::Bond(_) => {
                    if current.is_none() || bond.is_some() {
                        return Err(GraphEngineError::Malformed("a bond must sit between two atoms"));
                    }
                    bond = Some(index);
                }
                Token::Ring { label, .. } => {
                    let atom = current
                        .filter(|_| bond.is_none())
                        .ok_or(GraphEngineError::Malformed("a ring closure must follow an atom"))?;
                    if let Some(partner) = open_rings.remove(label) {
                        if partner == atom {
                            return Err(GraphEngineError::Malformed("a ring closure cannot bond an atom to itself"));
                        }
                        layout.connect(partner, atom);
                    } else {
                        open_rings.insert(*label, atom);
                    }
                }
                Token::Open => {
                    let atom = current
                        .filter(|_| bond.is_none())
                        .ok_or(GraphEngineError::Malformed("a branch must follow an atom"))?;
                    branches.push(atom);
                }
                Token::Close => {
                    if bond.is_some() {
                        return Err(GraphEngineError::Malformed("a branch cannot end with a bond"));
                    }
                    current = Some(
                        branches
                            .pop()
                            .ok_or(GraphEngineError::Malformed("unbalanced branch parentheses"))?,
                    );
                }
                Token::Dot => {
                    if !branches.is_empty() || bond.is_some() {
                        return Err(GraphEngineError::Malformed(
                            "a '.' cannot appear inside a branch or after a bond",
                        ));
                    }
                    current = None;
                }
            }
        }

        if bond.is_some() {
            return Err(GraphEngineError::Malformed("the structure cannot end with a bond"));
        }
        if !branches.is_empty() {
            return Err(GraphEngineError::Malformed("unbalanced branch parentheses"));
        }
        if let Some(&label) = open_rings.keys().min() {
            return Err(GraphEngineError::UnclosedRing(label));
        }

        Ok(layout)
    }

    pub fn link(&self, index: usize) -> Option<Link> {
        self.links[index]
    }

    /// The atom that names `index` as its predecessor, along with that link
    pub fn successor(&self, index: usize) -> Option<(usize, Link)> {
        self.links
            .iter()
            .enumerate()
            .find_map(|(i, link)| link.filter(|l| l.atom == index).map(|l| (i, l)))
    }

    pub fn degree(&self, index: usize) -> usize {
        self.degrees[index]
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    fn connect(&mut self, a: usize, b: usize) {
        self.degrees[a] += 1;
        self.degrees[b] += 1;
        self.edges.push((a, b));
    }
}

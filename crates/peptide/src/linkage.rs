// Standard Library Imports
use std::str::FromStr;

// External Crate Imports
use derive_more::{Constructor, Display};
use miette::Diagnostic;
use molzip::{AttachmentId, Site};
use thiserror::Error;
use tracing::warn;

// Public API ==========================================================================================================

/// A single bond between two attachment points of the same chain, written like `1:R1-6:R2`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Constructor)]
#[display("{source}-{target}")]
pub struct Linkage {
    pub source: Site,
    pub target: Site,
}

/// The symbolic form of a [`Linkage`], as it appears inside a MAP `{cyc:...}` tag
///
/// `N` stands for the N-terminal amine of the first residue, `C` for the C-terminal carboxyl of the last, and a number
/// for the side-chain of the residue at that position.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum CycTag {
    #[display("N-C")]
    HeadToTail,
    #[display("{_0}-C")]
    SideChainToTail(usize),
    #[display("N-{_0}")]
    HeadToSideChain(usize),
    #[display("{_0}-{_1}")]
    SideChainToSideChain(usize, usize),
}

/// How numeric `{cyc:...}` markers are read and written
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Display)]
pub enum Convention {
    /// Numbers always name side-chain (`R3`) attachments, so every tag maps to exactly one linkage and back
    #[default]
    #[display("canonical")]
    Canonical,
    /// A start marker of `1` is read as the N-terminus and an end marker equal to the chain length as the C-terminus.
    /// Links are written as `N-C` when they span the whole chain, and as their two positions otherwise. A link from a
    /// residue to itself is moved to end on the following residue.
    #[display("legacy")]
    Legacy,
}

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum LinkageError {
    #[diagnostic(help("cyclization tags look like N-C, 3-C, N-7, or 4-12"))]
    #[error("{0:?} is not a valid cyclization tag")]
    InvalidTag(String),

    #[error("the linkage site {site} is outside of the {length}-residue chain")]
    OutOfRange { site: Site, length: usize },

    #[diagnostic(help("a cyclization must bond two different residues"))]
    #[error("the linkage links residue {0} to itself")]
    SelfLink(usize),

    #[error("the residue {symbol:?} at position {} has no {} attachment", .site.position, .site.attachment)]
    UndeclaredAttachment { site: Site, symbol: String },

    #[diagnostic(help("only a single cyclization or side-chain link per peptide is supported"))]
    #[error("found {0} links, but at most one is allowed")]
    MultipleLinks(usize),

    #[diagnostic(help("multi-chain HELM is not supported, so connections must start and end on PEPTIDE{expected}"))]
    #[error("the connection refers to PEPTIDE{found}, but the only polymer is PEPTIDE{expected}")]
    ForeignPolymer { expected: u32, found: u32 },

    #[error("R{0} is not one of R1, R2, or R3")]
    UnknownAttachment(u32),
}

impl Linkage {
    /// Puts a chain end first when the link was written ending on one, so `4:R2-1:R1` becomes `1:R1-4:R2`
    #[must_use]
    pub fn oriented(self, length: usize) -> Self {
        let head = Site::new(1, AttachmentId::A1);
        let tail = Site::new(length, AttachmentId::A2);
        if self.target == head || self.source == tail {
            Self::new(self.target, self.source)
        } else {
            self
        }
    }
}

impl CycTag {
    /// Builds a tag from its two markers, where `None` stands for the `N` or `C` terminus
    #[must_use]
    pub const fn from_markers(start: Option<usize>, end: Option<usize>) -> Self {
        match (start, end) {
            (None, None) => Self::HeadToTail,
            (Some(k), None) => Self::SideChainToTail(k),
            (None, Some(k)) => Self::HeadToSideChain(k),
            (Some(k), Some(m)) => Self::SideChainToSideChain(k, m),
        }
    }

    #[must_use]
    pub const fn markers(self) -> (Option<usize>, Option<usize>) {
        match self {
            Self::HeadToTail => (None, None),
            Self::SideChainToTail(k) => (Some(k), None),
            Self::HeadToSideChain(k) => (None, Some(k)),
            Self::SideChainToSideChain(k, m) => (Some(k), Some(m)),
        }
    }

    /// Resolves this tag against a chain of `length` residues
    pub fn to_linkage(self, length: usize, convention: Convention) -> Result<Linkage, LinkageError> {
        let (start, end) = self.markers();
        let source = match (convention, start) {
            (_, None) | (Convention::Legacy, Some(1)) => Site::new(1, AttachmentId::A1),
            (_, Some(k)) => Site::new(k, AttachmentId::A3),
        };
        let end_site = |end: Option<usize>| match (convention, end) {
            (_, None) => Site::new(length, AttachmentId::A2),
            (Convention::Legacy, Some(m)) if m == length => Site::new(length, AttachmentId::A2),
            (_, Some(m)) => Site::new(m, AttachmentId::A3),
        };
        let mut target = end_site(end);

        if source.position == target.position {
            match convention {
                Convention::Canonical => return Err(LinkageError::SelfLink(source.position)),
                Convention::Legacy => {
                    let next = target
                        .position
                        .checked_add(1)
                        .ok_or(LinkageError::OutOfRange { site: target, length })?;
                    target = end_site(Some(next));
                }
            }
        }

        for site in [source, target] {
            if !(1..=length).contains(&site.position) {
                return Err(LinkageError::OutOfRange { site, length });
            }
        }

        Ok(Linkage::new(source, target))
    }

    /// Classifies a linkage on a chain of `length` residues, in either direction. Links that have no exact symbolic
    /// form (those using an `R1` or `R2` away from the chain ends, for instance) are logged and written as their
    /// nearest tag.
    #[must_use]
    pub fn from_linkage(linkage: Linkage, length: usize, convention: Convention) -> Self {
        let linkage = linkage.oriented(length);
        let Linkage { source, target } = linkage;
        let tag = match convention {
            Convention::Canonical => {
                let head = source == Site::new(1, AttachmentId::A1);
                let tail = target == Site::new(length, AttachmentId::A2);
                Self::from_markers(
                    (!head).then_some(source.position),
                    (!tail).then_some(target.position),
                )
            }
            Convention::Legacy if source.position == 1 && target.position == length => Self::HeadToTail,
            Convention::Legacy => Self::SideChainToSideChain(source.position, target.position),
        };

        if tag.to_linkage(length, convention).as_ref() != Ok(&linkage) {
            warn!(%linkage, %tag, %convention, "the linkage has no exact cyclization tag");
        }

        tag
    }
}

impl FromStr for CycTag {
    type Err = LinkageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LinkageError::InvalidTag(s.to_owned());
        let marker = |text: &str, terminus: &str| -> Result<Option<usize>, LinkageError> {
            if text == terminus {
                Ok(None)
            } else if text.bytes().all(|b| b.is_ascii_digit()) {
                text.parse().map(Some).map_err(|_| invalid())
            } else {
                Err(invalid())
            }
        };

        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        Ok(Self::from_markers(marker(start, "N")?, marker(end, "C")?))
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: Convention = Convention::Canonical;
    const LEGACY: Convention = Convention::Legacy;

    fn linkage(source: (usize, AttachmentId), target: (usize, AttachmentId)) -> Linkage {
        Linkage::new(Site::new(source.0, source.1), Site::new(target.0, target.1))
    }

    #[test]
    fn display() {
        use AttachmentId::*;
        assert_eq!(linkage((1, A1), (6, A2)).to_string(), "1:R1-6:R2");
        assert_eq!(CycTag::HeadToTail.to_string(), "N-C");
        assert_eq!(CycTag::SideChainToTail(3).to_string(), "3-C");
        assert_eq!(CycTag::HeadToSideChain(7).to_string(), "N-7");
        assert_eq!(CycTag::SideChainToSideChain(4, 12).to_string(), "4-12");
    }

    #[test]
    fn parse_tags() {
        assert_eq!("N-C".parse(), Ok(CycTag::HeadToTail));
        assert_eq!("3-C".parse(), Ok(CycTag::SideChainToTail(3)));
        assert_eq!("N-12".parse(), Ok(CycTag::HeadToSideChain(12)));
        assert_eq!(" 4-12 ".parse(), Ok(CycTag::SideChainToSideChain(4, 12)));
        for invalid in ["", "N", "C-N", "N-C-1", "4-", "-4", "x-4", "+4-5", "99999999999999999999999-C"] {
            assert_eq!(
                invalid.parse::<CycTag>(),
                Err(LinkageError::InvalidTag(invalid.to_owned())),
                "{invalid:?} should be rejected"
            );
        }
    }

    #[test]
    fn canonical_to_linkage() {
        use AttachmentId::*;
        assert_eq!(
            CycTag::HeadToTail.to_linkage(6, CANONICAL),
            Ok(linkage((1, A1), (6, A2)))
        );
        assert_eq!(
            CycTag::SideChainToTail(4).to_linkage(6, CANONICAL),
            Ok(linkage((4, A3), (6, A2)))
        );
        assert_eq!(
            CycTag::HeadToSideChain(4).to_linkage(6, CANONICAL),
            Ok(linkage((1, A1), (4, A3)))
        );
        assert_eq!(
            CycTag::SideChainToSideChain(4, 12).to_linkage(12, CANONICAL),
            Ok(linkage((4, A3), (12, A3)))
        );
        // Numbers never collapse into chain ends
        assert_eq!(
            CycTag::SideChainToSideChain(1, 12).to_linkage(12, CANONICAL),
            Ok(linkage((1, A3), (12, A3)))
        );
    }

    #[test]
    fn legacy_to_linkage() {
        use AttachmentId::*;
        assert_eq!(
            CycTag::SideChainToSideChain(4, 12).to_linkage(12, LEGACY),
            Ok(linkage((4, A3), (12, A2)))
        );
        assert_eq!(
            CycTag::SideChainToSideChain(1, 12).to_linkage(13, LEGACY),
            Ok(linkage((1, A1), (12, A3)))
        );
        assert_eq!(
            CycTag::HeadToTail.to_linkage(6, LEGACY),
            Ok(linkage((1, A1), (6, A2)))
        );
        // Self-links move their target to the next residue
        assert_eq!(
            CycTag::SideChainToSideChain(3, 3).to_linkage(6, LEGACY),
            Ok(linkage((3, A3), (4, A3)))
        );
        assert_eq!(
            CycTag::SideChainToSideChain(5, 5).to_linkage(6, LEGACY),
            Ok(linkage((5, A3), (6, A2)))
        );
    }

    #[test]
    fn invalid_linkages() {
        assert_eq!(
            CycTag::SideChainToSideChain(3, 3).to_linkage(6, CANONICAL),
            Err(LinkageError::SelfLink(3))
        );
        assert_eq!(
            CycTag::HeadToTail.to_linkage(1, CANONICAL),
            Err(LinkageError::SelfLink(1))
        );
        assert_eq!(
            CycTag::SideChainToTail(7).to_linkage(6, CANONICAL),
            Err(LinkageError::OutOfRange {
                site: Site::new(7, AttachmentId::A3),
                length: 6
            })
        );
        assert_eq!(
            CycTag::HeadToSideChain(0).to_linkage(6, CANONICAL),
            Err(LinkageError::OutOfRange {
                site: Site::new(0, AttachmentId::A3),
                length: 6
            })
        );
        assert_eq!(
            CycTag::SideChainToSideChain(usize::MAX, usize::MAX).to_linkage(6, LEGACY),
            Err(LinkageError::OutOfRange {
                site: Site::new(usize::MAX, AttachmentId::A3),
                length: 6
            })
        );
        assert_eq!(
            CycTag::SideChainToSideChain(6, 6).to_linkage(6, LEGACY),
            Err(LinkageError::OutOfRange {
                site: Site::new(7, AttachmentId::A3),
                length: 6
            })
        );
    }

    #[test]
    fn canonical_from_linkage() {
        use AttachmentId::*;
        let tag = |source, target, length| CycTag::from_linkage(linkage(source, target), length, CANONICAL);
        assert_eq!(tag((1, A1), (6, A2), 6), CycTag::HeadToTail);
        assert_eq!(tag((3, A3), (6, A2), 6), CycTag::SideChainToTail(3));
        assert_eq!(tag((1, A1), (12, A3), 13), CycTag::HeadToSideChain(12));
        assert_eq!(tag((4, A3), (12, A3), 12), CycTag::SideChainToSideChain(4, 12));
    }

    #[test]
    fn reversed_linkages() {
        use AttachmentId::*;
        assert_eq!(linkage((4, A2), (1, A1)).oriented(4), linkage((1, A1), (4, A2)));
        assert_eq!(linkage((6, A2), (3, A3)).oriented(6), linkage((3, A3), (6, A2)));
        assert_eq!(linkage((12, A3), (1, A1)).oriented(13), linkage((1, A1), (12, A3)));
        assert_eq!(linkage((12, A3), (4, A3)).oriented(12), linkage((12, A3), (4, A3)));

        for convention in [CANONICAL, LEGACY] {
            let tag = |source, target, length| CycTag::from_linkage(linkage(source, target), length, convention);
            assert_eq!(tag((4, A2), (1, A1), 4), CycTag::HeadToTail);
            assert_eq!(tag((12, A3), (4, A3), 12), CycTag::SideChainToSideChain(12, 4));
        }
        let tag = |source, target, length| CycTag::from_linkage(linkage(source, target), length, CANONICAL);
        assert_eq!(tag((6, A2), (3, A3), 6), CycTag::SideChainToTail(3));
        assert_eq!(tag((12, A3), (1, A1), 13), CycTag::HeadToSideChain(12));
    }

    #[test]
    fn legacy_from_linkage() {
        use AttachmentId::*;
        let tag = |source, target, length| CycTag::from_linkage(linkage(source, target), length, LEGACY);
        assert_eq!(tag((1, A1), (6, A2), 6), CycTag::HeadToTail);
        assert_eq!(tag((1, A1), (12, A3), 13), CycTag::SideChainToSideChain(1, 12));
        assert_eq!(tag((4, A3), (12, A3), 12), CycTag::SideChainToSideChain(4, 12));
    }

    // Every tag that fits on a chain survives a trip through its structural form, whichever convention reads it
    #[test]
    fn inverse_law() {
        for length in 2..=15 {
            let positions = 1..=length;
            let tags = [CycTag::HeadToTail]
                .into_iter()
                .chain(positions.clone().filter(|&k| k < length).map(CycTag::SideChainToTail))
                .chain(positions.clone().filter(|&k| k > 1).map(CycTag::HeadToSideChain))
                .chain(
                    positions
                        .clone()
                        .flat_map(|k| positions.clone().map(move |m| (k, m)))
                        .filter(|(k, m)| k != m)
                        .map(|(k, m)| CycTag::SideChainToSideChain(k, m)),
                );
            for tag in tags {
                let linkage = tag.to_linkage(length, CANONICAL).unwrap();
                assert_eq!(CycTag::from_linkage(linkage, length, CANONICAL), tag);
                // Links touching a chain end classify the same whichever way round they're written
                if !matches!(tag, CycTag::SideChainToSideChain(..)) {
                    let reversed = Linkage::new(linkage.target, linkage.source);
                    assert_eq!(CycTag::from_linkage(reversed, length, CANONICAL), tag);
                }
            }
        }
    }
}

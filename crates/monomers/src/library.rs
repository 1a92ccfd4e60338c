// Standard Library Imports
use std::collections::{BTreeMap, BTreeSet, btree_map, hash_map::Entry};

// External Crate Imports
use ahash::{HashMap, HashMapExt};
use itertools::Itertools;
use knus::{
    Decode,
    span::{Span, Spanned},
};
use molzip::{AttachmentId, Fragment};
use tracing::{debug, trace};

// Local Crate Imports
use crate::{Monomer, MonomerKind, errors::LibraryErrorKind, LibraryLoadError};

// Public API ==========================================================================================================

/// The library that ships with this crate
pub const DEFAULT_KDL: &str = include_str!("../data/monomer_library.kdl");

#[derive(Clone, Debug)]
pub struct MonomerLibrary {
    monomers: Vec<Monomer>,
    symbols: HashMap<String, usize>,
    tokens: HashMap<String, usize>,
    scan_order: Vec<usize>,
}

impl MonomerLibrary {
    pub fn new(file_name: impl AsRef<str>, kdl_text: impl AsRef<str>) -> Result<Self, LibraryLoadError> {
        let (file_name, kdl_text) = (file_name.as_ref(), kdl_text.as_ref());
        let parsed_library: MonomerLibraryKdl = knus::parse(file_name, kdl_text)?;
        let library = parsed_library
            .validate(())
            .map_err(|e| e.finalize(file_name, kdl_text))?;
        debug!(file_name, monomers = library.len(), "loaded monomer library");
        Ok(library)
    }

    #[must_use]
    pub fn by_symbol(&self, symbol: &str) -> Option<&Monomer> {
        self.symbols.get(symbol).map(|&i| &self.monomers[i])
    }

    #[must_use]
    pub fn by_token(&self, token: &str) -> Option<&Monomer> {
        self.tokens.get(token).map(|&i| &self.monomers[i])
    }

    /// Every monomer, ordered so that a greedy left-to-right MAP scan always tries longer tokens before any of their
    /// prefixes: longest token first, with ties broken lexicographically
    pub fn scan_order(&self) -> impl Iterator<Item = &Monomer> + '_ {
        self.scan_order.iter().map(|&i| &self.monomers[i])
    }

    /// Monomers in the order they were defined
    pub fn iter(&self) -> impl Iterator<Item = &Monomer> + '_ {
        self.monomers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.monomers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monomers.is_empty()
    }
}

impl Default for MonomerLibrary {
    fn default() -> Self {
        Self::new("monomer_library.kdl", DEFAULT_KDL).expect("the embedded monomer library is invalid")
    }
}

// KDL File Schema =====================================================================================================

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct MonomerLibraryKdl {
    #[knus(children(name = "monomer"))]
    monomers: Vec<MonomerKdl>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct MonomerKdl {
    #[knus(span)]
    span: Span,
    #[knus(argument)]
    symbol: String,
    #[knus(property(name = "map"))]
    token: String,
    #[knus(property(name = "name"))]
    name: Option<String>,
    #[knus(child, unwrap(argument))]
    smiles: Spanned<String, Span>,
    #[knus(children(name = "attachment"))]
    attachments: Vec<AttachmentKdl>,
}

#[derive(Debug, Decode)]
#[knus(span_type=Span)]
struct AttachmentKdl {
    #[knus(span)]
    span: Span,
    #[knus(argument)]
    name: String,
    #[knus(property(name = "cap"))]
    cap: String,
}

// Contextual Validation Trait  ========================================================================================

type LibraryResult<T> = Result<T, LibraryErrorKind>;

trait ValidateInto<'c, T> {
    type Context: 'c;

    fn validate(self, ctx: Self::Context) -> LibraryResult<T>;
}

// Library Validation ==================================================================================================

impl ValidateInto<'_, MonomerLibrary> for MonomerLibraryKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> LibraryResult<MonomerLibrary> {
        let mut monomers = Vec::with_capacity(self.monomers.len());
        let mut symbols = HashMap::new();
        let mut tokens = HashMap::new();

        for monomer_kdl in self.monomers {
            let span = monomer_kdl.span;
            let monomer = monomer_kdl.validate(())?;
            let index = monomers.len();

            match symbols.entry(monomer.symbol.clone()) {
                Entry::Occupied(e) => {
                    let (symbol, (first_defined_at, _)) = e.remove_entry();
                    return Err(LibraryErrorKind::DuplicateSymbol(first_defined_at, span, symbol));
                }
                Entry::Vacant(e) => e.insert((span, index)),
            };

            match tokens.entry(monomer.token.clone()) {
                Entry::Occupied(e) => {
                    let (token, (first_defined_at, _)) = e.remove_entry();
                    return Err(LibraryErrorKind::DuplicateToken(first_defined_at, span, token));
                }
                Entry::Vacant(e) => e.insert((span, index)),
            };

            trace!(symbol = %monomer.symbol, token = %monomer.token, kind = %monomer.kind, "validated monomer");
            monomers.push(monomer);
        }

        let scan_order = (0..monomers.len())
            .sorted_by(|&a, &b| {
                let (a, b) = (&monomers[a].token, &monomers[b].token);
                b.len().cmp(&a.len()).then_with(|| a.cmp(b))
            })
            .collect();
        let drop_spans = |index: HashMap<String, (Span, usize)>| index.into_iter().map(|(k, (_, i))| (k, i)).collect();

        Ok(MonomerLibrary {
            monomers,
            symbols: drop_spans(symbols),
            tokens: drop_spans(tokens),
            scan_order,
        })
    }
}

// Monomer Validation ==================================================================================================

impl ValidateInto<'_, Monomer> for MonomerKdl {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> LibraryResult<Monomer> {
        for (value, description) in [(&self.symbol, "HELM symbol"), (&self.token, "MAP token")] {
            if value.trim().is_empty() {
                return Err(LibraryErrorKind::Blank(self.span, self.symbol.clone(), description));
            }
        }

        let kind = MonomerKind::of_token(&self.token);
        let caps = self.attachments.validate(())?;

        if let Some(&missing) = kind
            .required_attachments()
            .iter()
            .find(|&&a| !caps.contains_key(&a))
        {
            return Err(LibraryErrorKind::MissingAttachment(self.span, self.symbol, kind, missing));
        }

        let smiles_span = *self.smiles.span();
        let fragment = Fragment::new(&self.smiles, 1).map_err(|e| LibraryErrorKind::InvalidFragment(smiles_span, e))?;
        let dummies: BTreeSet<_> = fragment.attachments().map(|site| site.attachment).collect();

        if let Some(&undeclared) = dummies.iter().find(|&&a| !caps.contains_key(&a)) {
            return Err(LibraryErrorKind::UndeclaredDummy(smiles_span, undeclared));
        }
        if let Some((&missing, &(span, _))) = caps.iter().find(|&(a, _)| !dummies.contains(a)) {
            return Err(LibraryErrorKind::MissingDummy(span, missing));
        }

        Ok(Monomer {
            name: self.name.unwrap_or_else(|| self.symbol.clone()),
            symbol: self.symbol,
            token: self.token,
            kind,
            smiles: String::clone(&self.smiles),
            caps: caps.into_iter().map(|(a, (_, cap))| (a, cap)).collect(),
        })
    }
}

// ---------------------------------------------------------------------------------------------------------------------

type Caps = BTreeMap<AttachmentId, (Span, String)>;

impl ValidateInto<'_, Caps> for Vec<AttachmentKdl> {
    type Context = ();

    fn validate(self, _ctx: Self::Context) -> LibraryResult<Caps> {
        let mut caps = BTreeMap::new();

        for AttachmentKdl { span, name, cap } in self {
            let attachment =
                AttachmentId::from_r_group(&name).ok_or(LibraryErrorKind::UnknownAttachment(span, name))?;

            if cap.is_empty() || cap.contains(['[', ']']) || cap.contains(char::is_whitespace) {
                return Err(LibraryErrorKind::InvalidCap(span, cap));
            }

            match caps.entry(attachment) {
                btree_map::Entry::Occupied(e) => {
                    let (first_defined_at, _) = e.get();
                    return Err(LibraryErrorKind::DuplicateAttachment(
                        *first_defined_at,
                        span,
                        attachment,
                    ));
                }
                btree_map::Entry::Vacant(e) => e.insert((span, cap)),
            };
        }

        Ok(caps)
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use indoc::indoc;

    use super::*;

    static LIBRARY: LazyLock<MonomerLibrary> = LazyLock::new(MonomerLibrary::default);

    fn validate(kdl: &str) -> LibraryResult<MonomerLibrary> {
        let library: MonomerLibraryKdl = knus::parse("test", kdl).unwrap();
        library.validate(())
    }

    #[test]
    fn default_library() {
        assert_eq!(LIBRARY.len(), 36);
        assert!(!LIBRARY.is_empty());

        let d_leucine = LIBRARY.by_symbol("dL").unwrap();
        assert_eq!(d_leucine.token, "L{d}");
        assert_eq!(d_leucine.name, "D-Leucine");
        assert_eq!(d_leucine.kind, MonomerKind::Residue);
        assert_eq!(LIBRARY.by_token("L{d}"), Some(d_leucine));

        let piperidide = LIBRARY.by_token("{ct:PPD}").unwrap();
        assert_eq!(piperidide.symbol, "-pip");
        assert_eq!(piperidide.kind, MonomerKind::CTerminalCap);
        assert_eq!(piperidide.attachments().collect_vec(), [AttachmentId::A1]);

        assert_eq!(LIBRARY.by_symbol("Xyz"), None);
        assert_eq!(LIBRARY.by_token("L{x}"), None);
    }

    #[test]
    fn attachments_and_caps() {
        let lysine = LIBRARY.by_symbol("K").unwrap();
        assert_eq!(
            lysine.attachments().collect_vec(),
            AttachmentId::ALL
        );
        assert_eq!(lysine.cap(AttachmentId::A1), Some("H"));
        assert_eq!(lysine.cap(AttachmentId::A2), Some("OH"));
        assert_eq!(lysine.cap(AttachmentId::A3), Some("H"));

        let glycine = LIBRARY.by_symbol("G").unwrap();
        assert!(glycine.has_attachment(AttachmentId::A2));
        assert!(!glycine.has_attachment(AttachmentId::A3));
        assert_eq!(glycine.cap(AttachmentId::A3), None);
    }

    #[test]
    fn every_fragment_loads() {
        for monomer in LIBRARY.iter() {
            let fragment = Fragment::new(&monomer.smiles, 3).unwrap();
            assert_eq!(
                fragment.attachments().map(|s| s.attachment).sorted().collect_vec(),
                monomer.attachments().collect_vec(),
                "{} has mismatched attachments",
                monomer.symbol
            );
        }
    }

    #[test]
    fn scan_order_is_longest_first() {
        let tokens = LIBRARY.scan_order().map(|m| m.token.as_str()).collect_vec();
        assert_eq!(tokens.len(), LIBRARY.len());
        assert_eq!(tokens[..3], ["A{nnm:NMX}", "F{nnm:NMX}", "G{nnm:NMX}"]);
        assert_eq!(tokens[tokens.len() - 3..], ["V", "W", "Y"]);
        assert!(
            tokens
                .iter()
                .tuple_windows()
                .all(|(a, b)| a.len() > b.len() || (a.len() == b.len() && a < b))
        );
    }

    #[test]
    fn descending_lexicographic_order_also_puts_longer_tokens_first() {
        // Among tokens sharing a prefix, sorting in reverse lexicographic order yields the same precedence as sorting
        // by length, so greedy scans agree whichever order is used
        let descending = LIBRARY.iter().map(|m| m.token.as_str()).sorted().rev().collect_vec();
        let longest_first = LIBRARY.scan_order().map(|m| m.token.as_str()).collect_vec();
        let position = |order: &[&str], token: &str| order.iter().position(|&t| t == token).unwrap();

        for (&long, &short) in descending.iter().tuple_combinations() {
            if long != short && long.starts_with(short) {
                assert!(position(&descending, long) < position(&descending, short));
                assert!(position(&longest_first, long) < position(&longest_first, short));
            }
        }
    }

    #[test]
    fn custom_library_with_prefix_tokens() {
        let library = validate(indoc! {r#"
            monomer "A" map="A" {
                smiles "[*:1]N[C@@H](C)C([*:2])=O"
                attachment "R1" cap="H"
                attachment "R2" cap="OH"
            }
            monomer "AB" map="AB" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="H"
                attachment "R2" cap="OH"
            }
        "#})
        .unwrap();
        assert_eq!(library.by_symbol("AB").unwrap().name, "AB");
        assert_eq!(
            library.scan_order().map(|m| m.symbol.as_str()).collect_vec(),
            ["AB", "A"]
        );
    }

    #[test]
    fn duplicate_symbols_and_tokens() {
        let duplicate_symbol = validate(indoc! {r#"
            monomer "G" map="G" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="H"
                attachment "R2" cap="OH"
            }
            monomer "G" map="X" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="H"
                attachment "R2" cap="OH"
            }
        "#});
        assert!(matches!(
            duplicate_symbol,
            Err(LibraryErrorKind::DuplicateSymbol(_, _, ref s)) if s == "G"
        ));

        let duplicate_token = validate(indoc! {r#"
            monomer "G" map="G" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="H"
                attachment "R2" cap="OH"
            }
            monomer "Gly" map="G" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="H"
                attachment "R2" cap="OH"
            }
        "#});
        assert!(matches!(
            duplicate_token,
            Err(LibraryErrorKind::DuplicateToken(_, _, ref t)) if t == "G"
        ));
    }

    #[test]
    fn missing_backbone_attachments() {
        let residue = validate(indoc! {r#"
            monomer "G" map="G" {
                smiles "[*:1]NCC(O)=O"
                attachment "R1" cap="H"
            }
        "#});
        assert!(matches!(
            residue,
            Err(LibraryErrorKind::MissingAttachment(_, _, MonomerKind::Residue, AttachmentId::A2))
        ));

        let n_cap = validate(indoc! {r#"
            monomer "ac" map="{nt:Ac}" {
                smiles "CC(=O)N[*:1]"
                attachment "R1" cap="H"
            }
        "#});
        assert!(matches!(
            n_cap,
            Err(LibraryErrorKind::MissingAttachment(_, _, MonomerKind::NTerminalCap, AttachmentId::A2))
        ));

        let c_cap = validate(indoc! {r#"
            monomer "am" map="{ct:NH2}" {
                smiles "N[*:1]"
                attachment "R1" cap="H"
            }
        "#});
        assert!(c_cap.is_ok());
    }

    #[test]
    fn invalid_attachments() {
        let unknown = validate(indoc! {r#"
            monomer "G" map="G" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="H"
                attachment "R4" cap="OH"
            }
        "#});
        assert!(matches!(unknown, Err(LibraryErrorKind::UnknownAttachment(_, ref n)) if n == "R4"));

        let duplicate = validate(indoc! {r#"
            monomer "G" map="G" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="H"
                attachment "R1" cap="OH"
            }
        "#});
        assert!(matches!(
            duplicate,
            Err(LibraryErrorKind::DuplicateAttachment(_, _, AttachmentId::A1))
        ));

        let bad_cap = validate(indoc! {r#"
            monomer "G" map="G" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="[H]"
                attachment "R2" cap="OH"
            }
        "#});
        assert!(matches!(bad_cap, Err(LibraryErrorKind::InvalidCap(_, ref c)) if c == "[H]"));
    }

    #[test]
    fn fragments_must_match_attachments() {
        let undeclared = validate(indoc! {r#"
            monomer "D" map="D" {
                smiles "[*:1]N[C@@H](CC([*:3])=O)C([*:2])=O"
                attachment "R1" cap="H"
                attachment "R2" cap="OH"
            }
        "#});
        assert!(matches!(
            undeclared,
            Err(LibraryErrorKind::UndeclaredDummy(_, AttachmentId::A3))
        ));

        let missing = validate(indoc! {r#"
            monomer "G" map="G" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="H"
                attachment "R2" cap="OH"
                attachment "R3" cap="H"
            }
        "#});
        assert!(matches!(
            missing,
            Err(LibraryErrorKind::MissingDummy(_, AttachmentId::A3))
        ));

        let invalid = validate(indoc! {r#"
            monomer "G" map="G" {
                smiles "[*:1]NCC([*:2]=O"
                attachment "R1" cap="H"
                attachment "R2" cap="OH"
            }
        "#});
        assert!(matches!(invalid, Err(LibraryErrorKind::InvalidFragment(_, _))));
    }

    #[test]
    fn blank_values() {
        let blank = validate(indoc! {r#"
            monomer "G" map="" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="H"
                attachment "R2" cap="OH"
            }
        "#});
        assert!(matches!(blank, Err(LibraryErrorKind::Blank(_, _, "MAP token"))));
    }

    #[test]
    fn load_errors() {
        let syntax = MonomerLibrary::new("test.kdl", r#"monomer "G" map="G""#);
        assert!(matches!(syntax, Err(LibraryLoadError::Syntax(_))));

        let kdl = indoc! {r#"
            monomer "G" map="G" {
                smiles "[*:1]NCC([*:2])=O"
                attachment "R1" cap="H"
            }
        "#};
        let Err(LibraryLoadError::Invalid(invalid)) = MonomerLibrary::new("test.kdl", kdl) else {
            panic!("expected a validation error");
        };
        assert_eq!(invalid.to_string(), "failed to validate monomer library file");
        assert_eq!(
            invalid.kind().to_string(),
            "the residue \"G\" is missing its R2 attachment"
        );
    }
}

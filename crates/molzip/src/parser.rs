use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, take_while_m_n},
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{cut, map, opt, recognize, value},
    multi::many1,
    sequence::{delimited, pair, preceded},
};
use nom_miette::{LabeledParseError, expect, map_res};

use crate::{
    AttachmentId, Site,
    errors::SmilesErrorKind,
    fragment::{Atom, Bond, Token},
};

type ParseResult<'a, O> = IResult<&'a str, O, LabeledParseError<'a, SmilesErrorKind>>;

/// SMILES = Token , { Token } ;
pub fn smiles<'a>(position: usize) -> impl FnMut(&'a str) -> ParseResult<'a, Vec<Token>> {
    many1(token(position))
}

/// Token = Atom | Ring Closure | Bond | "(" | ")" | "." ;
fn token<'a>(position: usize) -> impl FnMut(&'a str) -> ParseResult<'a, Token> {
    alt((
        map(atom(position), Token::Atom),
        ring_closure,
        map(bond, Token::Bond),
        value(Token::Open, char('(')),
        value(Token::Close, char(')')),
        value(Token::Dot, char('.')),
    ))
}

/// Atom = Attachment | Bracket Atom | Organic Atom ;
fn atom<'a>(position: usize) -> impl FnMut(&'a str) -> ParseResult<'a, Atom> {
    alt((attachment(position), bracket_atom, organic_atom))
}

/// Attachment = "[*:" , Digits , "]" ;
fn attachment<'a>(position: usize) -> impl FnMut(&'a str) -> ParseResult<'a, Atom> {
    let label = map_res(digit1, move |digits: &str| {
        digits
            .parse()
            .ok()
            .and_then(AttachmentId::from_number)
            .map(|attachment| Atom::Attachment(Site::new(position, attachment)))
            .ok_or_else(|| SmilesErrorKind::UnknownAttachmentLabel(digits.to_owned()))
    });
    delimited(tag("[*:"), label, char(']'))
}

/// Bracket Atom = "[" , { any char except "[" or "]" } , "]" ;
fn bracket_atom(i: &str) -> ParseResult<Atom> {
    let close = cut(expect(char(']'), SmilesErrorKind::ExpectedBracketEnd));
    map(delimited(char('['), is_not("[]"), close), |inner: &str| {
        Atom::Bracket(inner.to_owned())
    })(i)
}

/// Organic Atom = "Cl" | "Br" | "B" | "C" | "N" | "O" | "S" | "P" | "F" | "I"
///              | "b" | "c" | "n" | "o" | "s" | "p" | "*" ;
fn organic_atom(i: &str) -> ParseResult<Atom> {
    let symbol = alt((tag("Cl"), tag("Br"), recognize(one_of("BCNOSPFIbcnosp*"))));
    map(symbol, |symbol: &str| Atom::Organic(symbol.to_owned()))(i)
}

/// Bond = "-" | "=" | "#" | "$" | ":" | "/" | "\" ;
fn bond(i: &str) -> ParseResult<Bond> {
    alt((
        value(Bond::Single, char('-')),
        value(Bond::Double, char('=')),
        value(Bond::Triple, char('#')),
        value(Bond::Quadruple, char('$')),
        value(Bond::Aromatic, char(':')),
        value(Bond::Up, char('/')),
        value(Bond::Down, char('\\')),
    ))(i)
}

/// Ring Closure = [ Bond ] , ( Digit | "%" , Digit , Digit ) ;
fn ring_closure(i: &str) -> ParseResult<Token> {
    let is_digit = |c: char| c.is_ascii_digit();
    let single = map(satisfy(is_digit), |digit| digit as u8 - b'0');
    let double = map(preceded(char('%'), take_while_m_n(2, 2, is_digit)), |digits: &str| {
        digits.bytes().fold(0, |label, digit| label * 10 + (digit - b'0'))
    });
    map(pair(opt(bond), alt((double, single))), |(bond, label)| {
        Token::Ring { bond, label }
    })(i)
}

#[cfg(test)]
mod tests {
    use nom_miette::final_parser;

    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        final_parser(smiles(7))(input).unwrap()
    }

    #[test]
    fn organic_and_bracket_atoms() {
        assert_eq!(
            tokens("ClCBr[C@@H][nH]c*"),
            vec![
                Token::Atom(Atom::Organic("Cl".to_owned())),
                Token::Atom(Atom::Organic("C".to_owned())),
                Token::Atom(Atom::Organic("Br".to_owned())),
                Token::Atom(Atom::Bracket("C@@H".to_owned())),
                Token::Atom(Atom::Bracket("nH".to_owned())),
                Token::Atom(Atom::Organic("c".to_owned())),
                Token::Atom(Atom::Organic("*".to_owned())),
            ]
        );
    }

    #[test]
    fn attachments_are_tagged_with_their_position() {
        assert_eq!(
            tokens("[*:1][*:3][*]"),
            vec![
                Token::Atom(Atom::Attachment(Site::new(7, AttachmentId::A1))),
                Token::Atom(Atom::Attachment(Site::new(7, AttachmentId::A3))),
                Token::Atom(Atom::Bracket("*".to_owned())),
            ]
        );
    }

    #[test]
    fn ring_closures_and_bonds() {
        assert_eq!(
            tokens("C=1%12C/C=C\\C1"),
            vec![
                Token::Atom(Atom::Organic("C".to_owned())),
                Token::Ring {
                    bond: Some(Bond::Double),
                    label: 1
                },
                Token::Ring {
                    bond: None,
                    label: 12
                },
                Token::Atom(Atom::Organic("C".to_owned())),
                Token::Bond(Bond::Up),
                Token::Atom(Atom::Organic("C".to_owned())),
                Token::Bond(Bond::Double),
                Token::Atom(Atom::Organic("C".to_owned())),
                Token::Bond(Bond::Down),
                Token::Atom(Atom::Organic("C".to_owned())),
                Token::Ring {
                    bond: None,
                    label: 1
                },
            ]
        );
    }

    #[test]
    fn branches_and_dots() {
        assert_eq!(
            tokens("C(O).N"),
            vec![
                Token::Atom(Atom::Organic("C".to_owned())),
                Token::Open,
                Token::Atom(Atom::Organic("O".to_owned())),
                Token::Close,
                Token::Dot,
                Token::Atom(Atom::Organic("N".to_owned())),
            ]
        );
    }

    #[test]
    fn errors() {
        let mut parser = final_parser(smiles(1));
        let unknown = parser("CC[*:4]").unwrap_err();
        assert_eq!(
            unknown.root_kind(),
            &SmilesErrorKind::UnknownAttachmentLabel("4".to_owned())
        );
        let unclosed = parser("C[C@@H").unwrap_err();
        assert_eq!(unclosed.root_kind(), &SmilesErrorKind::ExpectedBracketEnd);
        let garbage = parser("CCX").unwrap_err();
        assert_eq!(garbage.root_kind(), &SmilesErrorKind::Incomplete);
        let empty = parser("").unwrap_err();
        assert!(matches!(empty.root_kind(), SmilesErrorKind::NomError(_)));
    }
}

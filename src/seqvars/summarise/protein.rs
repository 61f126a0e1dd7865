//! Conversion of three-letter protein change notation to one-letter notation.

use std::sync::OnceLock;

use regex::Regex;

/// Three-letter amino acid codes and their one-letter equivalents.
///
/// `Ter` (stop codon) maps to `X`.
pub const AMINO_ACIDS: &[(&str, char)] = &[
    ("Ala", 'A'),
    ("Arg", 'R'),
    ("Asn", 'N'),
    ("Asp", 'D'),
    ("Cys", 'C'),
    ("Glu", 'E'),
    ("Gln", 'Q'),
    ("Gly", 'G'),
    ("His", 'H'),
    ("Ile", 'I'),
    ("Leu", 'L'),
    ("Lys", 'K'),
    ("Met", 'M'),
    ("Phe", 'F'),
    ("Pro", 'P'),
    ("Ser", 'S'),
    ("Thr", 'T'),
    ("Trp", 'W'),
    ("Tyr", 'Y'),
    ("Val", 'V'),
    ("Ter", 'X'),
];

/// Collapses e.g. `PfsX5` (after one-letter conversion) into `fs`.
fn frameshift_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z]fsX([0-9]+|\?)").expect("valid regex"))
}

/// One-letter code of the three-letter code at the start of `s`.
fn one_letter(s: &str) -> Option<char> {
    let window = s.get(..3)?;
    AMINO_ACIDS
        .iter()
        .find(|(code, _)| *code == window)
        .map(|(_, letter)| *letter)
}

/// Convert e.g. `p.Arg175His` to `p.R175H` and `p.Leu12ProfsTer5` to `p.L12fs`.
///
/// Codes are replaced in a single left-to-right scan so that a replacement
/// never forms a new three-letter window.
pub fn three_to_one(protein_change: &str) -> String {
    let protein_change = protein_change.replace("%3D", "=");

    let mut result = String::with_capacity(protein_change.len());
    let mut rest = protein_change.as_str();
    while let Some(c) = rest.chars().next() {
        match one_letter(rest) {
            Some(letter) => {
                result.push(letter);
                rest = &rest[3..];
            }
            None => {
                result.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }

    frameshift_regex().replace_all(&result, "fs").into_owned()
}

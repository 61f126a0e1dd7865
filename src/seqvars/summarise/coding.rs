//! Derivation of the consolidated coding sequence and protein change.

use super::{protein::three_to_one, schema::CsqEntry};

/// Value used for "no value" in the derived fields.
pub const PLACEHOLDER: &str = ".";

/// Prefix of protein identifiers whose `HGVSp` notation is used.
const PROTEIN_ID_PREFIX: &str = "ENSP";

/// Consequences for which no protein change is reported.
const SPLICE_SITE_CONSEQUENCES: &[&str] = &["splice_acceptor_variant", "splice_donor_variant"];

/// The per-transcript fields the coding change is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodingInput<'a> {
    /// `&`-separated consequence terms.
    pub consequence: Option<&'a str>,
    /// e.g. `ENST00000269305.4:c.524G>A`
    pub hgvsc: Option<&'a str>,
    /// e.g. `ENSP00000269305.4:p.Arg175His`
    pub hgvsp: Option<&'a str>,
    /// e.g. `175`, `175/393`, or `10-20/393`
    pub protein_position: Option<&'a str>,
    /// e.g. `R/H` or `L`
    pub amino_acids: Option<&'a str>,
    /// e.g. `5/11`
    pub exon: Option<&'a str>,
}

impl<'a> CodingInput<'a> {
    /// Collect the input fields from a consequence entry.
    pub fn from_entry(entry: &CsqEntry<'a>) -> Self {
        Self {
            consequence: entry.consequence(),
            hgvsc: entry.get("HGVSc"),
            hgvsp: entry.get("HGVSp"),
            protein_position: entry.get("Protein_position"),
            amino_acids: entry.get("Amino_acids"),
            exon: entry.get("EXON"),
        }
    }
}

/// Result of `compose`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingChange {
    /// Short one-letter protein change, `HGVSp_short`.
    pub protein_change: String,
    /// Consolidated change, `CDS_CHANGE`.
    pub cds_change: String,
    pub amino_acid_start: Option<u32>,
    pub amino_acid_end: Option<u32>,
}

impl Default for CodingChange {
    fn default() -> Self {
        Self {
            protein_change: PLACEHOLDER.to_string(),
            cds_change: PLACEHOLDER.to_string(),
            amino_acid_start: None,
            amino_acid_end: None,
        }
    }
}

/// Split `Protein_position` into start and end.
///
/// The total length after `/` is ignored. A range yields positions only when
/// both sides are numeric.
pub fn parse_protein_position(protein_position: &str) -> (Option<u32>, Option<u32>) {
    let position = protein_position.split('/').next().unwrap_or_default();
    let numeric = |s: &str| -> Option<u32> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().ok()
        } else {
            None
        }
    };
    match position.split_once('-') {
        Some((start, end)) => match (numeric(start), numeric(end)) {
            (Some(start), Some(end)) => (Some(start), Some(end)),
            _ => (None, None),
        },
        None => {
            let start = numeric(position);
            (start, start)
        }
    }
}

fn has_term(consequence: &str, term: &str) -> bool {
    consequence.split('&').any(|c| c == term)
}

/// Whether the consequence affects a splice acceptor or donor site.
pub fn is_splice_site(consequence: &str) -> bool {
    SPLICE_SITE_CONSEQUENCES
        .iter()
        .any(|term| has_term(consequence, term))
}

/// One-letter protein change from `HGVSp` if it refers to an Ensembl protein.
fn short_hgvsp(hgvsp: &str) -> Option<String> {
    let (protein_id, change) = hgvsp.split_once(':')?;
    if !protein_id.starts_with(PROTEIN_ID_PREFIX) {
        return None;
    }
    Some(three_to_one(change)).filter(|change| change.starts_with("p."))
}

/// Derive the protein and coding sequence change of the picked transcript.
///
/// Missing inputs never fail but yield the `"."` defaults.
pub fn compose(input: &CodingInput) -> CodingChange {
    let mut result = CodingChange::default();

    // Negative positions mark changes outside of the protein.
    if input
        .protein_position
        .map(|position| position.starts_with('-'))
        .unwrap_or(false)
    {
        return result;
    }
    let (start, end) = input
        .protein_position
        .map(parse_protein_position)
        .unwrap_or_default();
    result.amino_acid_start = start;
    result.amino_acid_end = end;

    let consequence = input.consequence.unwrap_or_default();
    let splice_site = is_splice_site(consequence);

    if !splice_site {
        if let Some(change) = input.hgvsp.and_then(short_hgvsp) {
            result.protein_change = change;
        }
        if let (true, Some(amino_acids), Some(start)) = (
            has_term(consequence, "synonymous_variant"),
            input.amino_acids,
            start,
        ) {
            result.protein_change = match amino_acids.split_once('/') {
                // stop-lost only overrides within the synonymous case
                Some((_, alternative)) if has_term(consequence, "stop_lost") => {
                    format!("p.X{}{}", start, alternative)
                }
                Some((amino_acid, _)) => format!("p.{}{}{}", amino_acid, start, amino_acid),
                None => format!("p.{}{}{}", amino_acids, start, amino_acids),
            };
        }
    }

    if let Some(hgvsc) = input.hgvsc.filter(|hgvsc| *hgvsc != PLACEHOLDER) {
        if splice_site {
            result.cds_change = format!("{}:{}", consequence, hgvsc);
        } else if result.protein_change != PLACEHOLDER {
            let exon = input
                .exon
                .and_then(|exon| exon.split('/').next())
                .filter(|exon| !exon.is_empty())
                .unwrap_or("NA");
            result.cds_change = format!(
                "{}:{}:exon{}:{}",
                consequence, hgvsc, exon, result.protein_change
            );
        }
    }

    result
}

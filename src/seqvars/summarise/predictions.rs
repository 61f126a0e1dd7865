//! Merging of dbNSFP per-algorithm effect predictions.

use indexmap::IndexMap;
use itertools::Itertools;

use super::schema::DBNSFP_FIRST_ALGORITHM;

/// Output field with all merged predictions.
pub const EFFECT_PREDICTIONS: &str = "EFFECT_PREDICTIONS";

/// Algorithms that additionally get a field of their own.
pub const ALGORITHM_TAGS: &[(&str, &str)] = &[
    ("sift", "SIFT_DBNSFP"),
    ("provean", "PROVEAN_DBNSFP"),
    ("mutationtaster", "MUTATIONTASTER_DBNSFP"),
    ("mutationassessor", "MUTATIONASSESSOR_DBNSFP"),
    ("m_cap", "M_CAP_DBNSFP"),
    ("mutpred", "MUTPRED_DBNSFP"),
    ("fathmm", "FATHMM_DBNSFP"),
    ("fathmm_mkl", "FATHMM_MKL_DBNSFP"),
    ("primateai", "PRIMATEAI_DBNSFP"),
    ("deogen2", "DEOGEN2_DBNSFP"),
    ("list_s2", "LIST_S2_DBNSFP"),
    ("metalr", "META_LR_DBNSFP"),
    ("splice_site_rf", "SPLICE_SITE_RF_DBNSFP"),
    ("splice_site_ada", "SPLICE_SITE_ADA_DBNSFP"),
    ("gerp_rs", "GERP_DBNSFP"),
];

/// Positions within one `DBNSFP` entry.
const REF_AA: usize = 0;
const ALT_AA: usize = 1;
const GENE_IDS: usize = 4;
const AA_POSITIONS: usize = 6;

/// Unique predictions of one algorithm; empty values become `.` which is
/// dropped if anything else is present.
fn merge_values(raw: &str) -> String {
    let values = raw
        .split('&')
        .map(|value| if value.is_empty() { "." } else { value })
        .unique()
        .collect::<Vec<_>>();
    if values.len() > 1 {
        values.into_iter().filter(|value| *value != ".").join("|")
    } else {
        values.join("|")
    }
}

/// Merged predictions of one record, keyed by `<gene>:<protein change>` or
/// by `<gene>` for entries without amino acid change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionMap {
    predictions: IndexMap<String, String>,
}

impl PredictionMap {
    /// Parse the comma-separated `DBNSFP` group with the given algorithm columns.
    pub fn parse(dbnsfp: &str, algorithms: &[String]) -> Self {
        let mut predictions = IndexMap::new();
        for entry in dbnsfp.split(',') {
            let fields = entry.split('|').collect::<Vec<_>>();
            if fields.len() <= DBNSFP_FIRST_ALGORITHM
                || fields.len() - DBNSFP_FIRST_ALGORITHM != algorithms.len()
            {
                tracing::debug!(
                    "skipping DBNSFP entry with {} fields for {} algorithms",
                    fields.len(),
                    algorithms.len()
                );
                continue;
            }

            let merged = algorithms
                .iter()
                .zip(fields.iter().skip(DBNSFP_FIRST_ALGORITHM))
                .map(|(algorithm, raw)| {
                    format!("{}:{}", algorithm.to_lowercase(), merge_values(raw))
                })
                .join("&");

            let gene_ids = fields[GENE_IDS].split('&').unique().collect::<Vec<_>>();
            let (ref_aa, alt_aa) = (fields[REF_AA], fields[ALT_AA]);
            if [ref_aa, alt_aa].iter().all(|aa| !aa.is_empty() && *aa != ".") {
                for position in fields[AA_POSITIONS].split('&') {
                    for gene_id in &gene_ids {
                        let key = format!("{}:p.{}{}{}", gene_id, ref_aa, position, alt_aa);
                        predictions.insert(key, merged.clone());
                    }
                }
            } else {
                for gene_id in &gene_ids {
                    predictions.insert(gene_id.to_string(), merged.clone());
                }
            }
        }
        Self { predictions }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.predictions.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

/// Predictions selected for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectPredictions {
    /// `algo:pred&algo:pred...`, written to `EFFECT_PREDICTIONS`.
    pub summary: String,
    /// Output field and value for algorithms of `ALGORITHM_TAGS`.
    pub per_algorithm: Vec<(&'static str, String)>,
}

impl EffectPredictions {
    fn new(summary: &str) -> Self {
        let per_algorithm = summary
            .split('&')
            .filter_map(|element| element.split_once(':'))
            .filter_map(|(algorithm, value)| {
                ALGORITHM_TAGS
                    .iter()
                    .find(|(name, _)| *name == algorithm)
                    .map(|(_, tag)| (*tag, value.to_string()))
            })
            .collect();
        Self {
            summary: summary.to_string(),
            per_algorithm,
        }
    }
}

/// Select the predictions for the picked transcript.
///
/// The protein change key is tried first; splice variants fall back to the
/// gene key. Returns `None` if nothing matches.
pub fn merge(
    predictions: &PredictionMap,
    gene_id: &str,
    protein_change: Option<&str>,
    consequence: &str,
) -> Option<EffectPredictions> {
    let protein_key = protein_change
        .filter(|change| !change.is_empty() && *change != ".")
        .map(|change| format!("{}:{}", gene_id, change))
        .filter(|key| predictions.get(key).is_some());
    let key = match protein_key {
        Some(key) => key,
        None if consequence.contains("splice_") => gene_id.to_string(),
        None => return None,
    };
    predictions.get(&key).map(EffectPredictions::new)
}

//! Resolution of the packed `CSQ`/`DBNSFP` field layouts from the VCF header.

use std::{path::Path, sync::OnceLock};

use indexmap::IndexMap;
use noodles_vcf as vcf;
use regex::Regex;

use crate::{common::open_read_maybe_gz, err::SummariseError};

/// INFO key of the VEP consequence group.
pub const CSQ_TAG: &str = "CSQ";
/// INFO key of the dbNSFP effect prediction group.
pub const DBNSFP_TAG: &str = "DBNSFP";

/// Marker in the INFO description that precedes the field list.
const FORMAT_MARKER: &str = "Format:";

/// Index of the first algorithm column in the `DBNSFP` group.
pub const DBNSFP_FIRST_ALGORITHM: usize = 7;

/// Rewriting of VEP population frequency fields to internal names.
pub const CSQ_ALIASES: &[(&str, &str)] = &[
    ("gnomADe_AMR_AF", "AMR_AF_GNOMAD"),
    ("gnomADe_AFR_AF", "AFR_AF_GNOMAD"),
    ("gnomADe_EAS_AF", "EAS_AF_GNOMAD"),
    ("gnomADe_NFE_AF", "NFE_AF_GNOMAD"),
    ("gnomADe_AF", "GLOBAL_AF_GNOMAD"),
    ("gnomADe_SAS_AF", "SAS_AF_GNOMAD"),
    ("gnomADe_OTH_AF", "OTH_AF_GNOMAD"),
    ("gnomADe_ASJ_AF", "ASJ_AF_GNOMAD"),
    ("gnomADe_FIN_AF", "FIN_AF_GNOMAD"),
    ("AFR_AF", "AFR_AF_1KG"),
    ("AMR_AF", "AMR_AF_1KG"),
    ("SAS_AF", "SAS_AF_1KG"),
    ("EUR_AF", "EUR_AF_1KG"),
    ("EAS_AF", "EAS_AF_1KG"),
    ("AF", "GLOBAL_AF_1KG"),
];

/// Module with code for parsing the declared-tag TSV.
pub mod input {
    use serde::Deserialize;

    /// One row of the declared-tag table.
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
    pub struct InfoTag {
        /// INFO key.
        pub tag: String,
        /// VCF `Number` of the tag, e.g., `.` or `1`.
        pub number: String,
        /// VCF `Type` of the tag, e.g., `String` or `Flag`.
        #[serde(rename = "type")]
        pub ty: String,
        /// Human-readable description.
        pub description: String,
        /// Annotation source the tag belongs to.
        #[serde(default)]
        pub category: Option<String>,
    }
}

pub use input::InfoTag;

/// The declared INFO tags that the pipeline knows about, in file order.
#[derive(Debug, Clone, Default)]
pub struct InfoTagTable {
    tags: IndexMap<String, InfoTag>,
}

impl InfoTagTable {
    /// Load the table from a (possibly gzip-compressed) TSV file.
    pub fn from_path<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        tracing::debug!("loading INFO tag table from {:?}", path.as_ref());
        Self::from_reader(open_read_maybe_gz(path)?)
    }

    /// Load the table from a TSV reader; the first occurrence of a tag wins.
    pub fn from_reader<R>(reader: R) -> Result<Self, anyhow::Error>
    where
        R: std::io::Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(reader);
        let mut tags = IndexMap::new();
        for record in reader.deserialize() {
            let record: InfoTag =
                record.map_err(|e| anyhow::anyhow!("problem parsing INFO tag row: {}", e))?;
            if !tags.contains_key(&record.tag) {
                tags.insert(record.tag.clone(), record);
            }
        }
        Ok(Self { tags })
    }

    /// Restrict to the tags relevant for the output; `LoF*` tags are only
    /// kept when loss-of-function prediction is enabled.
    pub fn relevant(&self, lof_prediction: bool) -> Self {
        Self {
            tags: self
                .tags
                .iter()
                .filter(|(tag, _)| lof_prediction || !tag.starts_with("LoF"))
                .map(|(tag, info)| (tag.clone(), info.clone()))
                .collect(),
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn get(&self, tag: &str) -> Option<&InfoTag> {
        self.tags.get(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InfoTag> {
        self.tags.values()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Extract the field names following the `Format:` marker of an INFO description.
pub fn format_tokens(description: &str) -> Option<Vec<String>> {
    let (_, fields) = description.split_once(FORMAT_MARKER)?;
    Some(
        fields
            .split('|')
            .map(|token| token.replace('"', "").trim().to_string())
            .collect(),
    )
}

/// Resolved layout of the `CSQ` group.
///
/// Only positions whose (aliased) name is a declared tag are mapped to names.
/// The structural positions are resolved from the raw field list.
#[derive(Debug, Clone)]
pub struct CsqSchema {
    index_to_name: IndexMap<usize, String>,
    name_to_index: IndexMap<String, usize>,
    width: usize,
    pub pick: usize,
    pub symbol: usize,
    pub consequence: usize,
    pub feature_type: usize,
    pub feature: usize,
    pub biotype: usize,
}

impl CsqSchema {
    /// Build from the `Format:` tokens and the declared tags.
    pub fn resolve(tokens: &[String], tags: &InfoTagTable) -> Result<Self, SummariseError> {
        let mut index_to_name = IndexMap::new();
        let mut name_to_index = IndexMap::new();
        for (i, token) in tokens.iter().enumerate() {
            let name = CSQ_ALIASES
                .iter()
                .find(|(from, _)| from == token)
                .map(|(_, to)| *to)
                .unwrap_or(token.as_str());
            if tags.contains(name) {
                index_to_name.insert(i, name.to_string());
                name_to_index.insert(name.to_string(), i);
            } else {
                tracing::trace!("CSQ field #{} {:?} is not a declared tag", i, token);
            }
        }

        let required = |field: &str| {
            tokens
                .iter()
                .position(|token| token == field)
                .ok_or_else(|| SummariseError::RequiredCsqField {
                    field: field.to_string(),
                })
        };

        Ok(Self {
            index_to_name,
            name_to_index,
            width: tokens.len(),
            pick: required("PICK")?,
            symbol: required("SYMBOL")?,
            consequence: required("Consequence")?,
            feature_type: required("Feature_type")?,
            feature: required("Feature")?,
            biotype: required("BIOTYPE")?,
        })
    }

    /// Name projected from position `index`, if any.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.index_to_name.get(&index).map(String::as_str)
    }

    /// Position of the projected field `name`, if any.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Number of fields in the `Format:` description.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Split one packed entry into a name-indexed accessor.
    pub fn entry<'a>(&'a self, raw: &'a str) -> CsqEntry<'a> {
        CsqEntry {
            schema: self,
            values: raw.split('|').collect(),
        }
    }
}

/// One transcript consequence of the `CSQ` group.
#[derive(Debug, Clone)]
pub struct CsqEntry<'a> {
    schema: &'a CsqSchema,
    values: Vec<&'a str>,
}

impl<'a> CsqEntry<'a> {
    /// Raw value at `index`; `None` for positions beyond the entry.
    pub fn at(&self, index: usize) -> Option<&'a str> {
        self.values.get(index).copied()
    }

    /// Non-empty value of the projected field `name`.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.schema
            .index_of(name)
            .and_then(|i| self.at(i))
            .filter(|value| !value.is_empty())
    }

    /// The `&`-separated consequence terms.
    pub fn consequence(&self) -> Option<&'a str> {
        self.at(self.schema.consequence).filter(|value| !value.is_empty())
    }

    /// The transcript (or other feature) identifier.
    pub fn feature(&self) -> Option<&'a str> {
        self.at(self.schema.feature).filter(|value| !value.is_empty())
    }

    /// Whether VEP picked this consequence as the primary one.
    pub fn is_picked(&self) -> bool {
        self.at(self.schema.pick) == Some("1")
    }

    /// Iterate over `(name, value)` of all projected, non-empty positions.
    pub fn projected(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        let schema = self.schema;
        self.values.iter().enumerate().filter_map(move |(i, value)| {
            match (schema.index_to_name.get(&i), value.is_empty()) {
                (Some(name), false) => Some((name.as_str(), *value)),
                _ => None,
            }
        })
    }

    /// The `Consequence:SYMBOL:Feature_type:Feature:BIOTYPE` summary string.
    pub fn summary(&self) -> String {
        let symbol = match self.at(self.schema.symbol) {
            Some(symbol) if !symbol.is_empty() => symbol,
            _ => ".",
        };
        format!(
            "{}:{}:{}:{}:{}",
            self.at(self.schema.consequence).unwrap_or_default(),
            symbol,
            self.at(self.schema.feature_type).unwrap_or_default(),
            self.at(self.schema.feature).unwrap_or_default(),
            self.at(self.schema.biotype).unwrap_or_default(),
        )
    }
}

/// Names of the prediction algorithms of the `DBNSFP` group.
pub fn prediction_algorithms(tokens: &[String]) -> Vec<String> {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let suffix =
        SUFFIX.get_or_init(|| Regex::new(r#"((_score)|(_pred))"*$"#).expect("valid regex"));
    tokens
        .iter()
        .skip(DBNSFP_FIRST_ALGORITHM)
        .map(|token| suffix.replace(token, "").to_string())
        .collect()
}

/// The schema information extracted from one VCF header.
#[derive(Debug, Clone)]
pub struct HeaderSchema {
    pub csq: CsqSchema,
    pub algorithms: Vec<String>,
}

/// Description of INFO `tag` in `header`, if defined.
fn info_description<'a>(header: &'a vcf::Header, tag: &str) -> Option<&'a str> {
    let key: vcf::record::info::field::Key = tag.parse().ok()?;
    header.infos().get(&key).map(|info| info.description())
}

impl HeaderSchema {
    /// Resolve the `CSQ` (mandatory) and `DBNSFP` (optional) layouts.
    pub fn from_header(header: &vcf::Header, tags: &InfoTagTable) -> Result<Self, SummariseError> {
        let csq_tokens = info_description(header, CSQ_TAG)
            .and_then(format_tokens)
            .ok_or_else(|| SummariseError::SchemaMissing {
                tag: CSQ_TAG.to_string(),
            })?;
        let csq = CsqSchema::resolve(&csq_tokens, tags)?;

        let algorithms = match info_description(header, DBNSFP_TAG) {
            None => Vec::new(),
            Some(description) => match format_tokens(description) {
                Some(tokens) => prediction_algorithms(&tokens),
                None => {
                    tracing::warn!(
                        "INFO/{} has no 'Format:' description, effect predictions disabled",
                        DBNSFP_TAG
                    );
                    Vec::new()
                }
            },
        };

        tracing::debug!(
            "CSQ fields: {} ({} projected), prediction algorithms: {:?}",
            csq.width(),
            csq.index_to_name.len(),
            &algorithms
        );
        Ok(Self { csq, algorithms })
    }
}

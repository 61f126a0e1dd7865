//! Transcript to gene attribute cross-reference table.

use std::{collections::HashMap, path::Path};

use indexmap::IndexMap;

use crate::{common::read_lines, err::SummariseError};

/// INFO key of the on-record cross-reference group.
pub const XREF_TAG: &str = "GVANNO_XREF";

/// Attributes that are written as VCF flags.
pub const FLAG_ATTRIBUTES: &[&str] = &["TUMOR_SUPPRESSOR", "ONCOGENE"];

/// Column layout of the current (13 column) cross-reference files.
const ATTRIBUTES_V2: &[&str] = &[
    "ENSEMBL_TRANSCRIPT_ID",
    "ENSEMBL_GENE_ID",
    "SYMBOL",
    "ENTREZ_ID",
    "UNIPROT_ID",
    "APPRIS",
    "UNIPROT_ACC",
    "REFSEQ_MRNA",
    "CORUM_ID",
    "TUMOR_SUPPRESSOR",
    "ONCOGENE",
    "DISGENET_CUI",
    "MIM_PHENOTYPE_ID",
];

/// Column layout of the legacy (11 column) cross-reference files.
const ATTRIBUTES_V1: &[&str] = &[
    "ENSEMBL_TRANSCRIPT_ID",
    "ENSEMBL_GENE_ID",
    "SYMBOL",
    "ENTREZ_ID",
    "UNIPROT_ID",
    "APPRIS",
    "REFSEQ_MRNA",
    "ONCOGENE",
    "TUMOR_SUPPRESSOR",
    "DISGENET_CUI",
    "MIM_PHENOTYPE_ID",
];

/// Prefixes used for partitioning VEP's `Existing_variation` identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownVariantScheme {
    /// Prefixes of COSMIC mutation identifiers.
    pub cosmic: &'static [&'static str],
    /// Prefixes of dbSNP identifiers.
    pub dbsnp: &'static [&'static str],
}

/// Versioned layout of the cross-reference data.
#[derive(
    clap::ValueEnum,
    Clone,
    Copy,
    Debug,
    Default,
    strum::Display,
    PartialEq,
    Eq,
    Hash,
)]
pub enum XrefLayout {
    /// Legacy 11 column layout.
    #[strum(serialize = "v1")]
    V1,
    /// Current 13 column layout.
    #[default]
    #[strum(serialize = "v2")]
    V2,
}

impl XrefLayout {
    /// Parse a declared layout version such as `v1` or `2`.
    pub fn from_version(version: &str) -> Result<Self, SummariseError> {
        let version = version.trim().to_ascii_lowercase();
        let version = version.strip_prefix('v').unwrap_or(&version);
        match version {
            "1" => Ok(XrefLayout::V1),
            "2" => Ok(XrefLayout::V2),
            _ => Err(SummariseError::InvalidXrefLayout(version.to_string())),
        }
    }

    /// Attribute name for each column.
    pub fn attributes(&self) -> &'static [&'static str] {
        match self {
            XrefLayout::V1 => ATTRIBUTES_V1,
            XrefLayout::V2 => ATTRIBUTES_V2,
        }
    }

    /// Identifier prefixes matching the annotation data of this layout.
    pub fn known_variant_scheme(&self) -> KnownVariantScheme {
        match self {
            XrefLayout::V1 => KnownVariantScheme {
                cosmic: &["COSM", "COSN"],
                dbsnp: &["rs"],
            },
            XrefLayout::V2 => KnownVariantScheme {
                cosmic: &["COSM"],
                dbsnp: &["rs"],
            },
        }
    }
}

/// Interpret a flag attribute value.
fn is_truthy(value: &str) -> bool {
    !value.is_empty() && !value.eq_ignore_ascii_case("false") && value != "0"
}

/// Gene level attributes of one transcript; empty values are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XrefEntry {
    attributes: IndexMap<&'static str, String>,
}

impl XrefEntry {
    /// Value of attribute `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the flag attribute `name` is set.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).map(is_truthy).unwrap_or(false)
    }

    /// Iterate attributes in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
    }
}

/// Parse one line/entry; returns `None` for entries without transcript id.
pub fn parse_entry(line: &str, layout: XrefLayout) -> Option<(String, XrefEntry)> {
    let values = line.split(['|', ';']).collect::<Vec<_>>();
    let transcript_id = values.first().filter(|id| !id.is_empty())?.to_string();
    let attributes = layout
        .attributes()
        .iter()
        .zip(values.iter())
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (*name, value.to_string()))
        .collect();
    Some((transcript_id, XrefEntry { attributes }))
}

/// Mapping from transcript identifier to `XrefEntry`.
#[derive(Debug, Clone, Default)]
pub struct XrefTable {
    layout: XrefLayout,
    entries: HashMap<String, XrefEntry>,
}

impl XrefTable {
    /// Create empty table.
    pub fn new(layout: XrefLayout) -> Self {
        Self {
            layout,
            entries: HashMap::new(),
        }
    }

    /// Load side file at `path`.
    ///
    /// A `#layout=<version>` comment line declares the layout, overriding
    /// `layout`. Other `#` lines and blank lines are skipped.
    pub fn from_path<P>(path: P, layout: XrefLayout) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path>,
    {
        tracing::debug!("loading cross-reference table from {:?}", path.as_ref());
        let lines = read_lines(path.as_ref())?;

        let mut layout = layout;
        for line in lines.iter().take_while(|line| line.starts_with('#')) {
            if let Some(version) = line.trim_start_matches('#').trim().strip_prefix("layout=") {
                layout = XrefLayout::from_version(version)?;
            }
        }

        let mut result = Self::new(layout);
        for line in &lines {
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            result.insert_line(line);
        }
        Ok(result)
    }

    /// Build from an on-record packed group of comma-separated entries.
    pub fn from_packed(packed: &str, layout: XrefLayout) -> Self {
        let mut result = Self::new(layout);
        for entry in packed.split(',') {
            result.insert_line(entry);
        }
        result
    }

    fn insert_line(&mut self, line: &str) {
        if let Some((transcript_id, entry)) = parse_entry(line, self.layout) {
            self.entries.insert(transcript_id, entry);
        }
    }

    /// Look up attributes of `transcript_id`.
    pub fn get(&self, transcript_id: &str) -> Option<&XrefEntry> {
        self.entries.get(transcript_id)
    }

    pub fn layout(&self) -> XrefLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Error types of the summarisation pipeline.

use std::process::{ExitCode, Termination};

/// Fatal errors of the `seqvars summarise` pipeline.
///
/// Recoverable anomalies (records without `CSQ`, cross-reference misses) are
/// logged and never surface as errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SummariseError {
    /// The VCF header lacks the INFO definition or its `Format:` description.
    #[error("INFO/{tag} header description has no 'Format:' field list")]
    SchemaMissing { tag: String },
    /// A field needed for summarising is missing from the `CSQ` format.
    #[error("INFO/CSQ format lacks required field {field:?}")]
    RequiredCsqField { field: String },
    /// Unknown cross-reference layout version.
    #[error("invalid cross-reference layout: {0:?}")]
    InvalidXrefLayout(String),
    /// The main pass did not produce any variant.
    #[error(
        "No remaining PASS variants found in query VCF {path} - exiting and skipping pass filter"
    )]
    NoSurvivingVariants { path: String },
}

impl Termination for SummariseError {
    fn report(self) -> ExitCode {
        match self {
            SummariseError::SchemaMissing { .. } | SummariseError::RequiredCsqField { .. } => {
                ExitCode::from(1)
            }
            SummariseError::InvalidXrefLayout(_) => ExitCode::from(2),
            SummariseError::NoSurvivingVariants { .. } => ExitCode::from(3),
        }
    }
}

//! Implementation of `seqvars pass-filter` subcommand.

use std::{path::Path, sync::OnceLock};

use noodles_vcf as vcf;
use regex::Regex;
use thousands::Separable;

use crate::{
    common::{self, noodles::tbi_path, open_read_maybe_gz},
    seqvars::summarise::record::FilterStatus,
};

/// Command line arguments for `seqvars pass-filter` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "keep PASS variants of a VCF", long_about = None)]
pub struct Args {
    /// Path to input file.
    #[clap(long)]
    pub path_in: String,
    /// Path to output file; derived from `--path-in` if omitted.
    #[clap(long)]
    pub path_out: Option<String>,
}

/// Number of records written and dropped by `write_pass_vcf`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCounts {
    pub passed: usize,
    pub rejected: usize,
}

/// Copy the passing records of `path_in` into the BGZF-compressed and
/// tabix-indexed `path_out`.
pub fn write_pass_vcf<P, Q>(path_in: P, path_out: Q) -> Result<PassCounts, anyhow::Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut reader = vcf::Reader::new(open_read_maybe_gz(path_in.as_ref()).map_err(|e| {
        anyhow::anyhow!("could not open input file {:?}: {}", path_in.as_ref(), e)
    })?);
    let header = reader
        .read_header()
        .map_err(|e| anyhow::anyhow!("problem reading VCF header: {}", e))?;
    let mut writer = common::noodles::open_bgzf_vcf_writer(path_out.as_ref(), &header)?;

    let mut counts = PassCounts::default();
    for record in reader.records(&header) {
        let record = record.map_err(|e| anyhow::anyhow!("problem reading record: {}", e))?;
        if FilterStatus::from(record.filters()).is_pass() {
            writer
                .write_record(&header, &record)
                .map_err(|e| anyhow::anyhow!("problem writing record: {}", e))?;
            counts.passed += 1;
        } else {
            counts.rejected += 1;
        }
    }
    common::noodles::finish_bgzf_vcf_writer(writer)?;

    tracing::info!(
        "Number of non-PASS/REJECTED variant calls: {}",
        counts.rejected.separate_with_commas()
    );
    tracing::info!(
        "Number of PASSed variant calls: {}",
        counts.passed.separate_with_commas()
    );
    if counts.passed == 0 {
        tracing::warn!(
            "There are zero variants with a 'PASS' filter in the VCF file {:?}",
            path_in.as_ref()
        );
    }

    common::noodles::build_tbi(path_out.as_ref(), tbi_path(path_out.as_ref()))?;

    Ok(counts)
}

/// Matches the `.vcf[.gz]` suffix of a path.
pub fn vcf_suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\.vcf)?(\.gz)?$").expect("valid regex"))
}

/// Output path for the pass-filtered version of `path_in`.
///
/// `X.vcf.gz` (or `X.vcf`) becomes `X.pass.vcf.gz`.
pub fn pass_path(path_in: &str) -> String {
    vcf_suffix_regex()
        .replace(path_in, ".pass.vcf.gz")
        .into_owned()
}

/// Main entry point for `seqvars pass-filter` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    let path_out = args
        .path_out
        .clone()
        .unwrap_or_else(|| pass_path(&args.path_in));
    tracing::info!("writing PASS variants to {}", &path_out);
    write_pass_vcf(&args.path_in, &path_out)?;

    tracing::info!(
        "All of `seqvars pass-filter` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}

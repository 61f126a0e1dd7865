//! Implementation of `seqvars summarise` subcommand.

use std::io::{BufRead, Write};

use noodles_vcf as vcf;
use thousands::Separable;

use crate::{
    common::{self, noodles::tbi_path, open_read_maybe_gz},
    err::SummariseError,
    seqvars::pass_filter,
};

use self::{
    coding::CodingInput,
    predictions::PredictionMap,
    record::VariantRecord,
    schema::{CsqEntry, HeaderSchema, InfoTagTable},
    xref::{KnownVariantScheme, XrefLayout, XrefTable},
};

pub mod coding;
pub mod header;
pub mod predictions;
pub mod protein;
pub mod record;
pub mod schema;
pub mod xref;

/// Command line arguments for `seqvars summarise` subcommand.
#[derive(Debug, clap::Parser)]
#[command(author, version, about = "summarise VEP consequences of a VCF", long_about = None)]
pub struct Args {
    /// Path to the VEP-annotated input VCF.
    #[clap(long)]
    pub path_in: String,
    /// Path to the TSV with the declared INFO tags.
    #[clap(long)]
    pub path_info_tags: String,
    /// Path to the transcript cross-reference table; optional.
    #[clap(long)]
    pub path_xref: Option<String>,
    /// Layout of the cross-reference data, unless declared by the file.
    #[clap(long, value_enum, default_value_t = XrefLayout::V2)]
    pub xref_layout: XrefLayout,
    /// Whether loss-of-function prediction tags are kept.
    #[clap(long)]
    pub lof_prediction: bool,
    /// Path to the output file; derived from `--path-in` if omitted.
    #[clap(long)]
    pub path_out: Option<String>,
    /// Do not write the PASS-only output.
    #[clap(long)]
    pub skip_pass_filter: bool,
}

/// Result of `Summariser::process`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Derived fields were added; the record is to be written.
    Annotated,
    /// The record has no consequence annotation and is dropped.
    Skipped,
}

const PFAM_PREFIXES: &[&str] = &["Pfam_domain:", "Pfam:"];

/// Pfam identifier from VEP's `DOMAINS` without version suffix.
fn pfam_domain(domains: &str) -> Option<&str> {
    let domain = domains.split('&').find_map(|token| {
        PFAM_PREFIXES
            .iter()
            .find_map(|prefix| token.strip_prefix(prefix))
    })?;
    match domain.rsplit_once('.') {
        Some((id, version))
            if !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()) =>
        {
            Some(id)
        }
        _ => Some(domain),
    }
}

/// Split `Existing_variation` into COSMIC and dbSNP identifiers.
fn partition_known_variants<'a>(
    existing_variation: &'a str,
    scheme: &KnownVariantScheme,
) -> (Vec<&'a str>, Vec<&'a str>) {
    let mut cosmic = Vec::new();
    let mut dbsnp = Vec::new();
    for id in existing_variation.split('&') {
        if scheme.cosmic.iter().any(|prefix| id.starts_with(prefix)) {
            cosmic.push(id);
        } else if scheme.dbsnp.iter().any(|prefix| id.starts_with(prefix)) {
            dbsnp.push(id);
        }
    }
    (cosmic, dbsnp)
}

/// Adds the derived fields to the records of one VCF file.
#[derive(Debug)]
pub struct Summariser {
    schema: HeaderSchema,
    /// Global side table; its layout may differ from `record_layout`.
    xref: XrefTable,
    /// Layout of the on-record cross-reference groups.
    record_layout: XrefLayout,
}

impl Summariser {
    pub fn new(schema: HeaderSchema, xref: XrefTable, record_layout: XrefLayout) -> Self {
        Self {
            schema,
            xref,
            record_layout,
        }
    }

    /// Add the derived fields to `record`.
    pub fn process(&self, record: &mut VariantRecord) -> Outcome {
        let csq = match record.csq.clone() {
            Some(csq) => csq,
            None => {
                tracing::warn!(
                    "Record {} does not have CSQ tag from variant effect predictor \
                    (vep_skip_intergenic in config set to true?) - variant will be skipped",
                    record.variant_id()
                );
                return Outcome::Skipped;
            }
        };

        let local_xref = record
            .xref
            .as_deref()
            .map(|packed| XrefTable::from_packed(packed, self.record_layout));

        let mut summaries = Vec::new();
        for raw in csq.split(',') {
            let entry = self.schema.csq.entry(raw);
            if entry.is_picked() {
                self.project(record, &entry, local_xref.as_ref());
            }
            summaries.push(entry.summary());
        }

        if let Some(dbnsfp) = record.dbnsfp.clone() {
            if !self.schema.algorithms.is_empty() {
                self.merge_predictions(record, &dbnsfp);
            }
        }

        record.set_field("VEP_ALL_CONSEQUENCE", summaries.join(","));
        Outcome::Annotated
    }

    /// Write the fields of the picked consequence entry.
    fn project(&self, record: &mut VariantRecord, entry: &CsqEntry, local: Option<&XrefTable>) {
        for (name, value) in entry.projected() {
            record.set_field(name, value);
            match name {
                "DOMAINS" => {
                    if let Some(pfam) = pfam_domain(value) {
                        record.set_field("PFAM_DOMAIN", pfam);
                    }
                }
                "Existing_variation" => {
                    let scheme = self.record_layout.known_variant_scheme();
                    let (cosmic, dbsnp) = partition_known_variants(value, &scheme);
                    if !cosmic.is_empty() {
                        record.set_field("COSMIC_MUTATION_ID", cosmic.join("&"));
                    }
                    if !dbsnp.is_empty() {
                        record.set_field("DBSNPRSID", dbsnp.join("&"));
                    }
                }
                _ => (),
            }
        }

        if let Some(feature) = entry.feature() {
            let xref = local
                .and_then(|table| table.get(feature))
                .or_else(|| self.xref.get(feature));
            match xref {
                Some(xref) => {
                    for (attribute, value) in xref.iter() {
                        if xref::FLAG_ATTRIBUTES.contains(&attribute) {
                            record.set_flag(attribute, xref.flag(attribute));
                        } else {
                            record.set_field(attribute, value);
                        }
                    }
                }
                None => tracing::trace!(
                    "no cross-reference for {} of {}",
                    feature,
                    record.variant_id()
                ),
            }
        }

        let change = coding::compose(&CodingInput::from_entry(entry));
        record.set_field("HGVSp_short", change.protein_change);
        record.set_field("CDS_CHANGE", change.cds_change);
        if let Some(start) = change.amino_acid_start {
            record.set_field("AMINO_ACID_START", start.to_string());
        }
        if let Some(end) = change.amino_acid_end {
            record.set_field("AMINO_ACID_END", end.to_string());
        }
    }

    fn merge_predictions(&self, record: &mut VariantRecord, dbnsfp: &str) {
        let map = PredictionMap::parse(dbnsfp, &self.schema.algorithms);
        let merged = match (record.field("Gene"), record.field("Consequence")) {
            (Some(gene_id), Some(consequence)) => predictions::merge(
                &map,
                gene_id,
                record.field("HGVSp_short"),
                consequence,
            ),
            _ => None,
        };
        if let Some(merged) = merged {
            record.set_field(predictions::EFFECT_PREDICTIONS, merged.summary);
            for (tag, value) in merged.per_algorithm {
                record.set_field(tag, value);
            }
        }
    }
}

/// Counts emitted records per chromosome and overall.
#[derive(Debug, Default)]
pub struct ChromosomeProgress {
    chrom: Option<String>,
    count: usize,
    total: usize,
}

impl ChromosomeProgress {
    /// Register the chromosome of the next record.
    pub fn observe(&mut self, chrom: &str) {
        if self.chrom.as_deref() == Some(chrom) {
            return;
        }
        if let Some(previous) = &self.chrom {
            tracing::info!(
                "Completed summary of functional annotations for {} variants on chromosome {}",
                self.count.separate_with_commas(),
                previous
            );
        }
        self.chrom = Some(chrom.to_string());
        self.count = 0;
    }

    pub fn increment(&mut self) {
        self.count += 1;
        self.total += 1;
    }

    /// Emitted records on the current chromosome.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Log the final count and return the total.
    pub fn finish(self) -> usize {
        if let Some(chrom) = &self.chrom {
            tracing::info!(
                "Completed summary of functional annotations for {} variants on chromosome {}",
                self.count.separate_with_commas(),
                chrom
            );
        }
        self.total
    }
}

/// Process the variants from `input_reader` to `output_writer`; returns the
/// number of records written.
pub fn process_variants<R, W>(
    input_reader: &mut vcf::Reader<R>,
    input_header: &vcf::Header,
    output_writer: &mut vcf::Writer<W>,
    output_header: &vcf::Header,
    summariser: &Summariser,
) -> Result<usize, anyhow::Error>
where
    R: BufRead,
    W: Write,
{
    let start = std::time::Instant::now();
    let mut progress = ChromosomeProgress::default();
    for vcf_record in input_reader.records(input_header) {
        let mut vcf_record =
            vcf_record.map_err(|e| anyhow::anyhow!("problem reading record: {}", e))?;
        let mut record = VariantRecord::from_vcf(&vcf_record)?;
        progress.observe(&record.chrom);

        if summariser.process(&mut record) == Outcome::Skipped {
            continue;
        }
        record.apply_to(output_header, &mut vcf_record)?;
        output_writer
            .write_record(output_header, &vcf_record)
            .map_err(|e| anyhow::anyhow!("problem writing record: {}", e))?;
        progress.increment();
    }

    let total = progress.finish();
    tracing::info!(
        "... summarised {} records in {:?}",
        total.separate_with_commas(),
        start.elapsed()
    );
    Ok(total)
}

/// Output path for the annotated version of `path_in`.
///
/// `X.vcf.gz` (or `X.vcf`) becomes `X.annotated.vcf.gz`.
pub fn annotated_path(path_in: &str) -> String {
    pass_filter::vcf_suffix_regex()
        .replace(path_in, ".annotated.vcf.gz")
        .into_owned()
}

/// Main entry point for `seqvars summarise` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = std::time::Instant::now();
    tracing::info!("vep-summary-worker {}", common::worker_version());
    tracing::info!("args_common = {:#?}", &args_common);
    tracing::info!("args = {:#?}", &args);

    common::trace_rss_now();

    tracing::info!("loading INFO tag table...");
    let tags = InfoTagTable::from_path(&args.path_info_tags)
        .map_err(|e| anyhow::anyhow!("problem loading INFO tags: {}", e))?
        .relevant(args.lof_prediction);
    tracing::info!("... loaded {} tags", tags.len().separate_with_commas());

    let xref = match &args.path_xref {
        Some(path_xref) => {
            tracing::info!("loading cross-reference table...");
            let xref = XrefTable::from_path(path_xref, args.xref_layout)?;
            tracing::info!(
                "... loaded {} transcripts ({} layout)",
                xref.len().separate_with_commas(),
                xref.layout()
            );
            xref
        }
        None => XrefTable::new(args.xref_layout),
    };

    tracing::info!("opening input file...");
    let mut input_reader = vcf::Reader::new(open_read_maybe_gz(&args.path_in).map_err(|e| {
        anyhow::anyhow!("could not open input file {}: {}", &args.path_in, e)
    })?);

    tracing::info!("processing header...");
    let input_header = input_reader
        .read_header()
        .map_err(|e| anyhow::anyhow!("problem reading VCF header: {}", e))?;
    let schema = HeaderSchema::from_header(&input_header, &tags)?;
    let output_header = header::build_output_header(&input_header, &tags)
        .map_err(|e| anyhow::anyhow!("problem building output header: {}", e))?;

    let path_out = args
        .path_out
        .clone()
        .unwrap_or_else(|| annotated_path(&args.path_in));
    tracing::info!("writing output to {}", &path_out);
    let mut output_writer = common::noodles::open_bgzf_vcf_writer(&path_out, &output_header)?;

    let summariser = Summariser::new(schema, xref, args.xref_layout);
    let written = process_variants(
        &mut input_reader,
        &input_header,
        &mut output_writer,
        &output_header,
        &summariser,
    )?;
    common::noodles::finish_bgzf_vcf_writer(output_writer)?;

    let output_size = std::fs::metadata(&path_out)
        .map(|metadata| metadata.len())
        .unwrap_or_default();
    if written == 0 || output_size == 0 {
        // the header-only output is not indexed and not kept
        if let Err(e) = std::fs::remove_file(&path_out) {
            tracing::warn!("could not remove {}: {}", &path_out, e);
        }
        return Err(SummariseError::NoSurvivingVariants {
            path: args.path_in.clone(),
        }
        .into());
    }

    tracing::info!("building tabix index...");
    common::noodles::build_tbi(&path_out, tbi_path(&path_out))?;

    if args.skip_pass_filter {
        tracing::info!("skipping PASS filter as requested");
    } else {
        let path_pass = pass_filter::pass_path(&path_out);
        tracing::info!("writing PASS variants to {}", &path_pass);
        pass_filter::write_pass_vcf(&path_out, &path_pass)?;
    }

    common::trace_rss_now();
    tracing::info!(
        "All of `seqvars summarise` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tracing_test::traced_test;

    use super::*;

    const EXAMPLE: &str = "tests/data/seqvars/summarise/example.vcf";
    const XREF: &str = "tests/data/seqvars/summarise/xref.tsv";

    fn summariser(xref: XrefTable) -> Result<(Summariser, vcf::Header), anyhow::Error> {
        let mut reader = vcf::Reader::new(open_read_maybe_gz(EXAMPLE)?);
        let header = reader.read_header()?;
        let tags = schema::test::tag_table().relevant(false);
        let schema = HeaderSchema::from_header(&header, &tags)?;
        Ok((Summariser::new(schema, xref, XrefLayout::V2), header))
    }

    fn example_records() -> Result<Vec<VariantRecord>, anyhow::Error> {
        let mut reader = vcf::Reader::new(open_read_maybe_gz(EXAMPLE)?);
        let header = reader.read_header()?;
        reader
            .records(&header)
            .map(|record| VariantRecord::from_vcf(&record?))
            .collect()
    }

    fn args(path_in: &str, path_out: &Path) -> Args {
        Args {
            path_in: path_in.into(),
            path_info_tags: "tests/data/seqvars/summarise/info_tags.tsv".into(),
            path_xref: Some(XREF.into()),
            xref_layout: XrefLayout::V2,
            lof_prediction: false,
            path_out: Some(path_out.to_string_lossy().into_owned()),
            skip_pass_filter: false,
        }
    }

    #[rstest]
    #[case("Pfam_domain:PF00870.14&Prints_domain:PR00386", Some("PF00870"))]
    #[case("Gene3D:1&Pfam:PF07714", Some("PF07714"))]
    #[case("Pfam:PF07714.abc", Some("PF07714.abc"))]
    #[case("Gene3D:1", None)]
    fn pfam_domain_cases(#[case] domains: &str, #[case] expected: Option<&str>) {
        assert_eq!(pfam_domain(domains), expected);
    }

    #[rstest]
    #[case(XrefLayout::V2, vec!["COSM10648"], vec!["rs28934578"])]
    #[case(XrefLayout::V1, vec!["COSM10648", "COSN123"], vec!["rs28934578"])]
    fn partition_known_variants_per_layout(
        #[case] layout: XrefLayout,
        #[case] cosmic: Vec<&str>,
        #[case] dbsnp: Vec<&str>,
    ) {
        assert_eq!(
            partition_known_variants(
                "rs28934578&COSM10648&COSN123&CM920677",
                &layout.known_variant_scheme()
            ),
            (cosmic, dbsnp)
        );
    }

    #[rstest]
    #[case("sample.vcf.gz", "sample.annotated.vcf.gz")]
    #[case("dir/sample.vcf", "dir/sample.annotated.vcf.gz")]
    fn annotated_path_cases(#[case] path_in: &str, #[case] expected: &str) {
        assert_eq!(annotated_path(path_in), expected);
    }

    #[test]
    fn process_tp53() -> Result<(), anyhow::Error> {
        let (summariser, _) = summariser(XrefTable::new(XrefLayout::V2))?;
        let mut record = example_records()?.remove(1);

        assert_eq!(summariser.process(&mut record), Outcome::Annotated);

        assert_eq!(record.field("SYMBOL"), Some("TP53"));
        assert_eq!(record.field("Feature"), Some("ENST00000269305"));
        assert_eq!(record.field("HGVSp_short"), Some("p.R175H"));
        assert_eq!(
            record.field("CDS_CHANGE"),
            Some("missense_variant:ENST00000269305.4:c.524G>A:exon5:p.R175H")
        );
        assert_eq!(record.field("AMINO_ACID_START"), Some("175"));
        assert_eq!(record.field("AMINO_ACID_END"), Some("175"));
        assert_eq!(record.field("PFAM_DOMAIN"), Some("PF00870"));
        assert_eq!(record.field("COSMIC_MUTATION_ID"), Some("COSM10648"));
        assert_eq!(record.field("DBSNPRSID"), Some("rs28934578"));
        assert_eq!(record.field("GLOBAL_AF_GNOMAD"), Some("0.00001"));
        assert!(record.flag("TUMOR_SUPPRESSOR"));
        assert!(!record.flag("ONCOGENE"));
        assert_eq!(record.field("CORUM_ID"), Some("5454"));
        assert_eq!(
            record.field("EFFECT_PREDICTIONS"),
            Some("sift:D&provean:D&mutationtaster:D")
        );
        assert_eq!(record.field("SIFT_DBNSFP"), Some("D"));
        assert_eq!(record.field("MUTATIONTASTER_DBNSFP"), Some("D"));
        // undeclared fields are not projected
        assert_eq!(record.field("INTRON"), None);
        assert_eq!(record.field("AFR_AF_1KG"), None);

        Ok(())
    }

    #[test]
    fn process_consequence_summary_order() -> Result<(), anyhow::Error> {
        let (summariser, _) = summariser(XrefTable::new(XrefLayout::V2))?;
        let mut record = example_records()?.remove(1);
        summariser.process(&mut record);

        let summary = record
            .field("VEP_ALL_CONSEQUENCE")
            .map(|summary| summary.split(',').collect::<Vec<_>>());
        assert_eq!(
            summary,
            Some(vec![
                "missense_variant:TP53:Transcript:ENST00000269305:protein_coding",
                "intron_variant:TP53:Transcript:ENST00000413465:protein_coding",
            ])
        );

        Ok(())
    }

    #[test]
    fn process_global_xref() -> Result<(), anyhow::Error> {
        let (summariser, _) = summariser(XrefTable::from_path(XREF, XrefLayout::V2)?)?;
        let mut records = example_records()?;

        let egfr = &mut records[0];
        summariser.process(egfr);
        assert!(egfr.flag("ONCOGENE"));
        assert_eq!(egfr.field("ENTREZ_ID"), Some("1956"));
        assert_eq!(egfr.field("PFAM_DOMAIN"), Some("PF07714"));
        assert_eq!(egfr.field("HGVSp_short"), Some("p.T790M"));

        // the on-record group takes precedence over the global table
        let tp53 = &mut records[1];
        summariser.process(tp53);
        assert!(tp53.flag("TUMOR_SUPPRESSOR"));
        assert_eq!(tp53.field("CORUM_ID"), Some("5454"));

        Ok(())
    }

    #[test]
    fn process_record_layout_independent_of_side_file() -> Result<(), anyhow::Error> {
        let side = XrefTable::from_path(
            "tests/data/seqvars/summarise/xref_v1.tsv",
            XrefLayout::V2,
        )?;
        assert_eq!(side.layout(), XrefLayout::V1);
        let (summariser, _) = summariser(side)?;
        let mut records = example_records()?;

        // side file entries use the legacy columns
        let egfr = &mut records[0];
        summariser.process(egfr);
        assert!(egfr.flag("ONCOGENE"));
        assert_eq!(egfr.field("REFSEQ_MRNA"), Some("NM_005228"));

        // on-record group keeps the 13 column layout
        let tp53 = &mut records[1];
        summariser.process(tp53);
        assert_eq!(tp53.field("REFSEQ_MRNA"), Some("NM_000546"));
        assert_eq!(tp53.field("UNIPROT_ACC"), Some("P04637"));
        assert_eq!(tp53.field("CORUM_ID"), Some("5454"));
        assert!(tp53.flag("TUMOR_SUPPRESSOR"));
        assert!(!tp53.flag("ONCOGENE"));

        Ok(())
    }

    #[test]
    fn process_synonymous() -> Result<(), anyhow::Error> {
        let (summariser, _) = summariser(XrefTable::new(XrefLayout::V2))?;
        let mut record = example_records()?.remove(3);
        summariser.process(&mut record);

        assert_eq!(record.field("HGVSp_short"), Some("p.P72P"));
        assert_eq!(
            record.field("CDS_CHANGE"),
            Some("synonymous_variant:ENST00000269305.4:c.216C>T:exon4:p.P72P")
        );
        assert_eq!(record.field("EFFECT_PREDICTIONS"), None);

        Ok(())
    }

    #[traced_test]
    #[test]
    fn process_skips_missing_csq() -> Result<(), anyhow::Error> {
        let (summariser, _) = summariser(XrefTable::new(XrefLayout::V2))?;
        let mut record = example_records()?.remove(2);

        assert_eq!(summariser.process(&mut record), Outcome::Skipped);
        assert_eq!(record.fields().count(), 0);
        assert!(logs_contain("g.17:7578500A>G"));

        Ok(())
    }

    #[test]
    fn process_variants_counts_emitted() -> Result<(), anyhow::Error> {
        let (summariser, header) = summariser(XrefTable::new(XrefLayout::V2))?;
        let tags = schema::test::tag_table().relevant(false);
        let output_header = header::build_output_header(&header, &tags)?;

        let mut reader = vcf::Reader::new(open_read_maybe_gz(EXAMPLE)?);
        let input_header = reader.read_header()?;
        let mut writer = vcf::Writer::new(Vec::new());
        writer.write_header(&output_header)?;
        let written = process_variants(
            &mut reader,
            &input_header,
            &mut writer,
            &output_header,
            &summariser,
        )?;

        assert_eq!(written, 3);
        let output = String::from_utf8(writer.get_ref().clone())?;
        assert_eq!(
            output.lines().filter(|line| !line.starts_with('#')).count(),
            3
        );
        assert!(!output.contains("7578500"));

        Ok(())
    }

    #[test]
    fn chromosome_progress() {
        let mut progress = ChromosomeProgress::default();
        progress.observe("7");
        progress.increment();
        progress.observe("17");
        assert_eq!(progress.count(), 0);
        progress.increment();
        progress.observe("17");
        progress.increment();
        assert_eq!(progress.count(), 2);
        assert_eq!(progress.finish(), 3);
    }

    #[test]
    fn run_example() -> Result<(), anyhow::Error> {
        let tmpdir = temp_testdir::TempDir::default();
        let path_out = tmpdir.join("example.annotated.vcf.gz");

        run(&crate::common::Args::default(), &args(EXAMPLE, &path_out))?;

        assert!(Path::new(&tbi_path(&path_out)).exists());
        let path_pass = tmpdir.join("example.annotated.pass.vcf.gz");
        assert!(path_pass.exists());
        assert!(Path::new(&tbi_path(&path_pass)).exists());

        let mut reader = vcf::Reader::new(open_read_maybe_gz(&path_out)?);
        let header = reader.read_header()?;
        let records = reader.records(&header).collect::<Result<Vec<_>, _>>()?;
        assert_eq!(records.len(), 3);

        use vcf::record::info::field::{Key, Value};
        let key: Key = "AMINO_ACID_START".parse()?;
        assert_eq!(
            records[1].info().get(&key),
            Some(Some(&Value::Integer(175)))
        );
        let key: Key = "HGVSp_short".parse()?;
        assert_eq!(
            records[1].info().get(&key),
            Some(Some(&Value::String("p.R175H".into())))
        );

        let lines = common::read_lines(&path_pass)?;
        assert_eq!(lines.iter().filter(|line| !line.starts_with('#')).count(), 2);

        Ok(())
    }

    #[test]
    fn run_skip_pass_filter() -> Result<(), anyhow::Error> {
        let tmpdir = temp_testdir::TempDir::default();
        let path_out = tmpdir.join("example.annotated.vcf.gz");

        let args = Args {
            skip_pass_filter: true,
            path_xref: None,
            ..args(EXAMPLE, &path_out)
        };
        run(&crate::common::Args::default(), &args)?;

        assert!(path_out.exists());
        assert!(!tmpdir.join("example.annotated.pass.vcf.gz").exists());

        Ok(())
    }

    #[test]
    fn run_no_surviving_variants() -> Result<(), anyhow::Error> {
        let tmpdir = temp_testdir::TempDir::default();
        let path_out = tmpdir.join("no_csq.annotated.vcf.gz");

        let result = run(
            &crate::common::Args::default(),
            &args("tests/data/seqvars/summarise/no_csq.vcf", &path_out),
        );

        let err = result
            .err()
            .and_then(|e| e.downcast::<SummariseError>().ok());
        assert_eq!(
            err,
            Some(SummariseError::NoSurvivingVariants {
                path: "tests/data/seqvars/summarise/no_csq.vcf".into()
            })
        );
        assert!(!path_out.exists());
        assert!(!tmpdir.join("no_csq.annotated.pass.vcf.gz").exists());

        Ok(())
    }

    #[traced_test]
    #[test]
    fn run_all_filtered_pass_output() -> Result<(), anyhow::Error> {
        let tmpdir = temp_testdir::TempDir::default();
        let path_out = tmpdir.join("all_lowqual.annotated.vcf.gz");

        run(
            &crate::common::Args::default(),
            &args("tests/data/seqvars/summarise/all_lowqual.vcf", &path_out),
        )?;

        let lines = common::read_lines(&path_out)?;
        assert_eq!(lines.iter().filter(|line| !line.starts_with('#')).count(), 3);

        let path_pass = tmpdir.join("all_lowqual.annotated.pass.vcf.gz");
        assert!(Path::new(&tbi_path(&path_pass)).exists());
        let lines = common::read_lines(&path_pass)?;
        assert!(lines.iter().any(|line| line.starts_with("#CHROM")));
        assert!(lines.iter().all(|line| line.starts_with('#')));
        assert!(logs_contain("Number of PASSed variant calls: 0"));

        Ok(())
    }

    #[test]
    fn run_missing_csq_schema() -> Result<(), anyhow::Error> {
        let tmpdir = temp_testdir::TempDir::default();
        let path_out = tmpdir.join("out.vcf.gz");

        let result = run(
            &crate::common::Args::default(),
            &args("tests/data/seqvars/summarise/all_filtered.vcf", &path_out),
        );

        let err = result
            .err()
            .and_then(|e| e.downcast::<SummariseError>().ok());
        assert_eq!(
            err,
            Some(SummariseError::SchemaMissing {
                tag: "CSQ".into()
            })
        );

        Ok(())
    }
}

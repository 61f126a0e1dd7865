//! Construction of the output VCF header.

use noodles_vcf as vcf;
use vcf::header::record::value::{
    map::{info, Info},
    Map,
};
use vcf::header::Number;

use super::{predictions, schema::InfoTagTable, xref};

/// Built-in declarations of the derived fields.
fn derived_fields() -> Vec<(&'static str, Number, info::Type, String)> {
    let mut result = vec![
        (
            "HGVSp_short",
            Number::Count(1),
            info::Type::String,
            "Protein change in one-letter notation".to_string(),
        ),
        (
            "CDS_CHANGE",
            Number::Count(1),
            info::Type::String,
            "Coding sequence change: consequence:HGVSc:exon:protein change".to_string(),
        ),
        (
            "AMINO_ACID_START",
            Number::Count(1),
            info::Type::Integer,
            "First affected amino acid position".to_string(),
        ),
        (
            "AMINO_ACID_END",
            Number::Count(1),
            info::Type::Integer,
            "Last affected amino acid position".to_string(),
        ),
        (
            predictions::EFFECT_PREDICTIONS,
            Number::Count(1),
            info::Type::String,
            "Merged dbNSFP effect predictions: algorithm:prediction joined by &".to_string(),
        ),
        (
            "VEP_ALL_CONSEQUENCE",
            Number::Unknown,
            info::Type::String,
            "All transcript consequences: Consequence:SYMBOL:Feature_type:Feature:BIOTYPE"
                .to_string(),
        ),
        (
            "PFAM_DOMAIN",
            Number::Count(1),
            info::Type::String,
            "Pfam domain identifier".to_string(),
        ),
        (
            "COSMIC_MUTATION_ID",
            Number::Count(1),
            info::Type::String,
            "COSMIC mutation identifiers joined by &".to_string(),
        ),
        (
            "DBSNPRSID",
            Number::Count(1),
            info::Type::String,
            "dbSNP rsIDs joined by &".to_string(),
        ),
    ];

    for layout in [xref::XrefLayout::V2, xref::XrefLayout::V1] {
        for attribute in layout.attributes() {
            if result.iter().any(|(tag, ..)| tag == attribute) {
                continue;
            }
            let (number, ty) = if xref::FLAG_ATTRIBUTES.contains(attribute) {
                (Number::Count(0), info::Type::Flag)
            } else {
                (Number::Count(1), info::Type::String)
            };
            result.push((
                *attribute,
                number,
                ty,
                format!("Transcript cross-reference attribute {}", attribute),
            ));
        }
    }

    for (algorithm, tag) in predictions::ALGORITHM_TAGS {
        result.push((
            *tag,
            Number::Count(1),
            info::Type::String,
            format!("dbNSFP {} prediction", algorithm),
        ));
    }

    result
}

/// Declaration of one row of the declared-tag table.
fn declared_info(tag: &super::schema::InfoTag) -> Map<Info> {
    let ty = tag.ty.parse::<info::Type>().unwrap_or_else(|_| {
        tracing::warn!("unknown type {:?} of tag {}, using String", &tag.ty, &tag.tag);
        info::Type::String
    });
    let number = if ty == info::Type::Flag {
        Number::Count(0)
    } else {
        tag.number.parse::<Number>().unwrap_or(Number::Unknown)
    };
    Map::<Info>::new(number, ty, tag.description.clone())
}

/// Generate the output header from the input header.
///
/// Definitions already present in the input are kept; then the declared tags
/// are added, then the derived fields that are not declared yet.
pub fn build_output_header(
    input_header: &vcf::Header,
    tags: &InfoTagTable,
) -> Result<vcf::Header, anyhow::Error> {
    let mut header = input_header.clone();

    for tag in tags.iter() {
        let key: vcf::record::info::field::Key = tag
            .tag
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid INFO key {}: {}", &tag.tag, e))?;
        if !header.infos().contains_key(&key) {
            header.infos_mut().insert(key, declared_info(tag));
        }
    }

    for (tag, number, ty, description) in derived_fields() {
        let key: vcf::record::info::field::Key = tag
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid INFO key {}: {}", tag, e))?;
        if !header.infos().contains_key(&key) {
            header
                .infos_mut()
                .insert(key, Map::<Info>::new(number, ty, description));
        }
    }

    Ok(header)
}

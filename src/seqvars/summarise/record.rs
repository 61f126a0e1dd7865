//! Typed variant record with an extension table for derived INFO fields.

use indexmap::IndexMap;
use itertools::Itertools;
use noodles_vcf as vcf;
use vcf::header::{record::value::map::info::Type, Number};
use vcf::record::info::field::{value::Array, Key, Value};

use super::{schema, xref};

/// Filter column of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStatus {
    /// `.`
    Missing,
    /// `PASS`
    Pass,
    /// `;`-joined failed filters.
    Fail(String),
}

impl From<Option<&vcf::record::Filters>> for FilterStatus {
    fn from(filters: Option<&vcf::record::Filters>) -> Self {
        match filters {
            None => FilterStatus::Missing,
            Some(vcf::record::Filters::Pass) => FilterStatus::Pass,
            Some(vcf::record::Filters::Fail(ids)) => FilterStatus::Fail(ids.iter().join(";")),
        }
    }
}

impl FilterStatus {
    /// Whether the record passes, i.e., is `PASS` or has no filter.
    pub fn is_pass(&self) -> bool {
        matches!(self, FilterStatus::Missing | FilterStatus::Pass)
    }
}

/// Value of a derived field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Flag,
    String(String),
}

/// Variant record as seen by the summariser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub chrom: String,
    /// 1-based position.
    pub pos: usize,
    pub reference: String,
    pub alternates: Vec<String>,
    pub filter: FilterStatus,
    /// Raw `CSQ` group.
    pub csq: Option<String>,
    /// Raw `DBNSFP` group.
    pub dbnsfp: Option<String>,
    /// Raw `GVANNO_XREF` group.
    pub xref: Option<String>,
    fields: IndexMap<String, FieldValue>,
}

/// Render an INFO value as it would appear in the VCF, without escaping.
fn value_to_string(value: &Value) -> String {
    fn join<T: ToString>(values: &[Option<T>]) -> String {
        values
            .iter()
            .map(|value| match value {
                Some(value) => value.to_string(),
                None => ".".to_string(),
            })
            .join(",")
    }

    match value {
        Value::Integer(value) => value.to_string(),
        Value::Float(value) => value.to_string(),
        Value::Flag => String::new(),
        Value::Character(value) => value.to_string(),
        Value::String(value) => value.clone(),
        Value::Array(Array::Integer(values)) => join(values),
        Value::Array(Array::Float(values)) => join(values),
        Value::Array(Array::Character(values)) => join(values),
        Value::Array(Array::String(values)) => join(values),
    }
}

/// Non-empty string value of INFO `tag`.
fn info_string(record: &vcf::Record, tag: &str) -> Result<Option<String>, anyhow::Error> {
    let key: Key = tag
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid INFO key {}: {}", tag, e))?;
    Ok(match record.info().get(&key) {
        Some(Some(value)) => Some(value_to_string(value)).filter(|value| !value.is_empty()),
        _ => None,
    })
}

impl VariantRecord {
    /// Convert from a `noodles` record.
    pub fn from_vcf(record: &vcf::Record) -> Result<Self, anyhow::Error> {
        Ok(Self {
            chrom: record.chromosome().to_string(),
            pos: usize::from(record.position()),
            reference: record.reference_bases().to_string(),
            alternates: record
                .alternate_bases()
                .iter()
                .map(|allele| allele.to_string())
                .collect(),
            filter: FilterStatus::from(record.filters()),
            csq: info_string(record, schema::CSQ_TAG)?,
            dbnsfp: info_string(record, schema::DBNSFP_TAG)?,
            xref: info_string(record, xref::XREF_TAG)?,
            fields: IndexMap::new(),
        })
    }

    /// HGVS-like identifier for log messages.
    pub fn variant_id(&self) -> String {
        crate::common::variant_id(&self.chrom, self.pos, &self.reference, &self.alternates)
    }

    pub fn set_field<K, V>(&mut self, name: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.fields
            .insert(name.into(), FieldValue::String(value.into()));
    }

    /// Set flag `name`; a `false` value removes it.
    pub fn set_flag<K>(&mut self, name: K, value: bool)
    where
        K: Into<String>,
    {
        let name = name.into();
        if value {
            self.fields.insert(name, FieldValue::Flag);
        } else {
            self.fields.shift_remove(&name);
        }
    }

    /// String value of field `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(FieldValue::Flag))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Write the derived fields into `record`, typed by their declaration
    /// in `header`. Undeclared fields are written as strings.
    pub fn apply_to(
        &self,
        header: &vcf::Header,
        record: &mut vcf::Record,
    ) -> Result<(), anyhow::Error> {
        for (name, value) in &self.fields {
            let key: Key = name
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid INFO key {}: {}", name, e))?;
            let definition = header
                .infos()
                .get(&key)
                .map(|info| (info.number(), info.ty()));
            let typed = match value {
                FieldValue::Flag => Some(Value::Flag),
                FieldValue::String(value) => typed_value(value, definition),
            };
            match typed {
                Some(typed) => {
                    record.info_mut().insert(key, Some(typed));
                }
                None => tracing::warn!(
                    "dropping INFO/{}={:?} of {} not matching its declared type",
                    name,
                    value,
                    self.variant_id()
                ),
            }
        }
        Ok(())
    }
}

/// Convert `value` according to the declared `Number` and `Type`.
fn typed_value(value: &str, definition: Option<(Number, Type)>) -> Option<Value> {
    fn parse_all<T: std::str::FromStr>(value: &str) -> Option<Vec<Option<T>>> {
        value
            .split(',')
            .map(|element| match element {
                "." | "" => Some(None),
                _ => element.parse().ok().map(Some),
            })
            .collect()
    }

    match definition {
        None | Some((Number::Count(1), Type::String)) => Some(Value::String(value.to_string())),
        Some((_, Type::Flag)) => Some(Value::Flag),
        Some((Number::Count(1), Type::Integer)) => value.parse().ok().map(Value::Integer),
        Some((Number::Count(1), Type::Float)) => value.parse().ok().map(Value::Float),
        Some((Number::Count(1), Type::Character)) => value.chars().next().map(Value::Character),
        Some((_, Type::Integer)) => parse_all(value).map(|v| Value::Array(Array::Integer(v))),
        Some((_, Type::Float)) => parse_all(value).map(|v| Value::Array(Array::Float(v))),
        Some((_, Type::Character)) => {
            parse_all(value).map(|v| Value::Array(Array::Character(v)))
        }
        Some((_, Type::String)) => Some(Value::Array(Array::String(
            value.split(',').map(|element| Some(element.to_string())).collect(),
        ))),
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const VCF: &str = "##fileformat=VCFv4.2\n\
        ##FILTER=<ID=PASS,Description=\"All filters passed\">\n\
        ##FILTER=<ID=LowQual,Description=\"Low quality\">\n\
        ##INFO=<ID=CSQ,Number=.,Type=String,Description=\"Consequences. Format: Allele|Consequence\">\n\
        ##INFO=<ID=AMINO_ACID_START,Number=1,Type=Integer,Description=\"Start\">\n\
        ##INFO=<ID=VEP_ALL_CONSEQUENCE,Number=.,Type=String,Description=\"All consequences\">\n\
        ##INFO=<ID=TUMOR_SUPPRESSOR,Number=0,Type=Flag,Description=\"Tumor suppressor\">\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
        17\t7578406\t.\tC\tT,G\t.\tLowQual\tCSQ=T|missense_variant,T|intron_variant\n\
        17\t7578500\t.\tA\tG\t.\t.\t.\n";

    fn read() -> Result<(vcf::Header, Vec<vcf::Record>), anyhow::Error> {
        let mut reader = vcf::Reader::new(VCF.as_bytes());
        let header = reader.read_header()?;
        let records = reader.records(&header).collect::<Result<Vec<_>, _>>()?;
        Ok((header, records))
    }

    #[test]
    fn from_vcf() -> Result<(), anyhow::Error> {
        let (_, records) = read()?;
        let record = VariantRecord::from_vcf(&records[0])?;

        assert_eq!(record.chrom, "17");
        assert_eq!(record.pos, 7578406);
        assert_eq!(record.alternates, vec!["T".to_string(), "G".to_string()]);
        assert_eq!(record.filter, FilterStatus::Fail("LowQual".into()));
        assert!(!record.filter.is_pass());
        assert_eq!(
            record.csq.as_deref(),
            Some("T|missense_variant,T|intron_variant")
        );
        assert_eq!(record.dbnsfp, None);
        assert_eq!(record.variant_id(), "g.17:7578406C>T,G");

        let record = VariantRecord::from_vcf(&records[1])?;
        assert_eq!(record.filter, FilterStatus::Missing);
        assert!(record.filter.is_pass());
        assert_eq!(record.csq, None);

        Ok(())
    }

    #[test]
    fn fields_and_flags() {
        let mut record = VariantRecord {
            chrom: "1".into(),
            pos: 1,
            reference: "A".into(),
            alternates: vec!["C".into()],
            filter: FilterStatus::Pass,
            csq: None,
            dbnsfp: None,
            xref: None,
            fields: IndexMap::new(),
        };
        record.set_field("SYMBOL", "TP53");
        record.set_flag("ONCOGENE", false);
        record.set_flag("TUMOR_SUPPRESSOR", true);

        assert_eq!(record.field("SYMBOL"), Some("TP53"));
        assert_eq!(record.field("TUMOR_SUPPRESSOR"), None);
        assert!(record.flag("TUMOR_SUPPRESSOR"));
        assert!(!record.flag("ONCOGENE"));
        assert_eq!(record.fields().count(), 2);
    }

    #[test]
    fn apply_to_typed() -> Result<(), anyhow::Error> {
        let (header, mut records) = read()?;
        let mut record = VariantRecord::from_vcf(&records[1])?;
        record.set_field("AMINO_ACID_START", "175");
        record.set_field("VEP_ALL_CONSEQUENCE", "a:b,c:d");
        record.set_field("SYMBOL", "TP53");
        record.set_flag("TUMOR_SUPPRESSOR", true);

        let vcf_record = &mut records[1];
        record.apply_to(&header, vcf_record)?;

        let get = |tag: &str| -> Option<Option<Value>> {
            let key: Key = tag.parse().ok()?;
            vcf_record.info().get(&key).map(|value| value.cloned())
        };
        assert_eq!(get("AMINO_ACID_START"), Some(Some(Value::Integer(175))));
        assert_eq!(
            get("VEP_ALL_CONSEQUENCE"),
            Some(Some(Value::Array(Array::String(vec![
                Some("a:b".into()),
                Some("c:d".into())
            ]))))
        );
        assert_eq!(get("SYMBOL"), Some(Some(Value::String("TP53".into()))));
        assert_eq!(get("TUMOR_SUPPRESSOR"), Some(Some(Value::Flag)));

        Ok(())
    }

    #[test]
    fn apply_to_drops_unparseable() -> Result<(), anyhow::Error> {
        let (header, mut records) = read()?;
        let mut record = VariantRecord::from_vcf(&records[1])?;
        record.set_field("AMINO_ACID_START", "?");

        record.apply_to(&header, &mut records[1])?;

        let key: Key = "AMINO_ACID_START".parse()?;
        assert!(records[1].info().get(&key).is_none());

        Ok(())
    }

    #[rstest]
    #[case("1.5", Some((Number::Count(1), Type::Float)), Some(Value::Float(1.5)))]
    #[case("x", Some((Number::Count(1), Type::Float)), None)]
    #[case("1,.", Some((Number::Unknown, Type::Integer)), Some(Value::Array(Array::Integer(vec![Some(1), None]))))]
    #[case("x", None, Some(Value::String("x".into())))]
    #[case("1", Some((Number::Count(0), Type::Flag)), Some(Value::Flag))]
    fn typed_value_cases(
        #[case] value: &str,
        #[case] definition: Option<(Number, Type)>,
        #[case] expected: Option<Value>,
    ) {
        assert_eq!(typed_value(value, definition), expected);
    }
}

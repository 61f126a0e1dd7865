//! Common utility code for noodles.

use std::{fs::File, path::Path};

use noodles_bgzf as bgzf;
use noodles_core::Position;
use noodles_csi::binning_index::index::{
    header::Builder as IndexHeaderBuilder, reference_sequence::bin::Chunk,
};
use noodles_tabix as tabix;
use noodles_vcf as vcf;

/// VCF writer that writes BGZF-compressed output.
pub type BgzfVcfWriter = vcf::Writer<bgzf::Writer<File>>;

/// Open a BGZF-compressed VCF writer at `path` and write `header`.
pub fn open_bgzf_vcf_writer<P>(path: P, header: &vcf::Header) -> Result<BgzfVcfWriter, anyhow::Error>
where
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref()).map_err(|e| {
        anyhow::anyhow!(
            "could not open output file {:?} for writing: {}",
            path.as_ref(),
            e
        )
    })?;
    let mut writer = vcf::Writer::new(bgzf::Writer::new(file));
    writer
        .write_header(header)
        .map_err(|e| anyhow::anyhow!("problem writing header: {}", e))?;
    Ok(writer)
}

/// Flush the BGZF blocks and write the end-of-file marker.
pub fn finish_bgzf_vcf_writer(mut writer: BgzfVcfWriter) -> Result<(), anyhow::Error> {
    writer
        .get_mut()
        .try_finish()
        .map_err(|e| anyhow::anyhow!("problem finishing BGZF output: {}", e))
}

/// Build TBI for file at `path_src` and write to `path_dst`.
pub fn build_tbi<S, D>(path_src: S, path_dst: D) -> Result<(), anyhow::Error>
where
    S: AsRef<Path>,
    D: AsRef<Path>,
{
    let mut reader = File::open(path_src.as_ref())
        .map(bgzf::Reader::new)
        .map(vcf::Reader::new)
        .map_err(|e| anyhow::anyhow!("error input file for tbi creation: {}", e))?;

    let header = reader
        .read_header()
        .map_err(|e| anyhow::anyhow!("error reading header: {}", e))?;

    let mut record = vcf::Record::default();

    let mut indexer = tabix::index::Indexer::default();
    indexer.set_header(IndexHeaderBuilder::vcf().build());
    let mut record_count = 0usize;

    let mut start_position = reader.get_ref().virtual_position();

    while reader
        .read_record(&header, &mut record)
        .map_err(|e| anyhow::anyhow!("problem reading record: {}", e))?
        != 0
    {
        let end_position = reader.get_ref().virtual_position();
        let chunk = Chunk::new(start_position, end_position);

        let reference_sequence_name = record.chromosome().to_string();
        let start = Position::try_from(usize::from(record.position()))
            .map_err(|e| anyhow::anyhow!("error converting start position: {}", e))?;
        let end = record
            .end()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            .and_then(|position| {
                Position::try_from(usize::from(position))
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            })
            .map_err(|e| anyhow::anyhow!("error converting end position: {}", e))?;

        indexer
            .add_record(&reference_sequence_name, start, end, chunk)
            .map_err(|e| anyhow::anyhow!("error adding record to tabix index: {}", e))?;

        start_position = end_position;
        record_count += 1;
    }

    // The indexer drops its header when no record was added.
    let index = if record_count == 0 {
        tabix::Index::builder()
            .set_header(IndexHeaderBuilder::vcf().build())
            .build()
    } else {
        indexer.build()
    };

    let mut writer = File::create(path_dst.as_ref())
        .map(tabix::Writer::new)
        .map_err(|e| anyhow::anyhow!("error output file for tbi creation: {}", e))?;
    writer
        .write_index(&index)
        .map_err(|e| anyhow::anyhow!("error writing tabix index: {}", e))?;
    writer
        .try_finish()
        .map_err(|e| anyhow::anyhow!("error finishing tabix index: {}", e))?;

    Ok(())
}

/// Return the path of the tabix index for `path`.
pub fn tbi_path<P>(path: P) -> String
where
    P: AsRef<Path>,
{
    format!("{}.tbi", path.as_ref().display())
}

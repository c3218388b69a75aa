//! NCBI submission templates and the chunked BioSample/SRA file layout.
//!
//! Every BioSample file is paired with the SRA file of the same number, so a
//! sample's BioSample entry and all of its sequence files are always submitted
//! together. SRA rows for samples that already carry a BioSample accession
//! have no BioSample counterpart and go to separate `-SA` files.

pub mod biosample;
pub mod sra;

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use csv::{Terminator, WriterBuilder};
use serde::Serialize;

use crate::domain::SortKey;
use crate::error::SubmitError;
use crate::store::SubmissionStore;

pub use biosample::{BioSampleRow, BioSampleTemplate};
pub use sra::{LibraryFields, SequenceFile, SraRow, SraTemplate};

pub const DEFAULT_SRA_CHUNK_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy)]
pub struct TemplateFormat {
    pub delimiter: u8,
}

impl TemplateFormat {
    /// NCBI templates use DOS line endings.
    pub fn writer<W: Write>(&self, inner: W) -> csv::Writer<W> {
        WriterBuilder::new()
            .delimiter(self.delimiter)
            .terminator(Terminator::CRLF)
            .flexible(true)
            .from_writer(inner)
    }
}

/// Base names of the output files, without the chunk suffix.
#[derive(Debug, Clone)]
pub struct TemplateNames {
    pub biosample_base: String,
    pub sra_base: String,
    pub biosample_custom_fields: Vec<&'static str>,
}

impl TemplateNames {
    pub fn biosample_file(&self, chunk: usize) -> String {
        format!("{}-{chunk}.tsv", self.biosample_base)
    }

    pub fn sra_file(&self, chunk: usize) -> String {
        format!("{}-{chunk}.tsv", self.sra_base)
    }

    pub fn existing_sample_sra_file(&self, chunk: usize) -> String {
        format!("{}-SA{chunk}.tsv", self.sra_base)
    }
}

#[derive(Debug)]
pub struct PlannedChunk<'a> {
    pub number: usize,
    pub sample_names: Vec<String>,
    pub biosamples: Vec<&'a BioSampleRow>,
    pub sra: Vec<&'a SraRow>,
}

#[derive(Debug)]
pub struct SubmissionPlan<'a> {
    pub chunks: Vec<PlannedChunk<'a>>,
    pub existing_samples: Vec<Vec<&'a SraRow>>,
    pub unmatched_biosamples: Vec<&'a BioSampleRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenFile {
    pub kind: String,
    pub path: String,
    pub rows: usize,
}

/// Sample names sort by the numeric part after the first `/`.
fn sample_sort_key(sample_name: &str) -> SortKey {
    let suffix = sample_name
        .split_once('/')
        .map(|(_, tail)| tail)
        .unwrap_or(sample_name);
    SortKey::from_suffix(suffix)
}

/// Pack samples into chunks of at most `chunk_size` SRA rows. A sample is
/// never split across chunks, so a sample with more rows than `chunk_size`
/// gets a chunk of its own.
pub fn chunk_samples(counts: &BTreeMap<String, usize>, chunk_size: usize) -> Vec<Vec<String>> {
    let mut ordered: Vec<(&String, usize)> = counts.iter().map(|(name, n)| (name, *n)).collect();
    ordered.sort_by_key(|(name, _)| sample_sort_key(name));

    let mut chunks = Vec::new();
    let mut chunk: Vec<String> = Vec::new();
    let mut counter = 0usize;
    for (sample_name, rows) in ordered {
        if counter + rows > chunk_size && !chunk.is_empty() {
            chunks.push(std::mem::take(&mut chunk));
            counter = 0;
        }
        chunk.push(sample_name.clone());
        counter += rows;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

pub fn plan_submission<'a>(
    biosample_rows: &'a [BioSampleRow],
    sra_rows: &'a [SraRow],
    chunk_size: usize,
) -> SubmissionPlan<'a> {
    let chunk_size = chunk_size.max(1);

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in sra_rows {
        if let Some(name) = row.sample_name.as_deref().filter(|name| !name.is_empty()) {
            *counts.entry(name.to_string()).or_default() += 1;
        }
    }

    let mut chunks = Vec::new();
    for (index, sample_names) in chunk_samples(&counts, chunk_size).into_iter().enumerate() {
        let members: HashSet<&str> = sample_names.iter().map(String::as_str).collect();
        let biosamples: Vec<&BioSampleRow> = biosample_rows
            .iter()
            .filter(|row| members.contains(row.sample_name.as_str()))
            .collect();
        let sra: Vec<&SraRow> = sra_rows
            .iter()
            .filter(|row| {
                row.sample_name
                    .as_deref()
                    .is_some_and(|name| members.contains(name))
            })
            .collect();
        chunks.push(PlannedChunk {
            number: index + 1,
            sample_names,
            biosamples,
            sra,
        });
    }

    let existing: Vec<&SraRow> = sra_rows
        .iter()
        .filter(|row| row.sample_name.as_deref().is_none_or(str::is_empty))
        .collect();
    let existing_samples = existing
        .chunks(chunk_size)
        .map(|chunk| chunk.to_vec())
        .collect();

    let unmatched_biosamples = biosample_rows
        .iter()
        .filter(|row| !counts.contains_key(&row.sample_name))
        .collect();

    SubmissionPlan {
        chunks,
        existing_samples,
        unmatched_biosamples,
    }
}

/// Write the planned BioSample and SRA files under the store root.
pub fn write_sra_biosample(
    store: &SubmissionStore,
    names: &TemplateNames,
    plan: &SubmissionPlan<'_>,
) -> Result<Vec<WrittenFile>, SubmitError> {
    store.ensure_root()?;
    let mut written = Vec::new();

    for row in &plan.unmatched_biosamples {
        tracing::warn!(
            "BioSample {} has no sequence files to submit and is not written",
            row.sample_name
        );
    }

    for chunk in &plan.chunks {
        let biosample_name = names.biosample_file(chunk.number);
        let bytes = BioSampleTemplate::render(&names.biosample_custom_fields, &chunk.biosamples)?;
        let path = store.write_file(&biosample_name, &bytes)?;
        written.push(WrittenFile {
            kind: "biosample".to_string(),
            path: path.to_string(),
            rows: chunk.biosamples.len(),
        });

        let sra_name = names.sra_file(chunk.number);
        let bytes = SraTemplate::render(&chunk.sra)?;
        let path = store.write_file(&sra_name, &bytes)?;
        written.push(WrittenFile {
            kind: "sra".to_string(),
            path: path.to_string(),
            rows: chunk.sra.len(),
        });
        tracing::info!(
            "wrote chunk {}: {} samples, {} biosample rows, {} SRA rows",
            chunk.number,
            chunk.sample_names.len(),
            chunk.biosamples.len(),
            chunk.sra.len()
        );
    }

    for (index, rows) in plan.existing_samples.iter().enumerate() {
        let sra_name = names.existing_sample_sra_file(index + 1);
        let bytes = SraTemplate::render(rows)?;
        let path = store.write_file(&sra_name, &bytes)?;
        written.push(WrittenFile {
            kind: "sra-existing-sample".to_string(),
            path: path.to_string(),
            rows: rows.len(),
        });
    }

    Ok(written)
}

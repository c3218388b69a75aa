use serde::Serialize;

use crate::error::SubmitError;
use crate::ncbi::TemplateFormat;

pub const FIELDS: &[&str] = &[
    "bioproject_accession",
    "biosample_accession",
    "sample_name",
    "library_ID",
    "title/short description",
    "library_strategy",
    "library_source",
    "library_selection",
    "library_layout",
    "platform",
    "instrument_model",
    "design_description",
    "reference_genome_assembly",
    "alignment_software",
    "forward_read_length",
    "reverse_read_length",
];

pub const FILE_HEADER: &[&str] = &["filetype", "filename", "MD5_checksum"];

/// Number of file column groups in the template header.
pub const FILE_SLOTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SequenceFile {
    pub filetype: String,
    pub filename: String,
    pub md5: String,
}

/// The library-specific part of an SRA row, which differs per package type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryFields {
    pub library_id: String,
    pub title: String,
    pub library_strategy: String,
    pub library_source: String,
    pub instrument_model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SraRow {
    pub bioproject_accession: String,
    pub biosample_accession: String,
    /// Blank when the sample already has a BioSample accession.
    pub sample_name: Option<String>,
    pub library: LibraryFields,
    pub library_selection: String,
    pub library_layout: String,
    pub platform: String,
    pub design_description: String,
    pub reference_genome_assembly: String,
    pub alignment_software: String,
    pub forward_read_length: String,
    pub reverse_read_length: String,
    pub files: Vec<SequenceFile>,
}

impl SraRow {
    pub fn value(&self, field: &str) -> &str {
        match field {
            "bioproject_accession" => &self.bioproject_accession,
            "biosample_accession" => &self.biosample_accession,
            "sample_name" => self.sample_name.as_deref().unwrap_or(""),
            "library_ID" => &self.library.library_id,
            "title/short description" | "title" => &self.library.title,
            "library_strategy" => &self.library.library_strategy,
            "library_source" => &self.library.library_source,
            "library_selection" => &self.library_selection,
            "library_layout" => &self.library_layout,
            "platform" => &self.platform,
            "instrument_model" => &self.library.instrument_model,
            "design_description" => &self.design_description,
            "reference_genome_assembly" => &self.reference_genome_assembly,
            "alignment_software" => &self.alignment_software,
            "forward_read_length" => &self.forward_read_length,
            "reverse_read_length" => &self.reverse_read_length,
            _ => "",
        }
    }

    fn record(&self) -> Vec<String> {
        let mut files = self.files.clone();
        files.sort();
        FIELDS
            .iter()
            .map(|field| self.value(field).to_string())
            .chain(
                files
                    .into_iter()
                    .flat_map(|file| [file.filetype, file.filename, file.md5]),
            )
            .collect()
    }
}

/// SRA submission template, v2.8.
pub struct SraTemplate;

impl SraTemplate {
    pub const FORMAT: TemplateFormat = TemplateFormat { delimiter: b',' };

    pub fn header() -> Vec<&'static str> {
        let mut header = FIELDS.to_vec();
        for _ in 0..FILE_SLOTS {
            header.extend_from_slice(FILE_HEADER);
        }
        header
    }

    pub fn render(rows: &[&SraRow]) -> Result<Vec<u8>, SubmitError> {
        let mut out = Vec::new();
        let mut writer = Self::FORMAT.writer(&mut out);
        writer
            .write_record(Self::header())
            .map_err(|err| SubmitError::Csv(err.to_string()))?;
        for row in rows {
            if row.files.is_empty() {
                continue;
            }
            if row.files.len() > FILE_SLOTS {
                tracing::warn!(
                    "SRA row library_ID: {} has {} files, more than the {FILE_SLOTS} template slots",
                    row.library.library_id,
                    row.files.len()
                );
            }
            writer
                .write_record(row.record())
                .map_err(|err| SubmitError::Csv(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| SubmitError::Csv(err.to_string()))?;
        drop(writer);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, md5: &str) -> SequenceFile {
        SequenceFile {
            filetype: "fastq".to_string(),
            filename: name.to_string(),
            md5: md5.to_string(),
        }
    }

    fn row(files: Vec<SequenceFile>) -> SraRow {
        SraRow {
            bioproject_accession: "PRJNA385736".to_string(),
            biosample_accession: String::new(),
            sample_name: Some("102.100.100/7054".to_string()),
            library: LibraryFields {
                library_id: "7054_16S_AB12C".to_string(),
                title: "Marine_amplicon".to_string(),
                library_strategy: "AMPLICON".to_string(),
                library_source: "GENOMIC".to_string(),
                instrument_model: "Illumina MiSeq".to_string(),
            },
            library_selection: "PCR".to_string(),
            library_layout: "paired".to_string(),
            platform: "ILLUMINA".to_string(),
            design_description: "http://www.bioplatforms.com/marine-microbes/".to_string(),
            reference_genome_assembly: String::new(),
            alignment_software: String::new(),
            forward_read_length: "300".to_string(),
            reverse_read_length: "300".to_string(),
            files,
        }
    }

    #[test]
    fn header_has_four_file_slots() {
        let header = SraTemplate::header();
        assert_eq!(header.len(), FIELDS.len() + 3 * FILE_SLOTS);
        assert_eq!(header[4], "title/short description");
        assert_eq!(header[header.len() - 1], "MD5_checksum");
    }

    #[test]
    fn render_sorts_files_and_skips_rows_without_files() {
        let with_files = row(vec![file("b_R2.fastq.gz", "2"), file("a_R1.fastq.gz", "1")]);
        let without_files = row(Vec::new());
        let bytes = SraTemplate::render(&[&with_files, &without_files]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("bioproject_accession,biosample_accession,sample_name"));
        assert!(lines[1].ends_with("fastq,a_R1.fastq.gz,1,fastq,b_R2.fastq.gz,2"));
        assert!(lines[1].contains(",Marine_amplicon,"));
        assert_eq!(lines[2], "");
    }

    #[test]
    fn rows_beyond_the_file_slots_are_written_in_full() {
        let files = (1..=5)
            .map(|n| file(&format!("lane{n}_R1.fastq.gz"), &n.to_string()))
            .collect();
        let wide = row(files);
        let bytes = SraTemplate::render(&[&wide]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();

        assert_eq!(lines[0].split(',').count(), FIELDS.len() + 3 * FILE_SLOTS);
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), FIELDS.len() + 15);
        assert_eq!(fields[fields.len() - 2], "lane5_R1.fastq.gz");
    }

    #[test]
    fn existing_sample_has_blank_sample_name() {
        let mut existing = row(vec![file("a.fastq.gz", "1")]);
        existing.sample_name = None;
        existing.biosample_accession = "SAMN0001".to_string();
        let record = existing.record();
        assert_eq!(record[1], "SAMN0001");
        assert_eq!(record[2], "");
    }
}

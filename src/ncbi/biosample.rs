use serde::Serialize;

use crate::error::SubmitError;
use crate::ncbi::TemplateFormat;

/// Comment block of the NCBI "Metagenome or environmental; version 1.0"
/// batch template, source: https://submit.ncbi.nlm.nih.gov/biosample/template/
const PREAMBLE: &[&str] = &[
    "# This is a submission template for batch deposit of 'Metagenome or environmental; version 1.0' samples to the NCBI BioSample database (http://www.ncbi.nlm.nih.gov/biosample/).",
    "# Fields with an asterisk (*) are mandatory. Your submission will fail if any mandatory fields are not completed. If information is unavailable for any mandatory field, please enter 'not collected', 'not applicable' or 'missing' as appropriate.",
    "# All other fields are optional. Leave optional fields empty if no information is available.",
    "# You can add any number of custom fields to fully describe your BioSamples, simply include them in the table.",
    "# CAUTION: Be aware that Excel may automatically apply formatting to your data. In particular, take care with dates, incrementing autofills and special characters like / or -. Doublecheck that your text file is accurate before uploading to BioSample.",
    "# TO MAKE A SUBMISSION:",
    "#     1. Complete the template table (typically in Excel, or another spreadsheet application)",
    "#     2. Save the worksheet as a Text (Tab-delimited) file - use 'File, Save as, Save as type: Text (Tab-delimited)'",
    "#     3. Upload the file on the 'Attributes' tab of the BioSample Submission Portal at https://submit.ncbi.nlm.nih.gov/subs/biosample/.",
    "#     4. If you have any questions, please contact us at biosamplehelp@ncbi.nlm.nih.gov.",
];

pub const COLUMNS: &[&str] = &[
    "*sample_name",
    "sample_title",
    "bioproject_accession",
    "*organism",
    "host",
    "isolation_source",
    "*collection_date",
    "*geo_loc_name",
    "*lat_lon",
    "ref_biomaterial",
    "rel_to_oxygen",
    "samp_collect_device",
    "samp_mat_process",
    "samp_size",
    "source_material_id",
    "description",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BioSampleRow {
    pub sample_name: String,
    pub collection_date: String,
    pub geo_loc_name: String,
    pub lat_lon: String,
    pub bioproject_accession: String,
    pub depth: String,
    pub isolate: String,
    pub organism: String,
    pub isolation_source: String,
}

impl BioSampleRow {
    /// Value for a template column; the mandatory marker is ignored and
    /// columns this tool never fills are blank.
    pub fn value(&self, column: &str) -> &str {
        match column.trim_start_matches('*') {
            "sample_name" => &self.sample_name,
            "collection_date" => &self.collection_date,
            "geo_loc_name" => &self.geo_loc_name,
            "lat_lon" => &self.lat_lon,
            "bioproject_accession" => &self.bioproject_accession,
            "depth" => &self.depth,
            "isolate" => &self.isolate,
            "organism" => &self.organism,
            "isolation_source" => &self.isolation_source,
            _ => "",
        }
    }
}

pub struct BioSampleTemplate;

impl BioSampleTemplate {
    pub const FORMAT: TemplateFormat = TemplateFormat {
        delimiter: b'\t',
    };

    pub fn header(custom_fields: &[&str]) -> Vec<String> {
        COLUMNS
            .iter()
            .chain(custom_fields.iter())
            .map(|column| column.to_string())
            .collect()
    }

    pub fn render(custom_fields: &[&str], rows: &[&BioSampleRow]) -> Result<Vec<u8>, SubmitError> {
        let mut out = Vec::new();
        for line in PREAMBLE {
            out.extend_from_slice(line.as_bytes());
            out.extend_from_slice(b"\r\n");
        }

        let header = Self::header(custom_fields);
        let mut writer = Self::FORMAT.writer(&mut out);
        writer
            .write_record(&header)
            .map_err(|err| SubmitError::Csv(err.to_string()))?;
        for row in rows {
            writer
                .write_record(header.iter().map(|column| row.value(column)))
                .map_err(|err| SubmitError::Csv(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| SubmitError::Csv(err.to_string()))?;
        drop(writer);
        Ok(out)
    }
}

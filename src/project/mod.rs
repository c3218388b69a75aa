//! Per-project business rules for turning CKAN packages into NCBI rows.

pub mod base;
pub mod mm;

use crate::ckan::{Package, Resource};
use crate::domain::{BpaId, Exporter, MANDATORY, PackageType, generate_isolate, ncbi_lat_lon};
use crate::grouping::{Record, build_id_depth_metadata, sort_by_bpa_id};
use crate::ncbi::{BioSampleRow, LibraryFields, SequenceFile, SraRow, TemplateNames};

pub use base::Base;
pub use mm::MarineMicrobes;

pub const BIOSAMPLE_CUSTOM_FIELDS: &[&str] = &["depth", "isolate"];

/// Project-specific BioSample values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleAttributes {
    pub collection_date: String,
    pub geo_loc_name: String,
    pub organism: String,
    pub isolation_source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySkip {
    UnknownType(String),
    MissingField(&'static str),
}

pub trait Project {
    fn exporter(&self) -> Exporter;

    /// Package types to fetch, in fetch order.
    fn package_types(&self) -> &'static [PackageType];

    fn uses_embargo(&self) -> bool;

    /// Packages without a value for this field are not submitted.
    fn required_field(&self) -> &'static str;

    fn bioproject_accession(&self) -> &'static str;

    fn design_description(&self) -> &'static str;

    fn sample_attributes(&self, record: &Record) -> SampleAttributes;

    fn library_fields(&self, record: &Record, bpa_id: &BpaId)
    -> Result<LibraryFields, LibrarySkip>;

    fn template_names(&self) -> TemplateNames;
}

pub fn project_for(exporter: Exporter) -> Box<dyn Project> {
    match exporter {
        Exporter::BaseNcbi => Box::new(Base),
        Exporter::MmNcbi => Box::new(MarineMicrobes),
    }
}

fn skip_message(reason: &str, record: &Record, field: &str) -> String {
    format!(
        "Skipping package ({reason}) bpa_id: {} id: {} {field}: {} has-resources: {}",
        record.get("bpa_id").unwrap_or(""),
        record.get("id").unwrap_or(""),
        record.get(field).unwrap_or(""),
        record.contains("resources")
    )
}

fn has_required_field(record: &Record, required_field: &str) -> bool {
    if record.non_empty(required_field).is_none() {
        tracing::warn!("{}", skip_message(required_field, record, required_field));
        return false;
    }
    true
}

/// Sort records by sample number and drop those missing `required_field`.
pub fn packages_to_submit(mut records: Vec<Record>, required_field: &str) -> Vec<Record> {
    sort_by_bpa_id(&mut records);
    records
        .into_iter()
        .filter(|record| has_required_field(record, required_field))
        .collect()
}

/// Resources that still need uploading and carry a forward or reverse read.
pub fn resources_to_submit(resources: &[Resource]) -> Vec<&Resource> {
    resources
        .iter()
        .filter(|resource| {
            if resource.ncbi_file_uploaded {
                tracing::debug!(
                    "Skipping resource (ncbi_file_uploaded) package_id: {} id: {}",
                    resource.package_id(),
                    resource.id()
                );
                return false;
            }
            match resource.read.as_deref().map(str::trim) {
                None | Some("") => {
                    tracing::warn!(
                        "Skipping resource (read missing) package_id: {} id: {}",
                        resource.package_id(),
                        resource.id()
                    );
                    false
                }
                Some("R1") | Some("R2") => true,
                Some(other) => {
                    tracing::info!(
                        "Skipping resource (read) package_id: {} id: {} read: {other}",
                        resource.package_id(),
                        resource.id()
                    );
                    false
                }
            }
        })
        .collect()
}

pub fn resource_file_info(resources: &[&Resource]) -> Vec<SequenceFile> {
    let mut files = Vec::new();
    for resource in resources {
        if resource.url.as_deref().is_none_or(str::is_empty) {
            tracing::warn!(
                "Skipping resource (url missing) package_id: {} id: {}",
                resource.package_id(),
                resource.id()
            );
            continue;
        }
        files.push(SequenceFile {
            filetype: "fastq".to_string(),
            filename: resource.filename().to_string(),
            md5: resource.md5.clone().unwrap_or_default(),
        });
    }
    files
}

fn parse_bpa_id(record: &Record) -> Option<BpaId> {
    let raw = record.get("bpa_id").unwrap_or("");
    match raw.parse::<BpaId>() {
        Ok(bpa_id) => Some(bpa_id),
        Err(err) => {
            tracing::warn!("{} ({err})", skip_message("bpa_id", record, "bpa_id"));
            None
        }
    }
}

/// BioSample rows: one per (sample, depth), excluding samples NCBI already
/// holds.
pub fn biosample_rows(project: &dyn Project, packages: &[Package]) -> Vec<BioSampleRow> {
    let grouped = build_id_depth_metadata(packages);
    let mut rows = Vec::new();
    for record in packages_to_submit(grouped, project.required_field()) {
        if let Some(accession) = record.non_empty("ncbi_biosample_accession") {
            tracing::info!(
                "Skipping package (ncbi_biosample_accession) package_id: {} biosample_accession: {accession}",
                record.get("id").unwrap_or("")
            );
            continue;
        }
        let Some(bpa_id) = parse_bpa_id(&record) else {
            continue;
        };
        let depth = record.get("depth").unwrap_or("");
        let lat_lon = match record.non_empty("spatial") {
            Some(spatial) => ncbi_lat_lon(spatial).unwrap_or_else(|err| {
                tracing::warn!("Invalid (spatial) bpa_id: {bpa_id}: {err}");
                MANDATORY.to_string()
            }),
            None => MANDATORY.to_string(),
        };
        let attributes = project.sample_attributes(&record);
        rows.push(BioSampleRow {
            sample_name: bpa_id.slash(),
            collection_date: attributes.collection_date,
            geo_loc_name: attributes.geo_loc_name,
            lat_lon,
            bioproject_accession: project.bioproject_accession().to_string(),
            depth: depth.to_string(),
            isolate: generate_isolate(&bpa_id, depth),
            organism: attributes.organism,
            isolation_source: attributes.isolation_source,
        });
    }
    rows
}

/// SRA rows: one per package that has at least one file left to upload.
pub fn sra_rows(project: &dyn Project, packages: &[Package]) -> Vec<SraRow> {
    let mut candidates: Vec<(Record, &Package)> = packages
        .iter()
        .map(|package| (package.to_record(), package))
        .collect();
    candidates.sort_by_key(|(record, _)| record.sort_key());

    let mut rows = Vec::new();
    for (record, package) in candidates {
        if !has_required_field(&record, project.required_field()) {
            continue;
        }
        let Some(bpa_id) = parse_bpa_id(&record) else {
            continue;
        };
        let files = resource_file_info(&resources_to_submit(package.resources()));

        // biosample_accession and sample_name cannot both be set
        let biosample_accession = record.get("ncbi_biosample_accession").unwrap_or("");
        let sample_name = if biosample_accession.is_empty() {
            Some(bpa_id.slash())
        } else {
            None
        };

        let library = match project.library_fields(&record, &bpa_id) {
            Ok(library) => library,
            Err(LibrarySkip::UnknownType(package_type)) => {
                tracing::error!("{}", skip_message("type", &record, "type"));
                tracing::debug!("unhandled package type {package_type}");
                continue;
            }
            Err(LibrarySkip::MissingField(field)) => {
                tracing::warn!("{}", skip_message(field, &record, field));
                continue;
            }
        };

        let read_length = record.get("read_length").unwrap_or_else(|| {
            tracing::warn!("Missing (read_length) bpa_id: {bpa_id} id: {}", package.id);
            ""
        });

        if files.is_empty() {
            tracing::debug!("No files to submit bpa_id: {bpa_id} id: {}", package.id);
            continue;
        }

        rows.push(SraRow {
            bioproject_accession: project.bioproject_accession().to_string(),
            biosample_accession: biosample_accession.to_string(),
            sample_name,
            library,
            library_selection: "PCR".to_string(),
            library_layout: "paired".to_string(),
            platform: "ILLUMINA".to_string(),
            design_description: project.design_description().to_string(),
            reference_genome_assembly: String::new(),
            alignment_software: String::new(),
            forward_read_length: read_length.to_string(),
            reverse_read_length: read_length.to_string(),
            files,
        });
    }
    rows
}

/// The package type of a record, if it is one `project` handles.
pub fn record_package_type(
    project: &dyn Project,
    record: &Record,
) -> Result<PackageType, LibrarySkip> {
    let raw = record.get("type").unwrap_or("");
    raw.parse::<PackageType>()
        .ok()
        .filter(|package_type| project.package_types().contains(package_type))
        .ok_or_else(|| LibrarySkip::UnknownType(raw.to_string()))
}

pub(crate) fn required<'a>(record: &'a Record, field: &'static str) -> Result<&'a str, LibrarySkip> {
    record
        .non_empty(field)
        .ok_or(LibrarySkip::MissingField(field))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn package(value: serde_json::Value) -> Package {
        serde_json::from_value(value).unwrap()
    }

    fn marine(id: &str, bpa_id: &str, extra: serde_json::Value) -> Package {
        let mut value = json!({
            "id": id,
            "type": "mm-metagenomics",
            "bpa_id": bpa_id,
            "sample_type": "Coastal water",
            "resources": [{
                "id": format!("{id}-r1"),
                "package_id": id,
                "url": format!("https://downloads.example.org/mm/{id}_R1.fastq.gz"),
                "md5": "0",
                "read": "R1",
            }],
        });
        for (key, field) in extra.as_object().unwrap() {
            value[key] = field.clone();
        }
        package(value)
    }

    fn resource(id: &str, read: Option<&str>, uploaded: bool) -> Resource {
        Resource {
            id: Some(id.to_string()),
            package_id: Some("p".to_string()),
            url: Some(format!("https://example.org/files/{id}.fastq.gz")),
            md5: Some(format!("md5-{id}")),
            read: read.map(str::to_string),
            ncbi_file_uploaded: uploaded,
        }
    }

    #[test]
    fn resources_filter_reads_and_uploaded_files() {
        let resources = vec![
            resource("a", Some("R1"), false),
            resource("b", Some("R2"), true),
            resource("c", Some("I1"), false),
            resource("d", None, false),
            resource("e", Some("R2"), false),
        ];
        let kept = resources_to_submit(&resources);
        let ids: Vec<&str> = kept.iter().map(|resource| resource.id()).collect();
        assert_eq!(ids, vec!["a", "e"]);
    }

    #[test]
    fn file_info_uses_last_url_segment() {
        let resources = vec![resource("a", Some("R1"), false)];
        let files = resource_file_info(&resources_to_submit(&resources));
        assert_eq!(
            files,
            vec![SequenceFile {
                filetype: "fastq".to_string(),
                filename: "a.fastq.gz".to_string(),
                md5: "md5-a".to_string(),
            }]
        );
    }

    #[test]
    fn lat_lon_is_mandatory_without_a_usable_spatial() {
        let packages = vec![
            marine("a", "102.100.100.1", json!({"depth": "0"})),
            marine("b", "102.100.100.2", json!({"depth": "0", "spatial": "not json"})),
            marine(
                "c",
                "102.100.100.3",
                json!({"depth": "0", "spatial": r#"{"type": "Point", "coordinates": [151.0, -34.0]}"#}),
            ),
        ];

        let rows = biosample_rows(&MarineMicrobes, &packages);

        let lat_lon: Vec<&str> = rows.iter().map(|row| row.lat_lon.as_str()).collect();
        assert_eq!(
            lat_lon,
            vec![MANDATORY, MANDATORY, "34.000000 S 151.000000 E"]
        );
    }

    #[test]
    fn each_depth_of_a_sample_is_its_own_biosample() {
        let packages = vec![
            marine("a", "102.100.100.7", json!({"depth": "10"})),
            marine("b", "102.100.100.7", json!({"depth": "5"})),
            marine("c", "102.100.100.7", json!({"depth": "10"})),
        ];

        let rows = biosample_rows(&MarineMicrobes, &packages);

        let isolates: Vec<&str> = rows.iter().map(|row| row.isolate.as_str()).collect();
        assert_eq!(isolates, vec!["102.100.100/7_10", "102.100.100/7_5"]);
        assert!(rows.iter().all(|row| row.sample_name == "102.100.100/7"));
    }

    #[test]
    fn missing_read_length_leaves_lengths_blank() {
        let packages = vec![
            marine("a", "102.100.100.1", json!({"read_length": "250"})),
            marine("b", "102.100.100.2", json!({})),
        ];

        let rows = sra_rows(&MarineMicrobes, &packages);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].forward_read_length, "250");
        assert_eq!(rows[0].reverse_read_length, "250");
        assert_eq!(rows[1].forward_read_length, "");
        assert_eq!(rows[1].reverse_read_length, "");
    }

    #[test]
    fn existing_biosample_blanks_the_sample_name() {
        let packages = vec![marine(
            "a",
            "102.100.100.1",
            json!({"ncbi_biosample_accession": "SAMN0001"}),
        )];

        assert!(biosample_rows(&MarineMicrobes, &packages).is_empty());
        let rows = sra_rows(&MarineMicrobes, &packages);
        assert_eq!(rows[0].biosample_accession, "SAMN0001");
        assert_eq!(rows[0].sample_name, None);
    }

    #[test]
    fn packages_to_submit_sorts_and_filters() {
        let records = vec![
            [("bpa_id", "102.100.100.20"), ("spatial", "x")]
                .into_iter()
                .collect::<Record>(),
            [("bpa_id", "102.100.100.3"), ("spatial", "")]
                .into_iter()
                .collect::<Record>(),
            [("bpa_id", "102.100.100.4"), ("spatial", "y")]
                .into_iter()
                .collect::<Record>(),
        ];
        let kept = packages_to_submit(records, "spatial");
        let ids: Vec<_> = kept.iter().map(|r| r.get("bpa_id").unwrap()).collect();
        assert_eq!(ids, vec!["102.100.100.4", "102.100.100.20"]);
    }
}

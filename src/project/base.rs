use crate::domain::{BpaId, Exporter, PackageType, normalize_instrument_model};
use crate::grouping::Record;
use crate::ncbi::{LibraryFields, TemplateNames};
use crate::project::{
    BIOSAMPLE_CUSTOM_FIELDS, LibrarySkip, Project, SampleAttributes, record_package_type, required,
};

/// Biome of Australian Soil Environments.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base;

const PACKAGE_TYPES: &[PackageType] = &[
    PackageType::BaseMetagenomics,
    PackageType::BaseGenomicsAmplicon,
];

impl Project for Base {
    fn exporter(&self) -> Exporter {
        Exporter::BaseNcbi
    }

    fn package_types(&self) -> &'static [PackageType] {
        PACKAGE_TYPES
    }

    fn uses_embargo(&self) -> bool {
        false
    }

    fn required_field(&self) -> &'static str {
        "spatial"
    }

    fn bioproject_accession(&self) -> &'static str {
        "PRJNA317932"
    }

    fn design_description(&self) -> &'static str {
        "http://www.bioplatforms.com/soil-biodiversity/"
    }

    fn sample_attributes(&self, record: &Record) -> SampleAttributes {
        SampleAttributes {
            collection_date: record.get("date_sampled").unwrap_or("2015").to_string(),
            geo_loc_name: format!(
                "{}: {}",
                record.get("geo_loc_name").unwrap_or("Australia"),
                record.get("location_description").unwrap_or("")
            ),
            organism: "soil metagenome".to_string(),
            isolation_source: "Soil".to_string(),
        }
    }

    fn library_fields(
        &self,
        record: &Record,
        bpa_id: &BpaId,
    ) -> Result<LibraryFields, LibrarySkip> {
        match record_package_type(self, record)? {
            // each amplicon row is a unique (bpa_id, amplicon, flow_id)
            PackageType::BaseGenomicsAmplicon => Ok(LibraryFields {
                library_id: format!(
                    "{}_{}_{}",
                    bpa_id.short(),
                    required(record, "amplicon")?.to_uppercase(),
                    required(record, "flow_id")?
                ),
                title: "Soil_amplicon".to_string(),
                library_strategy: "AMPLICON".to_string(),
                library_source: "GENOMIC".to_string(),
                instrument_model: "Illumina MiSeq".to_string(),
            }),
            PackageType::BaseMetagenomics => Ok(LibraryFields {
                library_id: format!("{}_{}", bpa_id.short(), required(record, "flow_id")?),
                title: "Soil_metagenomics".to_string(),
                library_strategy: "WGS".to_string(),
                library_source: "METAGENOMIC".to_string(),
                instrument_model: normalize_instrument_model(
                    record.get("sequencer").unwrap_or(""),
                    bpa_id.as_str(),
                    record.get("id").unwrap_or(""),
                ),
            }),
            other => Err(LibrarySkip::UnknownType(other.to_string())),
        }
    }

    fn template_names(&self) -> TemplateNames {
        TemplateNames {
            biosample_base: "Metagenome.environmental.1.0-BASE".to_string(),
            sra_base: "SRA_subtemplate_v2-8-BASE".to_string(),
            biosample_custom_fields: BIOSAMPLE_CUSTOM_FIELDS.to_vec(),
        }
    }
}

use crate::domain::{BpaId, Exporter, MANDATORY, PackageType, normalize_instrument_model};
use crate::grouping::Record;
use crate::ncbi::{LibraryFields, TemplateNames};
use crate::project::{
    BIOSAMPLE_CUSTOM_FIELDS, LibrarySkip, Project, SampleAttributes, record_package_type, required,
};

/// Marine Microbes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarineMicrobes;

const PACKAGE_TYPES: &[PackageType] = &[
    PackageType::MmMetagenomics,
    PackageType::MmGenomicsAmplicon,
    PackageType::MmMetatranscriptome,
];

impl MarineMicrobes {
    fn sequenced_library(
        record: &Record,
        bpa_id: &BpaId,
        title: &str,
        strategy: &str,
        source: &str,
    ) -> LibraryFields {
        LibraryFields {
            library_id: bpa_id.slash(),
            title: title.to_string(),
            library_strategy: strategy.to_string(),
            library_source: source.to_string(),
            instrument_model: normalize_instrument_model(
                record.get("sequencer").unwrap_or(""),
                bpa_id.as_str(),
                record.get("id").unwrap_or(""),
            ),
        }
    }
}

impl Project for MarineMicrobes {
    fn exporter(&self) -> Exporter {
        Exporter::MmNcbi
    }

    fn package_types(&self) -> &'static [PackageType] {
        PACKAGE_TYPES
    }

    fn uses_embargo(&self) -> bool {
        true
    }

    fn required_field(&self) -> &'static str {
        "sample_type"
    }

    fn bioproject_accession(&self) -> &'static str {
        "PRJNA385736"
    }

    fn design_description(&self) -> &'static str {
        "http://www.bioplatforms.com/marine-microbes/"
    }

    fn sample_attributes(&self, record: &Record) -> SampleAttributes {
        SampleAttributes {
            collection_date: record.get("date_sampled").unwrap_or(MANDATORY).to_string(),
            geo_loc_name: record.get("geo_loc").unwrap_or(MANDATORY).to_string(),
            organism: "marine metagenome".to_string(),
            isolation_source: record.get("sample_type").unwrap_or("").to_string(),
        }
    }

    fn library_fields(
        &self,
        record: &Record,
        bpa_id: &BpaId,
    ) -> Result<LibraryFields, LibrarySkip> {
        match record_package_type(self, record)? {
            PackageType::MmGenomicsAmplicon => Ok(LibraryFields {
                library_id: format!(
                    "{}_{}_{}",
                    bpa_id.short(),
                    required(record, "amplicon")?.to_uppercase(),
                    required(record, "mm_amplicon_linkage")?
                ),
                title: "Marine_amplicon".to_string(),
                library_strategy: "AMPLICON".to_string(),
                library_source: "GENOMIC".to_string(),
                instrument_model: "Illumina MiSeq".to_string(),
            }),
            PackageType::MmMetagenomics => Ok(Self::sequenced_library(
                record,
                bpa_id,
                "Marine_metagenomics",
                "WGS",
                "METAGENOMIC",
            )),
            PackageType::MmMetatranscriptome => Ok(Self::sequenced_library(
                record,
                bpa_id,
                "Marine_metatranscriptome",
                "RNA-Seq",
                "METATRANSCRIPTOME",
            )),
            other => Err(LibrarySkip::UnknownType(other.to_string())),
        }
    }

    fn template_names(&self) -> TemplateNames {
        TemplateNames {
            biosample_base: "Metagenome.environmental.1.0-MM".to_string(),
            sra_base: "SRA_subtemplate_v2-8-MM".to_string(),
            biosample_custom_fields: BIOSAMPLE_CUSTOM_FIELDS.to_vec(),
        }
    }
}

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;

pub const MANDATORY: &str = "MANDATORY";
pub const DEFAULT_INSTRUMENT_MODEL: &str = "Illumina HiSeq 2500";

static BPA_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z]+(\.[0-9A-Za-z]+)+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Exporter {
    BaseNcbi,
    MmNcbi,
}

impl Exporter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exporter::BaseNcbi => "base-ncbi",
            Exporter::MmNcbi => "mm-ncbi",
        }
    }
}

impl fmt::Display for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CKAN package types this tool exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    BaseMetagenomics,
    BaseGenomicsAmplicon,
    MmGenomicsAmplicon,
    MmMetagenomics,
    MmMetatranscriptome,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::BaseMetagenomics => "base-metagenomics",
            PackageType::BaseGenomicsAmplicon => "base-genomics-amplicon",
            PackageType::MmGenomicsAmplicon => "mm-genomics-amplicon",
            PackageType::MmMetagenomics => "mm-metagenomics",
            PackageType::MmMetatranscriptome => "mm-metatranscriptome",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PackageType {
    type Err = SubmitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "base-metagenomics" => Ok(PackageType::BaseMetagenomics),
            "base-genomics-amplicon" => Ok(PackageType::BaseGenomicsAmplicon),
            "mm-genomics-amplicon" => Ok(PackageType::MmGenomicsAmplicon),
            "mm-metagenomics" => Ok(PackageType::MmMetagenomics),
            "mm-metatranscriptome" => Ok(PackageType::MmMetatranscriptome),
            _ => Err(SubmitError::InvalidPackageType(value.to_string())),
        }
    }
}

/// Dotted BPA sample identifier, e.g. `102.100.100.7054`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BpaId(String);

impl BpaId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id with its last `.` replaced by `/`, as NCBI expects sample names.
    pub fn slash(&self) -> String {
        match self.0.rsplit_once('.') {
            Some((head, tail)) => format!("{head}/{tail}"),
            None => self.0.clone(),
        }
    }

    /// The segment after the last `.`.
    pub fn short(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey::from_suffix(self.short())
    }
}

impl fmt::Display for BpaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BpaId {
    type Err = SubmitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if !BPA_ID_PATTERN.is_match(normalized) {
            return Err(SubmitError::InvalidBpaId(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

/// Ordering for identifiers by their numeric suffix. Suffixes that are not
/// numbers sort after all numeric ones, then lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Numeric(u64),
    Text(String),
}

impl SortKey {
    pub fn from_suffix(suffix: &str) -> Self {
        match suffix.trim().parse::<u64>() {
            Ok(value) => SortKey::Numeric(value),
            Err(_) => SortKey::Text(suffix.to_string()),
        }
    }
}

/// Depths are sometimes stored as floats; NCBI wants whole metres. Values
/// that are not numbers (`10_20`) pass through unchanged.
pub fn represent_depth(depth: &str) -> String {
    match depth.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => format!("{}", value.trunc() as i64),
        _ => depth.to_string(),
    }
}

pub fn generate_isolate(bpa_id: &BpaId, depth: &str) -> String {
    if depth.is_empty() {
        return String::new();
    }
    format!("{}_{}", bpa_id.slash(), represent_depth(depth))
}

#[derive(Debug, Deserialize)]
struct SpatialPoint {
    coordinates: Vec<f64>,
}

/// Convert a CKAN GeoJSON point into the NCBI `lat_lon` form,
/// `"12.500000 S 130.250000 E"`.
pub fn ncbi_lat_lon(spatial_json: &str) -> Result<String, SubmitError> {
    let point: SpatialPoint = serde_json::from_str(spatial_json)
        .map_err(|err| SubmitError::InvalidSpatial(format!("{spatial_json}: {err}")))?;
    let [lng, lat] = point.coordinates.as_slice() else {
        return Err(SubmitError::InvalidSpatial(format!(
            "{spatial_json}: expected two coordinates"
        )));
    };
    let n_s = if *lat < 0.0 { 'S' } else { 'N' };
    let e_w = if *lng < 0.0 { 'W' } else { 'E' };
    Ok(format!(
        "{:.6} {} {:.6} {}",
        lat.abs(),
        n_s,
        lng.abs(),
        e_w
    ))
}

/// Sequencer names in CKAN are not always in the form NCBI accepts.
pub fn normalize_instrument_model(value: &str, bpa_id: &str, id: &str) -> String {
    match value {
        "HiSeq2500" | "HiSeq 2500" => {
            tracing::warn!("Rename (instrument_model) bpa_id: {bpa_id} id: {id}");
            DEFAULT_INSTRUMENT_MODEL.to_string()
        }
        "" => {
            tracing::warn!("Missing (instrument_model) bpa_id: {bpa_id} id: {id}");
            DEFAULT_INSTRUMENT_MODEL.to_string()
        }
        other => other.to_string(),
    }
}

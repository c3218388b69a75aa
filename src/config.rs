use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::SubmitError;
use crate::ncbi::DEFAULT_SRA_CHUNK_SIZE;

pub const DEFAULT_CONFIG_FILE: &str = "bpa-submit.json";
/// Row limit of the BPA CKAN instance, raised from the CKAN default of 1000.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10_000;
pub const DEFAULT_EMBARGO_MONTHS: u32 = 3;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub ckan_url: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub sra_chunk_size: Option<usize>,
    #[serde(default)]
    pub search_limit: Option<u32>,
    #[serde(default)]
    pub embargo_months: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub ckan_url: Option<String>,
    pub output_dir: Utf8PathBuf,
    pub sra_chunk_size: usize,
    pub search_limit: u32,
    pub embargo_months: u32,
}

/// Command line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub ckan_url: Option<String>,
    pub output_dir: Option<String>,
    pub sra_chunk_size: Option<usize>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `path`, or `bpa-submit.json` from the working directory when no
    /// path is given. Only an explicitly named file has to exist.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, SubmitError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| SubmitError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| SubmitError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, SubmitError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(SubmitError::InvalidConfig(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let sra_chunk_size = overrides
            .sra_chunk_size
            .or(config.sra_chunk_size)
            .unwrap_or(DEFAULT_SRA_CHUNK_SIZE);
        if sra_chunk_size == 0 {
            return Err(SubmitError::InvalidConfig(
                "sra_chunk_size must be greater than zero".to_string(),
            ));
        }

        let search_limit = config.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if search_limit == 0 {
            return Err(SubmitError::InvalidConfig(
                "search_limit must be greater than zero".to_string(),
            ));
        }

        let ckan_url = overrides
            .ckan_url
            .or(config.ckan_url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        let output_dir = overrides
            .output_dir
            .or(config.output_dir)
            .unwrap_or_else(|| ".".to_string());

        Ok(ResolvedConfig {
            schema_version,
            ckan_url,
            output_dir: Utf8PathBuf::from(output_dir),
            sra_chunk_size,
            search_limit,
            embargo_months: config.embargo_months.unwrap_or(DEFAULT_EMBARGO_MONTHS),
        })
    }
}

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};

use crate::error::SubmitError;
use crate::grouping::Record;

/// A CKAN package as returned by `package_search`. Fields this tool does not
/// model explicitly are kept verbatim in `fields`.
#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub package_type: String,
    #[serde(default)]
    pub resources: Option<Vec<Resource>>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Package {
    pub fn resources(&self) -> &[Resource] {
        self.resources.as_deref().unwrap_or(&[])
    }

    pub fn field(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(value_to_string)
    }

    /// Flatten the package into string values so that packages can be
    /// compared field by field regardless of the JSON type of each value.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("id", self.id.clone());
        record.insert("type", self.package_type.clone());
        if let Some(resources) = &self.resources {
            if let Ok(text) = serde_json::to_string(resources) {
                record.insert("resources", text);
            }
        }
        for (key, value) in &self.fields {
            if let Some(text) = value_to_string(value) {
                record.insert(key, text);
            }
        }
        record
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Resource {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub package_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub md5: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub read: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub ncbi_file_uploaded: bool,
}

impl Resource {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    pub fn package_id(&self) -> &str {
        self.package_id.as_deref().unwrap_or("")
    }

    /// The last path segment of the resource URL.
    pub fn filename(&self) -> &str {
        let url = self.url.as_deref().unwrap_or("");
        url.rsplit('/').next().unwrap_or(url)
    }
}

pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_string))
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(matches!(value, Some(Value::String(text)) if text == "True"))
}

pub trait CkanClient: Send + Sync {
    fn packages_of_type(&self, package_type: &str, limit: u32)
    -> Result<Vec<Package>, SubmitError>;
}

#[derive(Debug, Deserialize)]
struct ActionResponse {
    success: bool,
    #[serde(default)]
    result: Option<SearchResult>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    results: Vec<Package>,
}

#[derive(Clone)]
pub struct CkanHttpClient {
    client: Client,
    base_url: String,
}

impl CkanHttpClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, SubmitError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("bpa-submit/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SubmitError::CkanHttp(err.to_string()))?,
        );
        if let Some(api_key) = api_key.map(str::trim).filter(|key| !key.is_empty()) {
            let mut value = HeaderValue::from_str(api_key)
                .map_err(|err| SubmitError::CkanHttp(err.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|err| SubmitError::CkanHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn action_url(&self, action: &str) -> String {
        format!("{}/api/3/action/{}", self.base_url, action)
    }
}

impl CkanClient for CkanHttpClient {
    fn packages_of_type(
        &self,
        package_type: &str,
        limit: u32,
    ) -> Result<Vec<Package>, SubmitError> {
        let url = self.action_url("package_search");
        tracing::debug!("package_search type:{package_type} rows={limit}");
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "q": format!("type:{package_type}"),
                "include_private": true,
                "rows": limit,
            }))
            .send()
            .map_err(|err| SubmitError::CkanHttp(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "CKAN request failed".to_string());
            return Err(SubmitError::CkanStatus { status, message });
        }

        let body: ActionResponse = response
            .json()
            .map_err(|err| SubmitError::CkanPayload(err.to_string()))?;
        if !body.success {
            let message = body
                .error
                .map(|value| value.to_string())
                .unwrap_or_else(|| "package_search failed".to_string());
            return Err(SubmitError::CkanPayload(message));
        }
        let result = body
            .result
            .ok_or_else(|| SubmitError::CkanPayload("package_search returned no result".into()))?;
        if result.count > result.results.len() as u64 {
            tracing::warn!(
                "package_search type:{package_type} matched {} packages but returned {}",
                result.count,
                result.results.len()
            );
        }
        Ok(result.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_keeps_unknown_fields() {
        let package: Package = serde_json::from_value(json!({
            "id": "abc",
            "type": "base-metagenomics",
            "bpa_id": "102.100.100.7054",
            "depth": 0.1,
            "notes": null,
            "resources": [
                {"id": "r1", "read": "R1", "ncbi_file_uploaded": "True", "url": "https://x/y/a.fastq.gz"}
            ]
        }))
        .unwrap();

        let record = package.to_record();
        assert_eq!(record.get("bpa_id"), Some("102.100.100.7054"));
        assert_eq!(record.get("depth"), Some("0.1"));
        assert_eq!(record.get("notes"), None);
        assert_eq!(record.get("type"), Some("base-metagenomics"));
        assert!(package.resources()[0].ncbi_file_uploaded);
        assert_eq!(package.resources()[0].filename(), "a.fastq.gz");
    }

    #[test]
    fn only_the_true_string_marks_an_upload() {
        let uploaded = |flag: Value| {
            let resource: Resource =
                serde_json::from_value(json!({"id": "r", "ncbi_file_uploaded": flag})).unwrap();
            resource.ncbi_file_uploaded
        };
        let flags: Vec<bool> = [
            json!("True"),
            json!("true"),
            json!(true),
            json!("False"),
            json!(null),
        ]
        .into_iter()
        .map(uploaded)
        .collect();
        assert_eq!(flags, vec![true, false, false, false, false]);

        let resource: Resource = serde_json::from_value(json!({"id": "r"})).unwrap();
        assert!(!resource.ncbi_file_uploaded);
    }

    #[test]
    fn action_url_strips_trailing_slash() {
        let client = CkanHttpClient::new("https://data.bioplatforms.com/", None).unwrap();
        assert_eq!(
            client.action_url("package_search"),
            "https://data.bioplatforms.com/api/3/action/package_search"
        );
    }
}

use std::collections::{BTreeMap, HashMap};

use crate::ckan::Package;
use crate::domain::SortKey;

/// A flattened package: every field as a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The value of `key`, treating an empty string like a missing one.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn sort_key(&self) -> SortKey {
        let bpa_id = self.get("bpa_id").unwrap_or("");
        SortKey::from_suffix(bpa_id.rsplit('.').next().unwrap_or(bpa_id))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// Keep only the fields every record has, with the same value in each.
pub fn common_values(records: &[Record]) -> Record {
    let Some((first, rest)) = records.split_first() else {
        return Record::new();
    };
    first
        .values
        .iter()
        .filter(|(key, value)| {
            rest.iter()
                .all(|other| other.get(key) == Some(value.as_str()))
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Group packages by (bpa_id, depth) and reduce each group to the values its
/// members agree on. One record comes out per sample and depth, in the order
/// each pair was first seen.
pub fn build_id_depth_metadata(packages: &[Package]) -> Vec<Record> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<Vec<Record>> = Vec::new();
    for package in packages {
        let record = package.to_record();
        let Some(bpa_id) = record.non_empty("bpa_id").map(str::to_string) else {
            tracing::warn!(
                "Skipping package (bpa_id missing) id: {} type: {}",
                package.id,
                package.package_type
            );
            continue;
        };
        let depth = record.get("depth").unwrap_or("").to_string();
        let slot = *index.entry((bpa_id, depth)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(record);
    }

    groups
        .iter()
        .map(|members| common_values(members))
        .collect()
}

/// Stable sort by the numeric suffix of `bpa_id`.
pub fn sort_by_bpa_id(records: &mut [Record]) {
    records.sort_by_key(Record::sort_key);
}

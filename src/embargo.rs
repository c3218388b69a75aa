use chrono::{Months, NaiveDate};

use crate::ckan::Package;

pub const INGESTION_DATE_FIELD: &str = "archive_ingestion_date";

/// Keep packages that entered the archive at least `months` calendar months
/// before `today`. Packages without a readable ingestion date stay embargoed.
pub fn apply_embargo(packages: Vec<Package>, months: u32, today: NaiveDate) -> Vec<Package> {
    let before = packages.len();
    let released: Vec<Package> = packages
        .into_iter()
        .filter(|package| is_released(package, months, today))
        .collect();
    tracing::info!(
        "embargo of {months} months: {} of {before} packages released",
        released.len()
    );
    released
}

fn is_released(package: &Package, months: u32, today: NaiveDate) -> bool {
    let raw = package.field(INGESTION_DATE_FIELD).unwrap_or_default();
    let Some(ingested) = parse_ingestion_date(&raw) else {
        tracing::warn!(
            "Skipping package (embargo, {INGESTION_DATE_FIELD} unreadable) id: {} value: {raw:?}",
            package.id
        );
        return false;
    };
    match ingested.checked_add_months(Months::new(months)) {
        Some(release) if release <= today => true,
        _ => {
            tracing::debug!(
                "Skipping package (embargo) id: {} ingested: {ingested}",
                package.id
            );
            false
        }
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time component.
pub fn parse_ingestion_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

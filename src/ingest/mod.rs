//! Offline import pipeline: raw spreadsheet rows → normalized congress
//! records → JSON snapshot file or SQLite upserts.

pub mod normalize;
pub mod xlsx;

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::types::{score_from_tier, CongressRecord};

/// One spreadsheet row, keyed off the German column headers.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    /// 1-based row number in the source sheet, for log messages.
    pub row: u32,
    pub name: Option<String>,
    pub pillar: Option<String>,
    pub organizer: Option<String>,
    pub indication_detail: Option<String>,
    pub tier: Option<String>,
    pub month: Option<String>,
    pub location: Option<String>,
    pub website_url: Option<String>,
    pub deadlines: Option<String>,
    pub rationale: Option<String>,
    pub tags: Option<String>,
}

/// Why a row was dropped instead of normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingName,
    MissingPillar,
    MissingUrl,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingName => "missing Name",
            SkipReason::MissingPillar => "missing Pillar (indication)",
            SkipReason::MissingUrl => "missing website URL",
        }
    }
}

/// A fully normalized congress, minus the identifier and timestamp the two
/// output paths assign differently (slug vs. database id).
#[derive(Debug, Clone)]
pub struct NormalizedCongress {
    pub name: String,
    pub indication: String,
    pub indication_detail: Option<String>,
    pub organizer: Option<String>,
    pub tier: i64,
    pub score: i64,
    pub region: String,
    pub scope: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub location_text: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub typical_month: Option<i64>,
    pub website_url: String,
    pub deadlines_text: Option<String>,
    pub rationale: Option<String>,
    pub tags: Vec<String>,
}

/// Normalize a single raw row. Malformed optional fields degrade to `None`;
/// only the absence of name, pillar or website URL skips the row.
pub fn normalize_row(raw: &RawRow, fallback_region: &str) -> Result<NormalizedCongress, SkipReason> {
    let name = raw.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let Some(name) = name else { return Err(SkipReason::MissingName) };

    let pillar = raw.pillar.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let Some(pillar) = pillar else { return Err(SkipReason::MissingPillar) };

    let Some(website_url) = normalize::normalize_url(raw.website_url.as_deref()) else {
        return Err(SkipReason::MissingUrl);
    };

    let tier = normalize::parse_tier(raw.tier.as_deref());
    let month = normalize::parse_month_field(raw.month.as_deref());
    let (city, country) = normalize::parse_location(raw.location.as_deref());
    let region = normalize::derive_region(country.as_deref(), fallback_region);

    Ok(NormalizedCongress {
        name: name.to_string(),
        indication: pillar.to_string(),
        indication_detail: raw.indication_detail.clone(),
        organizer: raw.organizer.clone(),
        tier,
        score: score_from_tier(tier),
        region,
        scope: "International".to_string(),
        country,
        city,
        location_text: raw.location.clone(),
        start_date: month.start_date,
        end_date: month.end_date,
        typical_month: month.typical_month,
        website_url,
        deadlines_text: raw.deadlines.clone(),
        rationale: raw.rationale.clone(),
        tags: normalize::parse_tags(raw.tags.as_deref()),
    })
}

/// Assigns stable slug identifiers in first-seen order, disambiguating
/// collisions with "-1", "-2", … suffixes.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    counts: HashMap<String, u32>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, name: &str, row: u32) -> String {
        let mut base = normalize::slugify(name);
        if base.is_empty() {
            base = format!("congress-{}", row);
        }
        let count = self.counts.entry(base.clone()).or_insert(0);
        let id = if *count == 0 { base.clone() } else { format!("{}-{}", base, count) };
        *count += 1;
        id
    }
}

/// Counts reported back to the operator after an import run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportReport {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
}

/// Turn raw rows into a wholesale snapshot: slug ids, one shared timestamp,
/// one warning per skipped row.
pub fn rows_to_snapshot(rows: &[RawRow], fallback_region: &str) -> (Vec<CongressRecord>, ImportReport) {
    let mut report = ImportReport::default();
    let mut records = Vec::with_capacity(rows.len());
    let mut slugs = SlugRegistry::new();
    let updated_at: DateTime<Utc> = Utc::now();

    for raw in rows {
        match normalize_row(raw, fallback_region) {
            Ok(rec) => {
                let id = slugs.assign(&rec.name, raw.row);
                records.push(into_record(rec, id, updated_at));
                report.inserted += 1;
            }
            Err(reason) => {
                warn_skip(raw, reason);
                report.skipped += 1;
            }
        }
    }

    (records, report)
}

/// Upsert raw rows into the database, keyed on website_url.
pub async fn import_to_db(
    pool: &sqlx::SqlitePool,
    rows: &[RawRow],
    fallback_region: &str,
) -> AppResult<ImportReport> {
    let mut report = ImportReport::default();

    for raw in rows {
        match normalize_row(raw, fallback_region) {
            Ok(rec) => match crate::store::sql::upsert_congress(pool, &rec).await {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.updated += 1,
                Err(e) => {
                    tracing::error!("Row {} \"{}\": {}", raw.row, rec.name, e);
                    report.skipped += 1;
                }
            },
            Err(reason) => {
                warn_skip(raw, reason);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Write the snapshot file, creating parent directories as needed. The file
/// is regenerated wholesale on each run, never patched incrementally.
pub fn write_snapshot(path: &Path, records: &[CongressRecord]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to serialize snapshot: {}", e)))?;
    std::fs::write(path, json)?;
    Ok(())
}

fn into_record(rec: NormalizedCongress, id: String, updated_at: DateTime<Utc>) -> CongressRecord {
    CongressRecord {
        id,
        name: rec.name,
        indication: rec.indication,
        indication_detail: rec.indication_detail,
        organizer: rec.organizer,
        tier: rec.tier,
        score: rec.score,
        region: rec.region,
        scope: rec.scope,
        country: rec.country,
        city: rec.city,
        location_text: rec.location_text,
        start_date: rec.start_date,
        end_date: rec.end_date,
        typical_month: rec.typical_month,
        website_url: rec.website_url,
        deadlines_text: rec.deadlines_text,
        rationale: rec.rationale,
        tags: rec.tags,
        updated_at,
    }
}

fn warn_skip(raw: &RawRow, reason: SkipReason) {
    let name = raw.name.as_deref().unwrap_or("<unnamed>");
    tracing::warn!("Row {}: skipping \"{}\" - {}", raw.row, name, reason.as_str());
}

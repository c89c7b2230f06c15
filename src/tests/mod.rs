//! Test modules for the MedicalMap backend.
//!
//! - **normalize_tests**: spreadsheet normalization (tier, dates, location, slugs)
//! - **params_tests**: query-string parsing into FilterSpec
//! - **engine_tests**: the in-memory filter/facet/sort engine
//! - **export_tests**: CSV/XLSX buffer building
//! - **store_tests**: the sqlite backend, including parity with the engine
//! - **api_tests**: router-level endpoint tests
//! - **config_tests**: configuration defaults
//! - **error_tests**: error rendering

pub mod api_tests;
pub mod error_tests;
pub mod export_tests;
pub mod params_tests;
pub mod store_tests;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::types::{score_from_tier, CongressRecord};

/// A minimal record with the given name and tier; tests mutate the rest.
pub fn record(id: &str, name: &str, tier: i64) -> CongressRecord {
    CongressRecord {
        id: id.to_string(),
        name: name.to_string(),
        indication: "Oncology".to_string(),
        indication_detail: None,
        organizer: None,
        tier,
        score: score_from_tier(tier),
        region: "EU".to_string(),
        scope: "International".to_string(),
        country: None,
        city: None,
        location_text: None,
        start_date: None,
        end_date: None,
        typical_month: None,
        website_url: format!("https://example.org/{}", id),
        deadlines_text: None,
        rationale: None,
        tags: Vec::new(),
        updated_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The three-record scenario used across engine, store and API tests:
/// A(tier=1, "Zeta"), B(tier=2, "Alpha"), C(tier=1, "Beta").
pub fn scenario_records() -> Vec<CongressRecord> {
    vec![record("a", "Zeta", 1), record("b", "Alpha", 2), record("c", "Beta", 1)]
}

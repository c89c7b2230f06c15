use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One row of the congress directory, as served by the API and stored in the
/// snapshot file / the `congresses` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CongressRecord {
    pub id: String,
    pub name: String,
    /// Therapeutic-area category ("pillar" in the source spreadsheet).
    pub indication: String,
    #[serde(default)]
    pub indication_detail: Option<String>,
    #[serde(default)]
    pub organizer: Option<String>,
    /// Editorial importance ranking, 1 (highest) to 3.
    pub tier: i64,
    /// Derived from tier: 1→90, 2→75, 3→60. Never stored truth of its own.
    pub score: i64,
    pub region: String,
    pub scope: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Original unparsed location free text, kept for display.
    #[serde(default)]
    pub location_text: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub typical_month: Option<i64>,
    pub website_url: String,
    #[serde(default)]
    pub deadlines_text: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Score is a pure function of tier.
pub fn score_from_tier(tier: i64) -> i64 {
    match tier {
        1 => 90,
        2 => 75,
        _ => 60,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    pub count: i64,
}

/// Per-field value counts over the filtered (unpaginated) result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Facets {
    pub tier: Vec<FacetCount>,
    pub region: Vec<FacetCount>,
    pub country: Vec<FacetCount>,
    pub month: Vec<FacetCount>,
    pub ind: Vec<FacetCount>,
}

/// Response body of `GET /v1/congresses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CongressPage {
    pub items: Vec<CongressRecord>,
    pub total: i64,
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    pub facets: Facets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

/// A finished export artifact: the bytes plus what the mailer needs to attach it.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Body of `POST /v1/exports`. Everything is optional at the serde layer so
/// that validation can report per-field errors instead of a bare 422.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequestBody {
    pub email: Option<String>,
    #[serde(default)]
    pub filters: ExportFilters,
    #[serde(rename = "exportType")]
    pub export_type: Option<String>,
    #[serde(rename = "consentExport")]
    pub consent_export: Option<bool>,
    #[serde(rename = "consentMarketing", default)]
    pub consent_marketing: bool,
    /// Honeypot: hidden form field that real users never fill in.
    #[serde(rename = "_hp", default)]
    pub hp: Option<String>,
}

/// Filter block of the export body; arrays arrive pre-split (JSON arrays),
/// unlike the comma-delimited query string of `GET /v1/congresses`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportFilters {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub ind: Vec<String>,
    #[serde(default)]
    pub tier: Vec<String>,
    #[serde(default)]
    pub region: Vec<String>,
    #[serde(default)]
    pub country: Vec<String>,
    #[serde(default)]
    pub month: Vec<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
}

//! Query-string parsing into a typed [`FilterSpec`]. Pure and side-effect
//! free; downstream code never re-validates.

use std::collections::HashMap;

use crate::types::ExportFilters;

pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 200;

/// Sortable columns. Anything else falls back to `Name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    StartDate,
    Tier,
    Score,
}

impl SortKey {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "start_date" => SortKey::StartDate,
            "tier" => SortKey::Tier,
            "score" => SortKey::Score,
            _ => SortKey::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    /// Only the literal "desc" sorts descending.
    pub fn parse(raw: &str) -> Self {
        if raw == "desc" {
            SortDir::Desc
        } else {
            SortDir::Asc
        }
    }
}

/// A fully-typed filter/sort/page specification, derived per request.
/// Empty sets mean "no constraint".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub q: Option<String>,
    pub ind: Vec<String>,
    pub tier: Vec<i64>,
    pub region: Vec<String>,
    pub country: Vec<String>,
    pub month: Vec<i64>,
    pub sort: SortKey,
    pub dir: SortDir,
    pub page: u32,
    pub page_size: u32,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            q: None,
            ind: Vec::new(),
            tier: Vec::new(),
            region: Vec::new(),
            country: Vec::new(),
            month: Vec::new(),
            sort: SortKey::Name,
            dir: SortDir::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl FilterSpec {
    /// Parse the raw query string map of `GET /v1/congresses`.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).map(String::as_str);
        Self {
            q: get("q").map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
            ind: parse_comma_list(get("ind")),
            tier: parse_numeric_list(get("tier")),
            region: parse_comma_list(get("region")),
            country: parse_comma_list(get("country")),
            month: parse_numeric_list(get("month")),
            sort: SortKey::parse(get("sort").unwrap_or("name")),
            dir: SortDir::parse(get("dir").unwrap_or("asc")),
            page: parse_page_param(get("page"), 1),
            page_size: parse_page_param(get("pageSize"), DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
        }
    }

    /// Build the same spec from the export body, whose lists arrive
    /// pre-split. Exports are unpaginated; page fields keep their defaults.
    pub fn from_export_filters(filters: &ExportFilters) -> Self {
        Self {
            q: filters.q.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
            ind: clean_list(&filters.ind),
            tier: clean_numeric_list(&filters.tier),
            region: clean_list(&filters.region),
            country: clean_list(&filters.country),
            month: clean_numeric_list(&filters.month),
            sort: SortKey::parse(filters.sort.as_deref().unwrap_or("name")),
            dir: SortDir::parse(filters.dir.as_deref().unwrap_or("asc")),
            ..Self::default()
        }
    }

    /// True when no filter dimension constrains the result.
    pub fn is_unfiltered(&self) -> bool {
        self.q.is_none()
            && self.ind.is_empty()
            && self.tier.is_empty()
            && self.region.is_empty()
            && self.country.is_empty()
            && self.month.is_empty()
    }
}

/// Split a comma-delimited parameter, trimming and dropping empty segments.
pub fn parse_comma_list(raw: Option<&str>) -> Vec<String> {
    match raw {
        None => Vec::new(),
        Some(raw) => raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect(),
    }
}

/// Comma list of integers; non-numeric segments are dropped.
pub fn parse_numeric_list(raw: Option<&str>) -> Vec<i64> {
    parse_comma_list(raw).iter().filter_map(|s| s.parse().ok()).collect()
}

fn clean_list(values: &[String]) -> Vec<String> {
    values.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn clean_numeric_list(values: &[String]) -> Vec<i64> {
    values.iter().filter_map(|s| s.trim().parse().ok()).collect()
}

/// Positive integer with silent fallback on junk input.
pub fn parse_page_param(raw: Option<&str>, fallback: u32) -> u32 {
    match raw.and_then(|s| s.trim().parse::<u32>().ok()) {
        Some(n) if n > 0 => n,
        _ => fallback,
    }
}

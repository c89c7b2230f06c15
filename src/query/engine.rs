//! In-memory filter/facet/sort engine: the linear-scan implementation of the
//! query contract, used by the snapshot store. Pure over its inputs — the
//! SQL-backed store implements the same semantics per request.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::query::params::{FilterSpec, SortDir, SortKey};
use crate::types::{CongressPage, CongressRecord, FacetCount, Facets};

/// Country facets are capped to keep the sidebar payload bounded.
pub const COUNTRY_FACET_LIMIT: usize = 30;

/// All constraints AND together; each multi-value constraint ORs internally.
pub fn matches(c: &CongressRecord, spec: &FilterSpec) -> bool {
    if let Some(q) = &spec.q {
        let q = q.to_lowercase();
        let contains = |v: Option<&str>| v.is_some_and(|v| v.to_lowercase().contains(&q));
        let hit = c.name.to_lowercase().contains(&q)
            || contains(c.city.as_deref())
            || contains(c.country.as_deref())
            || contains(c.organizer.as_deref())
            || contains(c.location_text.as_deref())
            || c.tags.iter().any(|t| t.to_lowercase().contains(&q));
        if !hit {
            return false;
        }
    }

    if !spec.ind.is_empty() {
        // Substring match over indication and its free-text refinement, so a
        // coarse "onco" selection still finds "Oncology" pillars.
        let ind = c.indication.to_lowercase();
        let detail = c.indication_detail.as_deref().map(str::to_lowercase).unwrap_or_default();
        let hit = spec.ind.iter().any(|v| {
            let v = v.to_lowercase();
            ind.contains(&v) || detail.contains(&v)
        });
        if !hit {
            return false;
        }
    }

    if !spec.tier.is_empty() && !spec.tier.contains(&c.tier) {
        return false;
    }

    if !spec.region.is_empty() {
        let region = c.region.to_lowercase();
        if !spec.region.iter().any(|v| v.to_lowercase() == region) {
            return false;
        }
    }

    if !spec.country.is_empty() {
        let Some(country) = c.country.as_deref() else { return false };
        let country = country.to_lowercase();
        if !spec.country.iter().any(|v| v.to_lowercase() == country) {
            return false;
        }
    }

    if !spec.month.is_empty() {
        match c.typical_month {
            Some(m) if spec.month.contains(&m) => {}
            _ => return false,
        }
    }

    true
}

/// Filter and sort without pagination. The result keeps references into the
/// input slice; order is the sorted order.
pub fn filter_and_sort<'a>(records: &'a [CongressRecord], spec: &FilterSpec) -> Vec<&'a CongressRecord> {
    let mut result: Vec<&CongressRecord> = records.iter().filter(|c| matches(c, spec)).collect();
    sort_records(&mut result, spec.sort, spec.dir);
    result
}

/// Stable sort; nulls go last regardless of direction.
pub fn sort_records(records: &mut [&CongressRecord], sort: SortKey, dir: SortDir) {
    let desc = dir == SortDir::Desc;
    match sort {
        SortKey::Name => {
            records.sort_by(|a, b| directed(a.name.to_lowercase().cmp(&b.name.to_lowercase()), desc))
        }
        SortKey::StartDate => records.sort_by(|a, b| cmp_nullable(a.start_date, b.start_date, desc)),
        SortKey::Tier => records.sort_by(|a, b| directed(a.tier.cmp(&b.tier), desc)),
        SortKey::Score => records.sort_by(|a, b| directed(a.score.cmp(&b.score), desc)),
    }
}

fn directed(ord: Ordering, desc: bool) -> Ordering {
    if desc {
        ord.reverse()
    } else {
        ord
    }
}

fn cmp_nullable<T: Ord>(a: Option<T>, b: Option<T>, desc: bool) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => directed(x.cmp(&y), desc),
    }
}

/// Facet counts over the filtered (unpaginated) set. A dimension's own
/// constraint is applied to its own facet; null values are omitted.
pub fn facets(filtered: &[&CongressRecord]) -> Facets {
    Facets {
        tier: numeric_facet(filtered.iter().map(|c| Some(c.tier))),
        region: count_facet(filtered.iter().map(|c| Some(c.region.as_str())), None),
        country: count_facet(filtered.iter().map(|c| c.country.as_deref()), Some(COUNTRY_FACET_LIMIT)),
        month: numeric_facet(filtered.iter().map(|c| c.typical_month)),
        ind: count_facet(filtered.iter().map(|c| Some(c.indication.as_str())), None),
    }
}

/// Numeric dimensions (tier, month) sort ascending by value.
fn numeric_facet<I: Iterator<Item = Option<i64>>>(values: I) -> Vec<FacetCount> {
    let mut counts: HashMap<i64, i64> = HashMap::new();
    for v in values.flatten() {
        *counts.entry(v).or_insert(0) += 1;
    }
    let mut out: Vec<(i64, i64)> = counts.into_iter().collect();
    out.sort_by_key(|&(value, _)| value);
    out.into_iter().map(|(value, count)| FacetCount { value: value.to_string(), count }).collect()
}

/// String dimensions sort by descending count, value ascending as tie-break.
fn count_facet<'a, I: Iterator<Item = Option<&'a str>>>(values: I, limit: Option<usize>) -> Vec<FacetCount> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for v in values.flatten() {
        if !v.is_empty() {
            *counts.entry(v).or_insert(0) += 1;
        }
    }
    let mut out: Vec<(&str, i64)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out.into_iter().map(|(value, count)| FacetCount { value: value.to_string(), count }).collect()
}

/// The full query pipeline: filter, facet, sort, slice one page.
pub fn run(records: &[CongressRecord], spec: &FilterSpec) -> CongressPage {
    let filtered = filter_and_sort(records, spec);
    let facets = facets(&filtered);
    let total = filtered.len() as i64;

    let offset = (spec.page as usize).saturating_sub(1).saturating_mul(spec.page_size as usize);
    let items = filtered.iter().skip(offset).take(spec.page_size as usize).map(|&c| c.clone()).collect();

    CongressPage { items, total, page: spec.page, page_size: spec.page_size, facets }
}

/// Filtered and sorted but unpaginated, cloning out of the snapshot. Feeds
/// the export builder.
pub fn filter_all(records: &[CongressRecord], spec: &FilterSpec) -> Vec<CongressRecord> {
    filter_and_sort(records, spec).into_iter().cloned().collect()
}

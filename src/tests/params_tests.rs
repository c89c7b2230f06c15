#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::query::params::*;
    use crate::types::ExportFilters;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|&(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_on_empty_query() {
        let spec = FilterSpec::from_query(&HashMap::new());
        assert_eq!(spec, FilterSpec::default());
        assert!(spec.is_unfiltered());
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(spec.sort, SortKey::Name);
        assert_eq!(spec.dir, SortDir::Asc);
    }

    #[test]
    fn test_comma_lists() {
        let spec = FilterSpec::from_query(&query(&[
            ("ind", "Oncology, Cardiology ,,"),
            ("region", "EU,NA"),
            ("country", " USA "),
        ]));
        assert_eq!(spec.ind, vec!["Oncology", "Cardiology"]);
        assert_eq!(spec.region, vec!["EU", "NA"]);
        assert_eq!(spec.country, vec!["USA"]);
        assert!(!spec.is_unfiltered());
    }

    #[test]
    fn test_numeric_lists_drop_junk() {
        let spec = FilterSpec::from_query(&query(&[("tier", "1,abc,3"), ("month", "6, x ,12")]));
        assert_eq!(spec.tier, vec![1, 3]);
        assert_eq!(spec.month, vec![6, 12]);
    }

    #[test]
    fn test_q_trimming() {
        let spec = FilterSpec::from_query(&query(&[("q", "  asco  ")]));
        assert_eq!(spec.q.as_deref(), Some("asco"));

        // Whitespace-only means no text filter, not an empty-string filter.
        let spec = FilterSpec::from_query(&query(&[("q", "   ")]));
        assert_eq!(spec.q, None);
    }

    #[test]
    fn test_sort_and_dir() {
        let spec = FilterSpec::from_query(&query(&[("sort", "start_date"), ("dir", "desc")]));
        assert_eq!(spec.sort, SortKey::StartDate);
        assert_eq!(spec.dir, SortDir::Desc);

        // Unknown sort falls back to name; only the literal "desc" descends.
        let spec = FilterSpec::from_query(&query(&[("sort", "bogus"), ("dir", "DESC")]));
        assert_eq!(spec.sort, SortKey::Name);
        assert_eq!(spec.dir, SortDir::Asc);
    }

    #[test]
    fn test_page_params() {
        let spec = FilterSpec::from_query(&query(&[("page", "3"), ("pageSize", "50")]));
        assert_eq!((spec.page, spec.page_size), (3, 50));

        // Junk and non-positive values silently fall back
        let spec = FilterSpec::from_query(&query(&[("page", "0"), ("pageSize", "abc")]));
        assert_eq!((spec.page, spec.page_size), (1, DEFAULT_PAGE_SIZE));

        let spec = FilterSpec::from_query(&query(&[("page", "-2")]));
        assert_eq!(spec.page, 1);
    }

    #[test]
    fn test_page_size_clamped() {
        let spec = FilterSpec::from_query(&query(&[("pageSize", "5000")]));
        assert_eq!(spec.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_parse_page_param() {
        assert_eq!(parse_page_param(Some("7"), 1), 7);
        assert_eq!(parse_page_param(Some("0"), 1), 1);
        assert_eq!(parse_page_param(Some("nope"), 25), 25);
        assert_eq!(parse_page_param(None, 25), 25);
    }

    #[test]
    fn test_from_export_filters() {
        let filters = ExportFilters {
            q: Some("  immuno ".to_string()),
            ind: vec!["Oncology".to_string(), "  ".to_string()],
            tier: vec!["1".to_string(), "x".to_string()],
            month: vec!["6".to_string()],
            sort: Some("tier".to_string()),
            dir: Some("desc".to_string()),
            ..ExportFilters::default()
        };
        let spec = FilterSpec::from_export_filters(&filters);
        assert_eq!(spec.q.as_deref(), Some("immuno"));
        assert_eq!(spec.ind, vec!["Oncology"]);
        assert_eq!(spec.tier, vec![1]);
        assert_eq!(spec.month, vec![6]);
        assert_eq!(spec.sort, SortKey::Tier);
        assert_eq!(spec.dir, SortDir::Desc);
    }
}

//! Pure normalization helpers for the semi-structured German spreadsheet
//! columns: tier labels, month/date-range text, location text, tags and
//! slug identifiers. Every function is total over string input — malformed
//! fields degrade to `None`/defaults, they never fail the row.

use chrono::NaiveDate;

/// Month-name table (full names plus common abbreviations), matched by prefix.
const GERMAN_MONTHS: &[(&str, u32)] = &[
    ("januar", 1),
    ("jan", 1),
    ("februar", 2),
    ("feb", 2),
    ("märz", 3),
    ("mär", 3),
    ("april", 4),
    ("apr", 4),
    ("mai", 5),
    ("juni", 6),
    ("jun", 6),
    ("juli", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("oktober", 10),
    ("okt", 10),
    ("november", 11),
    ("nov", 11),
    ("dezember", 12),
    ("dez", 12),
];

/// Country (German and English names, plus a few major-city aliases) to
/// region code. Unmapped countries fall back to the configured region.
const COUNTRY_TO_REGION: &[(&str, &str)] = &[
    // North America
    ("usa", "NA"),
    ("u.s.a.", "NA"),
    ("united states", "NA"),
    ("kanada", "NA"),
    ("canada", "NA"),
    // Europe
    ("deutschland", "EU"),
    ("germany", "EU"),
    ("italien", "EU"),
    ("italy", "EU"),
    ("frankreich", "EU"),
    ("france", "EU"),
    ("niederlande", "EU"),
    ("netherlands", "EU"),
    ("spanien", "EU"),
    ("spain", "EU"),
    ("schweiz", "EU"),
    ("switzerland", "EU"),
    ("österreich", "EU"),
    ("austria", "EU"),
    ("belgien", "EU"),
    ("belgium", "EU"),
    ("uk", "EU"),
    ("vereinigtes königreich", "EU"),
    ("united kingdom", "EU"),
    ("dänemark", "EU"),
    ("denmark", "EU"),
    ("schweden", "EU"),
    ("sweden", "EU"),
    ("norwegen", "EU"),
    ("norway", "EU"),
    ("portugal", "EU"),
    ("griechenland", "EU"),
    ("greece", "EU"),
    ("tschechien", "EU"),
    ("czech republic", "EU"),
    ("ungarn", "EU"),
    ("hungary", "EU"),
    ("türkei", "EU"),
    ("turkey", "EU"),
    ("münchen", "EU"),
    ("berlin", "EU"),
    ("hamburg", "EU"),
    // Asia-Pacific
    ("japan", "APAC"),
    ("china", "APAC"),
    ("australien", "APAC"),
    ("australia", "APAC"),
    ("singapur", "APAC"),
    ("singapore", "APAC"),
    ("korea", "APAC"),
    ("indien", "APAC"),
    ("india", "APAC"),
    // Latin America
    ("mexiko", "LATAM"),
    ("mexico", "LATAM"),
    ("brasilien", "LATAM"),
    ("brazil", "LATAM"),
    ("argentinien", "LATAM"),
    ("argentina", "LATAM"),
    // Middle East & Africa
    ("südafrika", "MEA"),
    ("south africa", "MEA"),
    ("vae", "MEA"),
    ("uae", "MEA"),
    ("dubai", "MEA"),
    ("israel", "MEA"),
];

/// Parse a tier label like "Tier-1" to an integer 1..=3. The first digit
/// found anywhere in the label counts; anything else defaults to 2.
pub fn parse_tier(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else { return 2 };
    let n = raw.chars().find_map(|c| c.to_digit(10)).unwrap_or(2) as i64;
    if (1..=3).contains(&n) {
        n
    } else {
        2
    }
}

/// Parse a German month name (prefix match) to 1..=12.
pub fn parse_german_month(raw: &str) -> Option<u32> {
    let lower = raw.trim().to_lowercase();
    GERMAN_MONTHS.iter().find(|(name, _)| lower.starts_with(name)).map(|&(_, num)| num)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthField {
    pub typical_month: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn is_dash(ch: char) -> bool {
    // The source mixes plain hyphens and en-dashes.
    ch == '-' || ch == '–'
}

fn digits2(chars: &[char], at: usize) -> Option<u32> {
    let a = chars.get(at)?.to_digit(10)?;
    let b = chars.get(at + 1)?.to_digit(10)?;
    Some(a * 10 + b)
}

fn digits4(chars: &[char], at: usize) -> Option<i32> {
    let mut v: i32 = 0;
    for i in 0..4 {
        v = v * 10 + chars.get(at + i)?.to_digit(10)? as i32;
    }
    Some(v)
}

/// First parenthetical group with at least one character of content.
fn first_parenthetical(raw: &str) -> Option<&str> {
    let open = raw.find('(')?;
    let after = &raw[open + 1..];
    let close = after.find(')')?;
    if close == 0 {
        // "()" carries nothing; a later group may still match.
        return first_parenthetical(&after[1..]);
    }
    Some(after[..close].trim())
}

/// Parse the "Typischer Monat(e)" column. Recognized shapes, tried in order
/// of specificity inside the parenthetical:
///
/// - `"unbekannt"`                              → everything `None`
/// - `"März (03.03.2026)"`                      → start date only
/// - `"Juni (05–08.06.2026)"`                   → same-month range
/// - `"September–Oktober (28.09.–02.10.2026)"`  → cross-month range
///
/// The month name before the parenthetical supplies `typical_month`; when only
/// the parenthetical carries a month, its start month is used instead.
pub fn parse_month_field(raw: Option<&str>) -> MonthField {
    let Some(raw) = raw else { return MonthField::default() };
    let raw = raw.trim();
    if raw.is_empty() || raw.to_lowercase() == "unbekannt" {
        return MonthField::default();
    }

    // Token before the first whitespace, '(' or dash carries the month name.
    let token_end = raw
        .char_indices()
        .find(|&(_, c)| c.is_whitespace() || c == '(' || is_dash(c))
        .map(|(i, _)| i)
        .unwrap_or(raw.len());
    let mut typical_month = parse_german_month(&raw[..token_end]).map(|m| m as i64);

    let mut start_date = None;
    let mut end_date = None;

    if let Some(inner) = first_parenthetical(raw) {
        if let Some((start, end, month)) = parse_date_range(inner) {
            start_date = Some(start);
            end_date = end;
            match typical_month {
                None => typical_month = Some(month as i64),
                Some(named) if named != month as i64 => {
                    tracing::warn!(
                        "month name '{}' disagrees with date range month {} in {:?}",
                        &raw[..token_end],
                        month,
                        raw
                    );
                }
                Some(_) => {}
            }
        }
    }

    MonthField { typical_month, start_date, end_date }
}

/// The three date shapes accepted inside the parenthetical. Returns the start
/// date, the optional end date and the start month for cross-checking.
fn parse_date_range(inner: &str) -> Option<(NaiveDate, Option<NaiveDate>, u32)> {
    let c: Vec<char> = inner.chars().collect();

    // Single date "DD.MM.YYYY"
    if c.len() == 10 && c[2] == '.' && c[5] == '.' {
        let (dd, mm, yyyy) = (digits2(&c, 0)?, digits2(&c, 3)?, digits4(&c, 6)?);
        let start = NaiveDate::from_ymd_opt(yyyy, mm, dd)?;
        return Some((start, None, mm));
    }

    // Same-month range "DD–DD.MM.YYYY"
    if c.len() == 13 && is_dash(c[2]) && c[5] == '.' && c[8] == '.' {
        let (d1, d2) = (digits2(&c, 0)?, digits2(&c, 3)?);
        let (mm, yyyy) = (digits2(&c, 6)?, digits4(&c, 9)?);
        let start = NaiveDate::from_ymd_opt(yyyy, mm, d1)?;
        let end = NaiveDate::from_ymd_opt(yyyy, mm, d2).filter(|e| *e >= start);
        return Some((start, end, mm));
    }

    // Cross-month range "DD.MM.–DD.MM.YYYY"
    if c.len() == 17 && c[2] == '.' && c[5] == '.' && is_dash(c[6]) && c[9] == '.' && c[12] == '.' {
        let (d1, m1) = (digits2(&c, 0)?, digits2(&c, 3)?);
        let (d2, m2) = (digits2(&c, 7)?, digits2(&c, 10)?);
        let yyyy = digits4(&c, 13)?;
        let start = NaiveDate::from_ymd_opt(yyyy, m1, d1)?;
        let end = NaiveDate::from_ymd_opt(yyyy, m2, d2).filter(|e| *e >= start);
        return Some((start, end, m1));
    }

    None
}

/// Parse the "Üblicher Ort" column into (city, country). Expected shapes:
///
/// - `"2026: New Orleans, USA"`              → city + country
/// - `"2026: Washington, DC, USA"`           → multi-segment city
/// - `"Hybrid; 2026: Prag, Tschechien"`      → leading noise ignored
/// - `"2026: ? (Deutschland; siehe Website)"`→ country from the aside
pub fn parse_location(raw: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(raw) = raw else { return (None, None) };
    let trimmed = raw.trim();

    // Everything after the first "YYYY:" marker is the place description.
    let Some(rest) = after_year_marker(trimmed) else { return (None, None) };

    // Strip one parenthetical aside like "(Deutschland; siehe Website)".
    let location_part = strip_first_parenthetical(rest);
    let location_part = location_part.trim();

    if location_part.is_empty() || location_part == "?" {
        // Placeholder location: the aside may still name the country.
        if let Some(country) = paren_country(raw) {
            return (None, Some(country));
        }
        return (None, None);
    }

    let parts: Vec<&str> = location_part.split(',').map(str::trim).collect();
    if parts.len() == 1 {
        return (None, some_nonempty(parts[0]));
    }

    let country = parts[parts.len() - 1];
    let city = parts[..parts.len() - 1].join(", ");
    (some_nonempty(&city), some_nonempty(country))
}

fn some_nonempty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Text after the first "<4 digits>:" occurrence, with leading whitespace
/// trimmed; `None` when no year marker exists or nothing follows it.
fn after_year_marker(s: &str) -> Option<&str> {
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    for w in chars.windows(5) {
        if w[..4].iter().all(|&(_, c)| c.is_ascii_digit()) && w[4].1 == ':' {
            let rest = s[w[4].0 + 1..].trim_start();
            return if rest.is_empty() { None } else { Some(rest) };
        }
    }
    None
}

/// Remove the first non-empty `(...)` group (with preceding whitespace) from `s`.
fn strip_first_parenthetical(s: &str) -> String {
    let mut search_from = 0;
    while let Some(open_rel) = s[search_from..].find('(') {
        let open = search_from + open_rel;
        let Some(close_rel) = s[open + 1..].find(')') else { break };
        let close = open + 1 + close_rel;
        if close_rel == 0 {
            // "()" carries nothing; keep looking.
            search_from = close + 1;
            continue;
        }
        let head = s[..open].trim_end();
        return format!("{}{}", head, &s[close + 1..]);
    }
    s.to_string()
}

/// Country candidate from the first parenthetical, cut at ';' if present.
fn paren_country(raw: &str) -> Option<String> {
    let open = raw.find('(')?;
    let inner = &raw[open + 1..];
    let end = inner.find([';', ')']).unwrap_or(inner.len());
    some_nonempty(inner[..end].trim())
}

/// Map a country string (German or English) to a region code, falling back to
/// the configured region for unknown or absent countries.
pub fn derive_region(country: Option<&str>, fallback: &str) -> String {
    let Some(country) = country else { return fallback.to_string() };
    let key = country.trim().to_lowercase();
    COUNTRY_TO_REGION
        .iter()
        .find(|(name, _)| *name == key)
        .map(|&(_, region)| region.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// Split a tags cell like "AI; Oncology, Imaging" on ';' and ','.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else { return Vec::new() };
    raw.split([';', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ensure the website URL carries a scheme; bare hosts get "https://".
pub fn normalize_url(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{}", trimmed))
    }
}

/// Slugify a display name into a URL-safe identifier: lowercase, diacritics
/// folded, non-alphanumerics dropped, whitespace/hyphen runs collapsed to a
/// single hyphen.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_sep = false;
    for ch in text.to_lowercase().chars() {
        let ch = fold_diacritic(ch);
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch);
        } else if ch.is_whitespace() || ch == '-' {
            pending_sep = true;
        }
    }
    out
}

/// Fold common Latin diacritics to their ASCII base letter. Characters with
/// no mapping pass through (and are dropped later if non-alphanumeric).
fn fold_diacritic(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' => 'u',
        'ç' | 'ć' | 'č' => 'c',
        'ñ' | 'ń' | 'ň' => 'n',
        'ý' | 'ÿ' => 'y',
        'š' | 'ś' => 's',
        'ž' | 'ź' | 'ż' => 'z',
        'ř' => 'r',
        'ł' => 'l',
        'ď' => 'd',
        'ť' => 't',
        other => other,
    }
}

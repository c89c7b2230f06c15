//! SQLite backend: the same filter/facet/sort contract as the in-memory
//! engine, built per request with `QueryBuilder`. Also carries the importer
//! upsert and the export lead/request persistence.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::ingest::NormalizedCongress;
use crate::query::engine::COUNTRY_FACET_LIMIT;
use crate::query::{FilterSpec, SortDir, SortKey};
use crate::store::CongressStore;
use crate::types::{CongressPage, CongressRecord, FacetCount, Facets};

const LIKE_ESCAPE: char = '!';

fn escape_like_pattern(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(ch);
    }
    out
}

pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_facets(&self, spec: &FilterSpec) -> Facets {
        // A failing facet query degrades that one facet to an empty list
        // instead of failing the whole request.
        let facet = |label: &'static str, result: Result<Vec<FacetCount>, sqlx::Error>| match result {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Facet query '{}' failed: {}", label, e);
                Vec::new()
            }
        };

        Facets {
            tier: facet(
                "tier",
                self.facet_query(spec, "CAST(tier AS TEXT)", "tier", "", "tier ASC", None).await,
            ),
            region: facet(
                "region",
                self.facet_query(spec, "region", "region", "", "count DESC, value ASC", None).await,
            ),
            country: facet(
                "country",
                self.facet_query(
                    spec,
                    "country",
                    "country",
                    " AND country IS NOT NULL",
                    "count DESC, value ASC",
                    Some(COUNTRY_FACET_LIMIT as i64),
                )
                .await,
            ),
            month: facet(
                "month",
                self.facet_query(
                    spec,
                    "CAST(typical_month AS TEXT)",
                    "typical_month",
                    " AND typical_month IS NOT NULL",
                    "typical_month ASC",
                    None,
                )
                .await,
            ),
            ind: facet(
                "ind",
                self.facet_query(spec, "indication", "indication", "", "count DESC, value ASC", None)
                    .await,
            ),
        }
    }

    /// One GROUP BY facet query sharing the request's WHERE conditions.
    /// `order` may reference the grouped column or the bare aliases
    /// `value`/`count` (SQLite resolves aliases only as bare names).
    async fn facet_query(
        &self,
        spec: &FilterSpec,
        value_expr: &str,
        group_by: &str,
        extra_where: &str,
        order: &str,
        limit: Option<i64>,
    ) -> Result<Vec<FacetCount>, sqlx::Error> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} AS value, COUNT(*) AS count FROM congresses WHERE 1=1",
            value_expr
        ));
        push_filters(&mut qb, spec);
        qb.push(extra_where);
        qb.push(format!(" GROUP BY {} ORDER BY {}", group_by, order));
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            // NULL group keys are omitted from facet output.
            if let Some(value) = row.try_get::<Option<String>, _>("value")? {
                out.push(FacetCount { value, count: row.try_get("count")? });
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl CongressStore for SqlStore {
    async fn query_page(&self, spec: &FilterSpec) -> AppResult<CongressPage> {
        // Count
        let mut qb = QueryBuilder::new("SELECT COUNT(*) AS cnt FROM congresses WHERE 1=1");
        push_filters(&mut qb, spec);
        let total: i64 = qb.build().fetch_one(&self.pool).await?.try_get("cnt")?;

        // Items
        let offset = (spec.page as i64 - 1) * spec.page_size as i64;
        let mut qb = QueryBuilder::new(SELECT_RECORD);
        push_filters(&mut qb, spec);
        qb.push(format!(" ORDER BY {}", order_clause(spec.sort, spec.dir)));
        qb.push(" LIMIT ").push_bind(spec.page_size as i64).push(" OFFSET ").push_bind(offset);
        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows.iter().map(record_from_row).collect::<Result<Vec<_>, _>>()?;

        let facets = self.fetch_facets(spec).await;

        Ok(CongressPage { items, total, page: spec.page, page_size: spec.page_size, facets })
    }

    async fn query_all(&self, spec: &FilterSpec) -> AppResult<Vec<CongressRecord>> {
        let mut qb = QueryBuilder::new(SELECT_RECORD);
        push_filters(&mut qb, spec);
        qb.push(format!(" ORDER BY {}", order_clause(spec.sort, spec.dir)));
        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(record_from_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn count(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM congresses").fetch_one(&self.pool).await?;
        Ok(row.try_get("cnt")?)
    }
}

const SELECT_RECORD: &str = "SELECT id, name, indication, indication_detail, organizer, tier, score, \
     region, scope, country, city, location_text, start_date, end_date, typical_month, \
     website_url, deadlines_text, rationale, tags, updated_at FROM congresses WHERE 1=1";

/// Append the WHERE conditions for `spec`. Shared by the count, page and
/// facet queries so all three see the same filtered set.
fn push_filters(qb: &mut QueryBuilder<Sqlite>, spec: &FilterSpec) {
    if let Some(q) = &spec.q {
        let pattern = format!("%{}%", escape_like_pattern(q));
        qb.push(" AND (name LIKE ").push_bind(pattern.clone()).push(" ESCAPE '!'");
        for col in ["city", "country", "organizer", "location_text", "tags"] {
            qb.push(format!(" OR {} LIKE ", col)).push_bind(pattern.clone()).push(" ESCAPE '!'");
        }
        qb.push(")");
    }

    if !spec.ind.is_empty() {
        // Substring semantics, matching the in-memory engine.
        qb.push(" AND (");
        for (i, value) in spec.ind.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            let pattern = format!("%{}%", escape_like_pattern(value));
            qb.push("indication LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '!' OR indication_detail LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '!'");
        }
        qb.push(")");
    }

    if !spec.tier.is_empty() {
        qb.push(" AND tier IN (");
        {
            let mut sep = qb.separated(", ");
            for tier in &spec.tier {
                sep.push_bind(*tier);
            }
        }
        qb.push(")");
    }

    if !spec.region.is_empty() {
        qb.push(" AND lower(region) IN (");
        {
            let mut sep = qb.separated(", ");
            for region in &spec.region {
                sep.push_bind(region.to_lowercase());
            }
        }
        qb.push(")");
    }

    if !spec.country.is_empty() {
        qb.push(" AND country IS NOT NULL AND lower(country) IN (");
        {
            let mut sep = qb.separated(", ");
            for country in &spec.country {
                sep.push_bind(country.to_lowercase());
            }
        }
        qb.push(")");
    }

    if !spec.month.is_empty() {
        qb.push(" AND typical_month IN (");
        {
            let mut sep = qb.separated(", ");
            for month in &spec.month {
                sep.push_bind(*month);
            }
        }
        qb.push(")");
    }
}

/// Whitelisted ORDER BY fragments; nulls sort last regardless of direction.
fn order_clause(sort: SortKey, dir: SortDir) -> String {
    let dir_sql = match dir {
        SortDir::Asc => "ASC",
        SortDir::Desc => "DESC",
    };
    match sort {
        SortKey::Name => format!("name COLLATE NOCASE {}", dir_sql),
        SortKey::StartDate => format!("(start_date IS NULL) ASC, start_date {}", dir_sql),
        SortKey::Tier => format!("tier {}", dir_sql),
        SortKey::Score => format!("score {}", dir_sql),
    }
}

fn record_from_row(row: &SqliteRow) -> Result<CongressRecord, sqlx::Error> {
    let tags = match row.try_get::<Option<String>, _>("tags")? {
        None => Vec::new(),
        Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Unparseable tags column: {}", e);
            Vec::new()
        }),
    };

    Ok(CongressRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        indication: row.try_get("indication")?,
        indication_detail: row.try_get("indication_detail")?,
        organizer: row.try_get("organizer")?,
        tier: row.try_get("tier")?,
        score: row.try_get("score")?,
        region: row.try_get("region")?,
        scope: row.try_get("scope")?,
        country: row.try_get("country")?,
        city: row.try_get("city")?,
        location_text: row.try_get("location_text")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        typical_month: row.try_get("typical_month")?,
        website_url: row.try_get("website_url")?,
        deadlines_text: row.try_get("deadlines_text")?,
        rationale: row.try_get("rationale")?,
        tags,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Upsert one normalized congress, keyed on website_url. Every derived field
/// is overwritten on conflict and updated_at refreshed. Returns true for a
/// fresh insert, false for an update, so the importer can report counts.
pub async fn upsert_congress(pool: &SqlitePool, rec: &NormalizedCongress) -> AppResult<bool> {
    let existing = sqlx::query("SELECT id FROM congresses WHERE website_url = ?1")
        .bind(&rec.website_url)
        .fetch_optional(pool)
        .await?;
    let inserted = existing.is_none();

    let tags_json = if rec.tags.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&rec.tags).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("failed to serialize tags: {}", e))
        })?)
    };

    sqlx::query(
        r#"INSERT INTO congresses
             (id, name, indication, indication_detail, organizer,
              tier, score, region, scope, country, city, location_text,
              start_date, end_date, typical_month,
              website_url, deadlines_text, rationale, tags, updated_at)
           VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20)
           ON CONFLICT(website_url) DO UPDATE SET
             name              = excluded.name,
             indication        = excluded.indication,
             indication_detail = excluded.indication_detail,
             organizer         = excluded.organizer,
             tier              = excluded.tier,
             score             = excluded.score,
             region            = excluded.region,
             scope             = excluded.scope,
             country           = excluded.country,
             city              = excluded.city,
             location_text     = excluded.location_text,
             start_date        = excluded.start_date,
             end_date          = excluded.end_date,
             typical_month     = excluded.typical_month,
             deadlines_text    = excluded.deadlines_text,
             rationale         = excluded.rationale,
             tags              = excluded.tags,
             updated_at        = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&rec.name)
    .bind(&rec.indication)
    .bind(rec.indication_detail.as_deref())
    .bind(rec.organizer.as_deref())
    .bind(rec.tier)
    .bind(rec.score)
    .bind(&rec.region)
    .bind(&rec.scope)
    .bind(rec.country.as_deref())
    .bind(rec.city.as_deref())
    .bind(rec.location_text.as_deref())
    .bind(rec.start_date)
    .bind(rec.end_date)
    .bind(rec.typical_month)
    .bind(&rec.website_url)
    .bind(rec.deadlines_text.as_deref())
    .bind(rec.rationale.as_deref())
    .bind(tags_json)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(inserted)
}

/// Upsert an export lead by email; returns the lead id.
pub async fn upsert_lead(
    pool: &SqlitePool,
    email: &str,
    consent_export: bool,
    consent_marketing: bool,
) -> AppResult<String> {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO export_leads (id, email, consent_export, consent_marketing, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)
           ON CONFLICT(email) DO UPDATE SET
             consent_export    = excluded.consent_export,
             consent_marketing = excluded.consent_marketing,
             updated_at        = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(email)
    .bind(consent_export)
    .bind(consent_marketing)
    .bind(now)
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT id FROM export_leads WHERE email = ?1")
        .bind(email)
        .fetch_one(pool)
        .await?;
    Ok(row.try_get("id")?)
}

/// Record one export attempt (status "pending") for audit purposes.
pub async fn insert_export_request(
    pool: &SqlitePool,
    lead_id: &str,
    filters: &serde_json::Value,
    export_type: &str,
) -> AppResult<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"INSERT INTO export_requests (id, lead_id, filters, export_type, status, created_at)
           VALUES (?1, ?2, ?3, ?4, 'pending', ?5)"#,
    )
    .bind(&id)
    .bind(lead_id)
    .bind(filters.to_string())
    .bind(export_type)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(id)
}

/// Flip an export request to "sent" once delivery succeeded. A delivery
/// failure leaves the row pending; that inconsistency is accepted.
pub async fn mark_request_sent(pool: &SqlitePool, request_id: &str) -> AppResult<()> {
    sqlx::query("UPDATE export_requests SET status = 'sent' WHERE id = ?1")
        .bind(request_id)
        .execute(pool)
        .await?;
    Ok(())
}

use sqlx::SqlitePool;

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance; log best-effort failures.
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }
    // Foreign keys are critical - fail if this doesn't work
    sqlx::query("PRAGMA foreign_keys=ON;").execute(pool).await?;

    if let Err(e) = sqlx::query("PRAGMA busy_timeout=10000;").execute(pool).await {
        tracing::warn!("Failed to set busy_timeout: {}", e);
    }

    // congresses table: the record store of the sqlite backend
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS congresses (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            indication TEXT NOT NULL,
            indication_detail TEXT NULL,
            organizer TEXT NULL,
            tier INTEGER NOT NULL CHECK (tier BETWEEN 1 AND 3),
            score INTEGER NOT NULL,
            region TEXT NOT NULL,
            scope TEXT NOT NULL,
            country TEXT NULL,
            city TEXT NULL,
            location_text TEXT NULL,
            start_date TEXT NULL,
            end_date TEXT NULL,
            typical_month INTEGER NULL CHECK (typical_month IS NULL OR typical_month BETWEEN 1 AND 12),
            website_url TEXT NOT NULL UNIQUE,
            deadlines_text TEXT NULL,
            rationale TEXT NULL,
            tags TEXT NULL,
            updated_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // export_leads: one row per email address that requested an export
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS export_leads (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            consent_export INTEGER NOT NULL,
            consent_marketing INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    // export_requests: audit trail of export attempts (pending -> sent)
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS export_requests (
            id TEXT PRIMARY KEY,
            lead_id TEXT NOT NULL,
            filters TEXT NOT NULL,
            export_type TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(lead_id) REFERENCES export_leads(id) ON DELETE CASCADE
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_congresses_tier", "CREATE INDEX IF NOT EXISTS idx_congresses_tier ON congresses(tier)"),
        ("idx_congresses_region", "CREATE INDEX IF NOT EXISTS idx_congresses_region ON congresses(region)"),
        ("idx_congresses_country", "CREATE INDEX IF NOT EXISTS idx_congresses_country ON congresses(country)"),
        ("idx_congresses_month", "CREATE INDEX IF NOT EXISTS idx_congresses_month ON congresses(typical_month)"),
        ("idx_congresses_indication", "CREATE INDEX IF NOT EXISTS idx_congresses_indication ON congresses(indication)"),
        ("idx_congresses_name", "CREATE INDEX IF NOT EXISTS idx_congresses_name ON congresses(name COLLATE NOCASE)"),
        ("idx_requests_lead", "CREATE INDEX IF NOT EXISTS idx_requests_lead ON export_requests(lead_id)"),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            match &e {
                sqlx::Error::Database(db_err) => {
                    let msg = db_err.message().to_lowercase();
                    if msg.contains("already exists") || msg.contains("duplicate") {
                        tracing::debug!("Index {} already exists, skipping", name);
                    } else {
                        tracing::warn!("Failed to create index {}: {}", name, e);
                    }
                }
                _ => {
                    tracing::warn!("Failed to create index {}: {}", name, e);
                }
            }
        }
    }

    Ok(())
}

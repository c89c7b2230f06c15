use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer (exact matches).
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Selects the record store backend and where the snapshot lives.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// "snapshot" (JSON file, in-memory scan) or "sqlite" (per-request SQL).
    pub backend: String,
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Region code used when the country is absent or unmapped.
    pub fallback_region: String,
    pub sheet_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Upper bound on rows serialized into one export buffer.
    pub max_rows: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailConfig {
    /// Resend-compatible send endpoint.
    pub api_url: String,
    /// Falls back to the RESEND_API_KEY environment variable when unset.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    /// Comma-separated internal recipients for lead notifications.
    #[serde(default)]
    pub notification_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    pub enable_hsts: Option<bool>,
    pub hsts_max_age: Option<u64>,
    pub hsts_include_subdomains: Option<bool>,
    pub csp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub data: DataConfig,
    pub import: ImportConfig,
    pub export: ExportConfig,
    pub email: EmailConfig,
    pub security: Option<SecurityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: medicalmap.toml (in CWD)
        .add_source(::config::File::with_name("medicalmap").required(false));

    if let Ok(custom_path) = std::env::var("MEDICALMAP_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("MEDICALMAP").separator("__"));

    let cfg = builder.build()?;
    let mut app_cfg: AppConfig = cfg.try_deserialize()?;

    // The original deployment configured the delivery key as RESEND_API_KEY.
    if app_cfg.email.api_key.is_none() {
        app_cfg.email.api_key = std::env::var("RESEND_API_KEY").ok().filter(|s| !s.is_empty());
    }

    validate(&app_cfg)?;
    Ok(app_cfg)
}

fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    match cfg.data.backend.as_str() {
        "snapshot" | "sqlite" => {}
        other => {
            return Err(anyhow::anyhow!(
                "data.backend must be \"snapshot\" or \"sqlite\", got {:?}",
                other
            ))
        }
    }
    if cfg.data.snapshot_path.trim().is_empty() {
        return Err(anyhow::anyhow!("data.snapshot_path must not be empty"));
    }

    if cfg.import.fallback_region.trim().is_empty() {
        return Err(anyhow::anyhow!("import.fallback_region must not be empty"));
    }
    if cfg.import.sheet_name.trim().is_empty() {
        return Err(anyhow::anyhow!("import.sheet_name must not be empty"));
    }

    if cfg.export.max_rows == 0 {
        return Err(anyhow::anyhow!("export.max_rows must be > 0"));
    }

    if cfg.email.api_url.trim().is_empty() {
        return Err(anyhow::anyhow!("email.api_url must not be empty"));
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

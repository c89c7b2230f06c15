//! Outbound email delivery through a Resend-compatible HTTP API. The export
//! flow awaits delivery synchronously; there is no queue and no retry.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use std::time::Duration;

use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};
use crate::types::ExportFile;

#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
    notification_to: Vec<String>,
}

impl Mailer {
    /// Build from configuration; `None` when the API key or sender address is
    /// missing, so callers can fail requests before any side effect.
    pub fn from_config(cfg: &EmailConfig) -> Option<Self> {
        let api_key = cfg.api_key.clone()?;
        let from = cfg.from.clone().filter(|s| !s.trim().is_empty())?;
        let notification_to = cfg
            .notification_to
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .ok()?;

        Some(Self { client, api_url: cfg.api_url.clone(), api_key, from, notification_to })
    }

    /// Deliver the export buffer as an attachment to the requester.
    pub async fn send_export(&self, to: &str, file: &ExportFile) -> AppResult<()> {
        let payload = json!({
            "from": self.from,
            "to": [to],
            "subject": "Your Congress Directory Export",
            "html": "<p>Hello,</p><p>Please find your congress directory export attached.</p><p>Best regards,<br/>Congress Directory Team</p>",
            "attachments": [{
                "filename": file.filename,
                "content": BASE64.encode(&file.bytes),
                "content_type": file.content_type,
            }],
        });
        self.post(payload).await
    }

    /// Internal notification about a new lead; a no-op without recipients.
    pub async fn send_lead_notification(
        &self,
        lead_email: &str,
        filters: &serde_json::Value,
        export_type: &str,
    ) -> AppResult<()> {
        if self.notification_to.is_empty() {
            return Ok(());
        }

        let payload = json!({
            "from": self.from,
            "to": self.notification_to,
            "subject": format!("New Export Lead: {}", lead_email),
            "html": format!(
                "<p>A new export was requested.</p>\
                 <p><strong>Email:</strong> {}</p>\
                 <p><strong>Export type:</strong> {}</p>\
                 <p><strong>Filters:</strong></p><pre>{}</pre>",
                mask_email(lead_email),
                export_type,
                filter_summary(filters),
            ),
        });
        self.post(payload).await
    }

    async fn post(&self, payload: serde_json::Value) -> AppResult<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Mail(format!("delivery API returned {}: {}", status, body)));
        }
        Ok(())
    }
}

/// "jane.doe@example.org" → "ja***@example.org": enough to recognize, not
/// enough to harvest.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let visible: String = local.chars().take(2).collect();
            format!("{}***@{}", visible, domain)
        }
        None => "***".to_string(),
    }
}

/// Human-readable "key: value" lines, skipping empty filter dimensions.
fn filter_summary(filters: &serde_json::Value) -> String {
    let Some(map) = filters.as_object() else { return "No filters".to_string() };
    let lines: Vec<String> = map
        .iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                serde_json::Value::Null => return None,
                serde_json::Value::Array(items) if items.is_empty() => return None,
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(", "),
                serde_json::Value::String(s) if s.is_empty() => return None,
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(format!("{}: {}", key, rendered))
        })
        .collect();

    if lines.is_empty() {
        "No filters".to_string()
    } else {
        lines.join("\n")
    }
}

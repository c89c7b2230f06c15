use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    error::{AppError, AppResult, FieldError},
    export,
    mailer::mask_email,
    middleware::ip::{extract_ip_from_headers, MaybeRemoteAddr},
    query::FilterSpec,
    state::AppState,
    store::sql,
    types::{ExportFormat, ExportRequestBody},
};

/// `POST /v1/exports` — validate, filter the full record set, build a
/// CSV/XLSX buffer and hand it to the email collaborator. Delivery is
/// awaited synchronously; there is no retry.
pub async fn create_export(
    State(state): State<AppState>,
    MaybeRemoteAddr(remote): MaybeRemoteAddr,
    headers: HeaderMap,
    Json(body): Json<ExportRequestBody>,
) -> AppResult<Response> {
    // Per-endpoint rate limit: "/v1/exports"
    let ip = extract_ip_from_headers(&headers, remote.map(|addr| addr.ip()));
    if let Err((status, body)) = state.rate_limiter.check_endpoint_limit("/v1/exports", ip).await {
        return Ok((status, body).into_response());
    }

    // Honeypot: bots that fill the hidden field get a friendly 200 and
    // nothing else happens.
    if body.hp.as_deref().is_some_and(|hp| !hp.is_empty()) {
        tracing::info!("Honeypot triggered from {}", ip);
        return Ok(success_response());
    }

    let (email, format) = validate(&body)?;

    // Detect missing delivery configuration before any side effect.
    let Some(mailer) = state.mailer.as_ref() else {
        return Err(AppError::NotConfigured(
            "Export service not configured. Missing email API key or sender address.".to_string(),
        ));
    };

    // Same filter semantics as GET /v1/congresses, unpaginated.
    let spec = FilterSpec::from_export_filters(&body.filters);
    let mut rows = state.store.query_all(&spec).await?;
    let max_rows = state.config.export.max_rows;
    if rows.len() > max_rows {
        tracing::warn!("Export clamped from {} to {} rows", rows.len(), max_rows);
        rows.truncate(max_rows);
    }

    // Audit trail (sqlite backend only): lead upsert plus a pending request
    // row. A delivery failure below leaves the row pending.
    let filters_json = serde_json::to_value(&body.filters).unwrap_or_else(|_| json!({}));
    let pending_request = match state.db.as_ref() {
        Some(pool) => {
            let lead_id = sql::upsert_lead(pool, &email, true, body.consent_marketing).await?;
            let request_id =
                sql::insert_export_request(pool, &lead_id, &filters_json, format.as_str()).await?;
            Some((pool, request_id))
        }
        None => None,
    };

    let file = export::build_export(&rows, format)?;
    mailer.send_export(&email, &file).await?;

    if let Some((pool, request_id)) = pending_request {
        sql::mark_request_sent(pool, &request_id).await?;
    }

    mailer.send_lead_notification(&email, &filters_json, format.as_str()).await?;

    tracing::info!(
        "Export ({}, {} rows) delivered to {}",
        format.as_str(),
        rows.len(),
        mask_email(&email)
    );
    Ok(success_response())
}

fn success_response() -> Response {
    Json(json!({ "success": true, "message": "Export will be delivered by email." })).into_response()
}

/// Field-level validation of the export body; all failures are reported at
/// once so the form can highlight every bad field.
fn validate(body: &ExportRequestBody) -> AppResult<(String, ExportFormat)> {
    let mut errors = Vec::new();

    let email = body.email.as_deref().map(str::trim).unwrap_or("");
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Must be a valid email address"));
    }

    let format = match body.export_type.as_deref() {
        None => {
            errors.push(FieldError::new("exportType", "Export type is required"));
            None
        }
        Some(raw) => match ExportFormat::parse(raw) {
            Some(format) => Some(format),
            None => {
                errors.push(FieldError::new("exportType", "Must be \"csv\" or \"xlsx\""));
                None
            }
        },
    };

    if body.consent_export != Some(true) {
        errors.push(FieldError::new("consentExport", "Export consent is required"));
    }

    match format {
        Some(format) if errors.is_empty() => Ok((email.to_string(), format)),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Structural email check: one '@', non-empty local part, dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else { return false };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if email.contains(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

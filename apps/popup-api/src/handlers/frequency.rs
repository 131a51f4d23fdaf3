//! Frequency capping handlers.
//!
//! The popup-serving route calls `check` before rendering and `record` once
//! the popup has actually been shown. Store outages never fail these calls.

use actix_web::{HttpResponse, web};

use popcap_core::DomainError;
use popcap_core::domain::{Campaign, FrequencyPolicy, ScopeKey, VisitorContext, VisitorId};
use popcap_shared::ApiResponse;
use popcap_shared::dto::{
    CampaignPayload, CheckFrequencyRequest, FrequencyStatusResponse, PolicyPayload,
    RecordCampaignDisplayRequest, RecordDisplayRequest, ResetQuery, ResetResponse, VisitorPayload,
};

use crate::middleware::error::AppResult;
use crate::state::AppState;

fn to_visitor(payload: VisitorPayload) -> AppResult<VisitorContext> {
    let mut visitor = VisitorContext::new(payload.visitor_id, payload.session_id)?;
    visitor.device = payload.device;
    visitor.page_url = payload.page_url;
    Ok(visitor)
}

fn to_campaign(payload: CampaignPayload) -> AppResult<Campaign> {
    if payload.id.trim().is_empty() {
        return Err(DomainError::Validation("campaign id is required".to_string()).into());
    }
    Ok(Campaign {
        id: payload.id,
        experiment_id: payload.experiment_id,
        targeting: payload.targeting,
    })
}

fn to_scope(raw: String) -> AppResult<ScopeKey> {
    if raw.trim().is_empty() {
        return Err(DomainError::Validation("scopeKey must not be empty".to_string()).into());
    }
    Ok(ScopeKey::from(raw))
}

fn to_policy(payload: PolicyPayload) -> FrequencyPolicy {
    FrequencyPolicy {
        session_limit: payload.session_limit,
        daily_limit: payload.daily_limit,
        cooldown_seconds: payload.cooldown_seconds,
    }
}

/// POST /api/frequency/check
pub async fn check(
    state: web::Data<AppState>,
    body: web::Json<CheckFrequencyRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let campaign = to_campaign(req.campaign)?;
    let visitor = to_visitor(req.visitor)?;

    let result = state
        .capper
        .check_frequency_capping(&campaign, &visitor)
        .await;

    Ok(HttpResponse::Ok().json(result))
}

/// POST /api/frequency/record
pub async fn record(
    state: web::Data<AppState>,
    body: web::Json<RecordDisplayRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let scope = to_scope(req.scope_key)?;
    let visitor = to_visitor(req.visitor)?;
    let overrides = req.policy.map(to_policy);

    state
        .capper
        .record_display(&scope, &visitor, overrides.as_ref())
        .await;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/frequency/campaigns/record
pub async fn record_campaign(
    state: web::Data<AppState>,
    body: web::Json<RecordCampaignDisplayRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let campaign = to_campaign(req.campaign)?;
    let visitor = to_visitor(req.visitor)?;

    state
        .capper
        .record_campaign_display(&campaign, &visitor)
        .await;

    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/frequency/visitors/{visitor_id}?scopeKey=
pub async fn reset(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ResetQuery>,
) -> AppResult<HttpResponse> {
    let visitor = VisitorId::new(path.into_inner())?;
    let scope = query.into_inner().scope_key.map(to_scope).transpose()?;

    let removed = state.capper.reset(&visitor, scope.as_ref()).await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        ResetResponse { removed },
        format!("Frequency counters reset for visitor {}", visitor),
    )))
}

/// GET /api/frequency/visitors/{visitor_id}/scopes/{scope_key}
pub async fn status(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (visitor_id, scope_key) = path.into_inner();
    let visitor = VisitorId::new(visitor_id)?;
    let scope = to_scope(scope_key)?;

    let counts = state.capper.status(&visitor, &scope).await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(FrequencyStatusResponse {
        visitor_id: visitor.to_string(),
        scope_key: scope.to_string(),
        session: counts.session,
        day: counts.day,
    })))
}

/// GET /api/frequency/stats
pub async fn stats(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(state.capper.stats()))
}

//! HTTP handlers and route configuration.

mod frequency;
mod health;

use actix_web::{HttpRequest, HttpResponse, error, web};
use popcap_shared::ErrorResponse;

use crate::middleware::error::{AppError, AppResult};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            // Storefront: admission and display recording
            .service(
                web::scope("/frequency")
                    .route("/check", web::post().to(frequency::check))
                    .route("/record", web::post().to(frequency::record))
                    .route(
                        "/campaigns/record",
                        web::post().to(frequency::record_campaign),
                    )
                    // Admin and debugging
                    .route("/stats", web::get().to(frequency::stats))
                    .route(
                        "/visitors/{visitor_id}",
                        web::delete().to(frequency::reset),
                    )
                    .route(
                        "/visitors/{visitor_id}/scopes/{scope_key}",
                        web::get().to(frequency::status),
                    ),
            ),
    );
}

/// Fallback for unknown routes.
pub async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!(
        "No route for {} {}",
        req.method(),
        req.path()
    )))
}

/// Malformed JSON bodies get a problem response instead of actix's plain text.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let body = ErrorResponse::invalid_payload(err.to_string());
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    })
}

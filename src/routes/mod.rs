// Route exports
pub mod appointments;
pub mod providers;
pub mod recommendations;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse};
use crate::models::{ErrorResponse, RequestError};

pub use recommendations::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(recommendations::configure)
            .configure(providers::configure)
            .configure(appointments::configure),
    );
}

/// Extractor configuration shared by the server and the handler tests
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(handle_json_payload_error)
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(handle_query_payload_error)
}

/// JSON body for extractor failures
#[derive(Debug)]
struct PayloadError(ErrorResponse);

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.error)
    }
}

impl error::ResponseError for PayloadError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(&self.0)
    }
}

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    PayloadError(ErrorResponse::new(format!("Invalid JSON: {}", err))).into()
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    PayloadError(ErrorResponse::new(format!("Invalid query: {}", err))).into()
}

/// 400 response for a request that failed boundary validation
pub(crate) fn bad_request(err: &RequestError) -> HttpResponse {
    let body = match err.detail() {
        Some(detail) => ErrorResponse::with_message(err.to_string(), detail),
        None => ErrorResponse::new(err.to_string()),
    };
    HttpResponse::BadRequest().json(body)
}

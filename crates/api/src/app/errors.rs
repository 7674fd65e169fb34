use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use catalog_core::ProductId;
use catalog_infra::CatalogError;

pub fn catalog_error_to_response(err: CatalogError) -> axum::response::Response {
    match err {
        CatalogError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        CatalogError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
        CatalogError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        CatalogError::Store(e) => {
            tracing::error!(error = %e, "catalog store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        CatalogError::Media(e) => {
            tracing::warn!(error = %e, "media host failure");
            json_error(StatusCode::BAD_GATEWAY, "media_error", e.to_string())
        }
    }
}

/// A JSON body that failed to decode is a validation failure of the request.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(
        StatusCode::BAD_REQUEST,
        "validation_error",
        rejection.body_text(),
    )
}

pub fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"))
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

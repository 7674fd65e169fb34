use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, Multipart, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use catalog_infra::ImageUpload;
use catalog_products::{NewProduct, ProductPatch};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::context::CallerContext;

/// Upper bound for an uploaded image body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// Reads: catalog listings, single products and analytics.
pub fn public_router() -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/top-ranked", get(top_ranked))
        .route("/products/top-brands", get(top_brands))
        .route("/products/new-arrival", get(new_arrival))
        .route("/products/recommended", get(recommended))
        .route("/products/top-vendors", get(top_vendors))
        .route("/products/:id", get(get_product))
}

/// Writes: require an authenticated caller.
pub fn protected_router() -> Router {
    Router::new()
        .route("/products", post(create_product))
        .route(
            "/products/upload-image",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/products/:id",
            axum::routing::patch(update_product).delete(delete_product),
        )
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> axum::response::Response {
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.catalog().create(caller.user_id(), input).await {
        Ok(product) => (StatusCode::CREATED, Json(json!({ "product": product }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListProductsQuery>,
) -> axum::response::Response {
    match services.catalog().list(&query.filter(), query.page()).await {
        Ok(items) => (StatusCode::OK, Json(json!({ "product": items }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog().get(id).await {
        Ok(detail) => (StatusCode::OK, Json(json!({ "product": detail }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<ProductPatch>, JsonRejection>,
) -> axum::response::Response {
    let id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Json(patch) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.catalog().update(id, patch).await {
        Ok(product) => (StatusCode::OK, Json(json!({ "product": product }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_product_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog().delete(id).await {
        Ok(product) => (StatusCode::OK, Json(json!({ "product": product }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn upload_image(
    Extension(services): Extension<Arc<AppServices>>,
    mut multipart: Multipart,
) -> axum::response::Response {
    let mut upload = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "bad_request", e.body_text());
            }
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = match field.bytes().await {
            Ok(b) => b,
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "bad_request", e.body_text());
            }
        };
        upload = Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let Some(upload) = upload else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "bad_request",
            "please upload image",
        );
    };

    match services.catalog().upload_image(upload).await {
        Ok(src) => (StatusCode::OK, Json(json!({ "image": { "src": src } }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn top_ranked(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog().top_rated().await {
        Ok(items) => (StatusCode::OK, Json(json!({ "topRanks": items }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn top_brands(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog().top_brands().await {
        Ok(items) => (StatusCode::OK, Json(json!({ "topBrands": items }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn new_arrival(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog().new_arrivals().await {
        Ok(items) => (StatusCode::OK, Json(json!({ "newArrival": items }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn recommended(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog().recommended().await {
        Ok(items) => (StatusCode::OK, Json(json!({ "recommended": items }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn top_vendors(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog().top_vendors().await {
        Ok(items) => (StatusCode::OK, Json(json!({ "topVendors": items }))).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

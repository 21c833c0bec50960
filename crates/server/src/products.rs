//! HTTP surface for the product catalog.
//!
//! Every handler delegates to [`ProductCatalog`]; this module only parses
//! transport input and maps [`ApplicationError`] kinds onto status codes.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use productservice_core::domain::product::{NewProduct, Product, ProductId};
use productservice_core::errors::{ApplicationError, InterfaceError};
use productservice_core::query::Page;
use productservice_db::ProductCatalog;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ProductsState {
    catalog: ProductCatalog,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);
type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub id: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
}

pub fn router(catalog: ProductCatalog) -> Router {
    Router::new()
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/by-name", get(products_by_name))
        .route("/api/v1/products/search", get(search_products))
        .route("/api/v1/products/lookup", get(lookup_products))
        .route(
            "/api/v1/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(ProductsState { catalog })
}

async fn list_products(State(state): State<ProductsState>) -> ApiResult<Json<Vec<Product>>> {
    state.catalog.list_all().await.map(Json).map_err(api_error)
}

async fn get_product(
    Path(id): Path<String>,
    State(state): State<ProductsState>,
) -> ApiResult<Json<Product>> {
    let id = parse_product_id(&id)?;
    state.catalog.get_by_id(&id).await.map(Json).map_err(api_error)
}

async fn products_by_name(
    query: Result<Query<NameQuery>, QueryRejection>,
    State(state): State<ProductsState>,
) -> ApiResult<Json<Vec<Product>>> {
    let Query(query) = query.map_err(|rejection| bad_request(rejection.body_text()))?;
    state.catalog.get_by_name(&query.name).await.map(Json).map_err(api_error)
}

async fn search_products(
    query: Result<Query<SearchQuery>, QueryRejection>,
    State(state): State<ProductsState>,
) -> ApiResult<Json<Page<Product>>> {
    let Query(query) = query.map_err(|rejection| bad_request(rejection.body_text()))?;
    let page = state.catalog.page_request(query.page, query.size).map_err(api_error)?;

    state
        .catalog
        .search(query.name.as_deref(), query.date_from, query.date_to, page)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn lookup_products(
    query: Result<Query<LookupQuery>, QueryRejection>,
    State(state): State<ProductsState>,
) -> ApiResult<Json<Vec<Product>>> {
    let Query(query) = query.map_err(|rejection| bad_request(rejection.body_text()))?;
    // a blank `id=` is an absent id, not a malformed one
    let id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(parse_product_id)
        .transpose()?;

    state
        .catalog
        .search_by_id_or_manufacture_date(id, query.manufacture_date)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn create_product(
    State(state): State<ProductsState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(payload) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    let created = state.catalog.create(payload).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_product(
    Path(id): Path<String>,
    State(state): State<ProductsState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let id = parse_product_id(&id)?;
    let Json(payload) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    state.catalog.update(&id, payload).await.map(Json).map_err(api_error)
}

async fn delete_product(
    Path(id): Path<String>,
    State(state): State<ProductsState>,
) -> ApiResult<StatusCode> {
    let id = parse_product_id(&id)?;
    state.catalog.delete_by_id(&id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_product_id(raw: &str) -> ApiResult<ProductId> {
    raw.parse::<ProductId>()
        .map_err(|error| bad_request(format!("invalid product id `{raw}`: {error}")))
}

fn bad_request(detail: String) -> ApiError {
    let correlation_id = Uuid::new_v4().to_string();
    warn!(
        event_name = "http.request.rejected",
        correlation_id = %correlation_id,
        detail = %detail,
        "request rejected"
    );
    interface_response(InterfaceError::BadRequest { message: detail, correlation_id })
}

fn api_error(error: ApplicationError) -> ApiError {
    let correlation_id = Uuid::new_v4().to_string();
    if error.is_not_found() {
        warn!(
            event_name = "http.request.not_found",
            correlation_id = %correlation_id,
            error = %error,
            "product not found"
        );
    } else {
        error!(
            event_name = "http.request.failed",
            correlation_id = %correlation_id,
            error = %error,
            "catalog operation failed"
        );
    }
    interface_response(error.into_interface(correlation_id))
}

fn interface_response(error: InterfaceError) -> ApiError {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorBody {
        error: error.user_message().to_string(),
        detail: error.message().to_string(),
        correlation_id: error.correlation_id().to_string(),
    };
    (status, Json(body))
}

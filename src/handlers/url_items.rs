use crate::database::UrlItem;
use crate::security::{Actor, ChangeGuard};
use crate::services::MenuService;
use crate::utils::error::ApiError;
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct UrlItemRequest {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ListUrlItemsResponse {
    pub items: Vec<UrlItem>,
    pub total: usize,
}

pub async fn list_url_items_handler(
    Extension(menu_service): Extension<Arc<MenuService>>,
) -> Result<Json<ListUrlItemsResponse>, ApiError> {
    let items = menu_service.list_url_items().await?;
    let total = items.len();

    Ok(Json(ListUrlItemsResponse { items, total }))
}

pub async fn create_url_item_handler(
    Extension(guard): Extension<Arc<ChangeGuard>>,
    Extension(menu_service): Extension<Arc<MenuService>>,
    headers: HeaderMap,
    Json(request): Json<UrlItemRequest>,
) -> Result<(StatusCode, Json<UrlItem>), ApiError> {
    let actor = Actor::from_headers(&headers)?;
    guard.require_change(&actor)?;

    let item = menu_service
        .create_url_item(&request.name, &request.url)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_url_item_handler(
    Extension(guard): Extension<Arc<ChangeGuard>>,
    Extension(menu_service): Extension<Arc<MenuService>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<UrlItemRequest>,
) -> Result<Json<UrlItem>, ApiError> {
    let actor = Actor::from_headers(&headers)?;
    guard.require_change(&actor)?;

    let item = menu_service
        .update_url_item(id, &request.name, &request.url)
        .await?;
    Ok(Json(item))
}

pub async fn delete_url_item_handler(
    Extension(guard): Extension<Arc<ChangeGuard>>,
    Extension(menu_service): Extension<Arc<MenuService>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let actor = Actor::from_headers(&headers)?;
    guard.require_change(&actor)?;

    menu_service.delete_url_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

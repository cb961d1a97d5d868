//! Menu item administration

use axum::Json;
use axum::extract::{Path, Query, State};
use http::StatusCode;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};

use crate::api::{ApiResult, internal};
use crate::db::menu::{self, ItemValues};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ItemFilter {
    pub menu_week_id: Option<i64>,
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_values(values: &ItemValues) -> Result<(), AppError> {
    if values.name.is_empty() {
        return Err(AppError::validation("Menu item name is required").with_detail("field", "name"));
    }
    if values.price_cents < 0 {
        return Err(AppError::new(ErrorCode::MenuItemInvalidPrice)
            .with_detail("price_cents", values.price_cents));
    }
    Ok(())
}

async fn require_week(state: &AppState, week_id: i64) -> Result<(), AppError> {
    menu::find_week(&state.db, week_id)
        .await
        .map_err(internal)?
        .map(|_| ())
        .ok_or_else(|| AppError::new(ErrorCode::MenuWeekNotFound).with_detail("menu_week_id", week_id))
}

/// GET /api/admin/menu-items[?menu_week_id=]
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> ApiResult<Vec<MenuItem>> {
    let items = menu::list_items(&state.db, filter.menu_week_id, false)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

/// POST /api/admin/menu-items
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<MenuItemCreate>,
) -> Result<(StatusCode, Json<MenuItem>), AppError> {
    let values = ItemValues {
        menu_week_id: payload.menu_week_id,
        name: payload.name.trim().to_string(),
        description: optional_text(payload.description),
        photo_url: optional_text(payload.photo_url),
        price_cents: payload.price_cents,
        available: payload.available.unwrap_or(true),
    };
    check_values(&values)?;
    require_week(&state, values.menu_week_id).await?;

    let item = menu::create_item(&state.db, &values)
        .await
        .map_err(internal)?;
    tracing::info!(item_id = item.id, week_id = item.menu_week_id, "Menu item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /api/admin/menu-items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<MenuItemUpdate>,
) -> ApiResult<MenuItem> {
    let not_found = || AppError::new(ErrorCode::MenuItemNotFound).with_detail("menu_item_id", id);
    let current = menu::find_item(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;

    let mut values = ItemValues::from(&current);
    if let Some(week_id) = patch.menu_week_id {
        values.menu_week_id = week_id;
    }
    if let Some(name) = patch.name {
        values.name = name.trim().to_string();
    }
    if patch.description.is_some() {
        values.description = optional_text(patch.description);
    }
    if patch.photo_url.is_some() {
        values.photo_url = optional_text(patch.photo_url);
    }
    if let Some(price) = patch.price_cents {
        values.price_cents = price;
    }
    if let Some(available) = patch.available {
        values.available = available;
    }
    check_values(&values)?;
    if values.menu_week_id != current.menu_week_id {
        require_week(&state, values.menu_week_id).await?;
    }

    let item = menu::update_item(&state.db, id, &values)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    tracing::info!(item_id = id, "Menu item updated");
    Ok(Json(item))
}

use axum::Json;
use axum::extract::State;
use shared::models::MenuWeekDetail;

use crate::api::{ApiResult, internal};
use crate::db::menu;
use crate::state::AppState;

/// GET /api/public/menu
///
/// The current published week with its available items, or `null`.
pub async fn current_menu(State(state): State<AppState>) -> ApiResult<Option<MenuWeekDetail>> {
    let Some(week) = menu::current_published_week(&state.db)
        .await
        .map_err(internal)?
    else {
        return Ok(Json(None));
    };

    let items = menu::list_items(&state.db, Some(week.id), true)
        .await
        .map_err(internal)?;
    Ok(Json(Some(MenuWeekDetail { week, items })))
}

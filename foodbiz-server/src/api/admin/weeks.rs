//! Menu week administration

use axum::Json;
use axum::extract::{Path, State};
use http::StatusCode;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    DEFAULT_SELLING_DAYS, MenuItem, MenuWeek, MenuWeekCreate, MenuWeekUpdate,
    normalize_selling_days,
};
use shared::util::now_naive;

use crate::api::{ApiResult, internal};
use crate::db::menu::{self, WeekValues};
use crate::state::AppState;

fn selling_days(raw: &str) -> Result<String, AppError> {
    normalize_selling_days(raw).map_err(|bad| {
        AppError::with_message(
            ErrorCode::MenuWeekInvalidSellingDays,
            format!("Unknown weekday code: {bad}"),
        )
        .with_detail("selling_days", raw)
    })
}

fn week_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::MenuWeekNotFound).with_detail("menu_week_id", id)
}

/// GET /api/admin/menu-weeks
pub async fn list_weeks(State(state): State<AppState>) -> ApiResult<Vec<MenuWeek>> {
    let weeks = menu::list_weeks(&state.db).await.map_err(internal)?;
    Ok(Json(weeks))
}

/// POST /api/admin/menu-weeks
pub async fn create_week(
    State(state): State<AppState>,
    Json(payload): Json<MenuWeekCreate>,
) -> Result<(StatusCode, Json<MenuWeek>), AppError> {
    let values = WeekValues {
        selling_days: selling_days(payload.selling_days.as_deref().unwrap_or(DEFAULT_SELLING_DAYS))?,
        status: payload.status.unwrap_or_default(),
        published: payload.published.unwrap_or(false),
        starts_at: payload.starts_at.unwrap_or_else(now_naive),
    };
    let week = menu::create_week(&state.db, &values)
        .await
        .map_err(internal)?;
    tracing::info!(week_id = week.id, published = week.published, "Menu week created");
    Ok((StatusCode::CREATED, Json(week)))
}

/// PATCH /api/admin/menu-weeks/{id}
pub async fn update_week(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<MenuWeekUpdate>,
) -> ApiResult<MenuWeek> {
    let current = menu::find_week(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| week_not_found(id))?;

    let mut values = WeekValues::from(&current);
    if let Some(raw) = patch.selling_days.as_deref() {
        values.selling_days = selling_days(raw)?;
    }
    if let Some(status) = patch.status {
        values.status = status;
    }
    if let Some(published) = patch.published {
        values.published = published;
    }
    if let Some(starts_at) = patch.starts_at {
        values.starts_at = starts_at;
    }

    let week = menu::update_week(&state.db, id, &values)
        .await
        .map_err(internal)?
        .ok_or_else(|| week_not_found(id))?;
    tracing::info!(week_id = id, "Menu week updated");
    Ok(Json(week))
}

/// GET /api/admin/menu-weeks/{id}/items (includes unavailable items)
pub async fn list_week_items(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<MenuItem>> {
    menu::find_week(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| week_not_found(id))?;
    let items = menu::list_items(&state.db, Some(id), false)
        .await
        .map_err(internal)?;
    Ok(Json(items))
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{admin_token, send, test_state};
    use crate::db::menu::fixtures::{day, item, week};
    use crate::db::menu::{ItemValues, update_item};

    #[tokio::test]
    async fn create_normalizes_and_defaults() {
        let (state, _) = test_state().await;
        let token = admin_token(&state);

        let (status, body) = send(
            &state,
            "POST",
            "/api/admin/menu-weeks",
            Some(&token),
            Some(json!({"selling_days": "fri, tue", "published": true, "starts_at": "2026-10-19T00:00:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["selling_days"], "Tue,Fri");
        assert_eq!(body["status"], "OPEN");
        assert_eq!(body["published"], true);
        assert_eq!(body["starts_at"], "2026-10-19T00:00:00");

        let (status, body) =
            send(&state, "POST", "/api/admin/menu-weeks", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["selling_days"], "Mon,Wed,Fri");
        assert_eq!(body["published"], false);

        let (status, body) = send(&state, "GET", "/api/admin/menu-weeks", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_weekday_is_rejected() {
        let (state, _) = test_state().await;
        let token = admin_token(&state);
        let (status, body) = send(
            &state,
            "POST",
            "/api/admin/menu-weeks",
            Some(&token),
            Some(json!({"selling_days": "Mon,Funday"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 6102);
    }

    #[tokio::test]
    async fn patch_merges_fields() {
        let (state, _) = test_state().await;
        let token = admin_token(&state);
        let w = week(&state.db, day(2026, 10, 19), false).await;

        let (status, body) = send(
            &state,
            "PATCH",
            &format!("/api/admin/menu-weeks/{}", w.id),
            Some(&token),
            Some(json!({"published": true, "status": "CLOSED"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["published"], true);
        assert_eq!(body["status"], "CLOSED");
        assert_eq!(body["selling_days"], "Mon,Wed,Fri");
        assert_eq!(body["starts_at"], "2026-10-19T00:00:00");

        let (status, body) = send(
            &state,
            "PATCH",
            "/api/admin/menu-weeks/999",
            Some(&token),
            Some(json!({"published": true})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 6101);
    }

    #[tokio::test]
    async fn week_items_include_unavailable() {
        let (state, _) = test_state().await;
        let token = admin_token(&state);
        let w = week(&state.db, day(2026, 10, 19), true).await;
        item(&state.db, w.id, "Curry", 1290).await;
        let rice = item(&state.db, w.id, "Rice", 250).await;
        let mut values = ItemValues::from(&rice);
        values.available = false;
        update_item(&state.db, rice.id, &values).await.unwrap();

        let (status, body) = send(
            &state,
            "GET",
            &format!("/api/admin/menu-weeks/{}/items", w.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[1]["available"], false);

        let (status, _) =
            send(&state, "GET", "/api/admin/menu-weeks/999/items", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

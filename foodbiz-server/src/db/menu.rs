//! Menu weeks and menu items

use chrono::NaiveDateTime;
use shared::models::{MenuItem, MenuWeek, WeekStatus};
use shared::util::{format_sql_timestamp, now_naive};
use sqlx::Row;
use sqlx::any::AnyRow;

use super::{Database, get_bool, get_required_timestamp, get_timestamp, insert_sql, update_sql};

const WEEK_COLUMNS: &str = "id, selling_days, status, CAST(published AS INTEGER) AS published, \
     CAST(starts_at AS TEXT) AS starts_at, CAST(created_at AS TEXT) AS created_at";

const ITEM_COLUMNS: &str = "id, menu_week_id, name, description, photo_url, price_cents, \
     CAST(available AS INTEGER) AS available, CAST(created_at AS TEXT) AS created_at";

/// Full set of writable week values (patches are merged before writing)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekValues {
    pub selling_days: String,
    pub status: WeekStatus,
    pub published: bool,
    pub starts_at: NaiveDateTime,
}

impl From<&MenuWeek> for WeekValues {
    fn from(week: &MenuWeek) -> Self {
        Self {
            selling_days: week.selling_days.clone(),
            status: week.status,
            published: week.published,
            starts_at: week.starts_at,
        }
    }
}

/// Full set of writable item values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemValues {
    pub menu_week_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub price_cents: i64,
    pub available: bool,
}

impl From<&MenuItem> for ItemValues {
    fn from(item: &MenuItem) -> Self {
        Self {
            menu_week_id: item.menu_week_id,
            name: item.name.clone(),
            description: item.description.clone(),
            photo_url: item.photo_url.clone(),
            price_cents: item.price_cents,
            available: item.available,
        }
    }
}

fn week_from_row(row: &AnyRow) -> Result<MenuWeek, sqlx::Error> {
    let selling_days: Option<String> = row.try_get("selling_days")?;
    let status: Option<String> = row.try_get("status")?;
    Ok(MenuWeek {
        id: row.try_get("id")?,
        selling_days: selling_days.unwrap_or_default(),
        status: WeekStatus::from_db(status.as_deref().unwrap_or_default()),
        published: get_bool(row, "published")?,
        starts_at: get_required_timestamp(row, "starts_at")?,
        created_at: get_timestamp(row, "created_at")?,
    })
}

fn item_from_row(row: &AnyRow) -> Result<MenuItem, sqlx::Error> {
    let name: Option<String> = row.try_get("name")?;
    let price_cents: Option<i64> = row.try_get("price_cents")?;
    Ok(MenuItem {
        id: row.try_get("id")?,
        menu_week_id: row.try_get("menu_week_id")?,
        name: name.unwrap_or_default(),
        description: row.try_get("description")?,
        photo_url: row.try_get("photo_url")?,
        price_cents: price_cents.unwrap_or(0),
        available: get_bool(row, "available")?,
        created_at: get_timestamp(row, "created_at")?,
    })
}

// =========================================================================
// Weeks
// =========================================================================

/// All weeks, most recent start first.
pub async fn list_weeks(db: &Database) -> Result<Vec<MenuWeek>, sqlx::Error> {
    let sql = format!("SELECT {WEEK_COLUMNS} FROM menu_weeks ORDER BY starts_at DESC, id DESC");
    let rows = sqlx::query(&sql).fetch_all(&db.pool).await?;
    rows.iter().map(week_from_row).collect()
}

pub async fn find_week(db: &Database, id: i64) -> Result<Option<MenuWeek>, sqlx::Error> {
    let sql = format!("SELECT {WEEK_COLUMNS} FROM menu_weeks WHERE id = $1");
    let row = sqlx::query(&sql).bind(id).fetch_optional(&db.pool).await?;
    row.as_ref().map(week_from_row).transpose()
}

/// The week customers see: the published week with the latest start.
pub async fn current_published_week(db: &Database) -> Result<Option<MenuWeek>, sqlx::Error> {
    let sql = format!(
        "SELECT {WEEK_COLUMNS} FROM menu_weeks WHERE published = {}
         ORDER BY starts_at DESC, id DESC LIMIT 1",
        db.dialect.bool_literal(true)
    );
    let row = sqlx::query(&sql).fetch_optional(&db.pool).await?;
    row.as_ref().map(week_from_row).transpose()
}

pub async fn create_week(db: &Database, values: &WeekValues) -> Result<MenuWeek, sqlx::Error> {
    let mut columns = vec![
        ("selling_days", "$1".to_string()),
        ("status", "$2".to_string()),
        ("published", "$3".to_string()),
        ("starts_at", db.dialect.timestamp_param(4)),
        ("created_at", db.dialect.timestamp_param(5)),
    ];
    db.mirrors.expand("menu_weeks", &mut columns);

    let id: i64 = sqlx::query_scalar(&insert_sql("menu_weeks", &columns))
        .bind(&values.selling_days)
        .bind(values.status.as_str())
        .bind(values.published)
        .bind(format_sql_timestamp(&values.starts_at))
        .bind(format_sql_timestamp(&now_naive()))
        .fetch_one(&db.pool)
        .await?;

    find_week(db, id).await?.ok_or(sqlx::Error::RowNotFound)
}

/// Overwrite a week's values. Returns `None` when the week does not exist.
pub async fn update_week(
    db: &Database,
    id: i64,
    values: &WeekValues,
) -> Result<Option<MenuWeek>, sqlx::Error> {
    let mut columns = vec![
        ("selling_days", "$1".to_string()),
        ("status", "$2".to_string()),
        ("published", "$3".to_string()),
        ("starts_at", db.dialect.timestamp_param(4)),
    ];
    db.mirrors.expand("menu_weeks", &mut columns);

    let result = sqlx::query(&update_sql("menu_weeks", &columns, 5))
        .bind(&values.selling_days)
        .bind(values.status.as_str())
        .bind(values.published)
        .bind(format_sql_timestamp(&values.starts_at))
        .bind(id)
        .execute(&db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_week(db, id).await
}

pub async fn count_weeks(db: &Database) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM menu_weeks")
        .fetch_one(&db.pool)
        .await
}

// =========================================================================
// Items
// =========================================================================

/// Items ordered by id, optionally restricted to one week and to available items.
///
/// Rows without a week are never returned.
pub async fn list_items(
    db: &Database,
    week_id: Option<i64>,
    only_available: bool,
) -> Result<Vec<MenuItem>, sqlx::Error> {
    let mut filters = vec![match week_id {
        Some(_) => "menu_week_id = $1".to_string(),
        None => "menu_week_id IS NOT NULL".to_string(),
    }];
    if only_available {
        filters.push(format!("available = {}", db.dialect.bool_literal(true)));
    }
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM menu_items WHERE {} ORDER BY id",
        filters.join(" AND ")
    );

    let mut query = sqlx::query(&sql);
    if let Some(week_id) = week_id {
        query = query.bind(week_id);
    }
    let rows = query.fetch_all(&db.pool).await?;
    rows.iter().map(item_from_row).collect()
}

pub async fn find_item(db: &Database, id: i64) -> Result<Option<MenuItem>, sqlx::Error> {
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM menu_items WHERE id = $1 AND menu_week_id IS NOT NULL"
    );
    let row = sqlx::query(&sql).bind(id).fetch_optional(&db.pool).await?;
    row.as_ref().map(item_from_row).transpose()
}

pub async fn create_item(db: &Database, values: &ItemValues) -> Result<MenuItem, sqlx::Error> {
    let mut columns = vec![
        ("menu_week_id", "$1".to_string()),
        ("name", "$2".to_string()),
        ("description", "$3".to_string()),
        ("photo_url", "$4".to_string()),
        ("price_cents", "$5".to_string()),
        ("available", "$6".to_string()),
        ("created_at", db.dialect.timestamp_param(7)),
    ];
    db.mirrors.expand("menu_items", &mut columns);

    let id: i64 = sqlx::query_scalar(&insert_sql("menu_items", &columns))
        .bind(values.menu_week_id)
        .bind(&values.name)
        .bind(values.description.as_deref())
        .bind(values.photo_url.as_deref())
        .bind(values.price_cents)
        .bind(values.available)
        .bind(format_sql_timestamp(&now_naive()))
        .fetch_one(&db.pool)
        .await?;

    find_item(db, id).await?.ok_or(sqlx::Error::RowNotFound)
}

/// Overwrite an item's values. Returns `None` when the item does not exist.
pub async fn update_item(
    db: &Database,
    id: i64,
    values: &ItemValues,
) -> Result<Option<MenuItem>, sqlx::Error> {
    let mut columns = vec![
        ("menu_week_id", "$1".to_string()),
        ("name", "$2".to_string()),
        ("description", "$3".to_string()),
        ("photo_url", "$4".to_string()),
        ("price_cents", "$5".to_string()),
        ("available", "$6".to_string()),
    ];
    db.mirrors.expand("menu_items", &mut columns);

    let result = sqlx::query(&update_sql("menu_items", &columns, 7))
        .bind(values.menu_week_id)
        .bind(&values.name)
        .bind(values.description.as_deref())
        .bind(values.photo_url.as_deref())
        .bind(values.price_cents)
        .bind(values.available)
        .bind(id)
        .execute(&db.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_item(db, id).await
}

pub async fn count_items(db: &Database) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM menu_items")
        .fetch_one(&db.pool)
        .await
}

//! Menu Model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Weekday codes accepted in `selling_days`, in calendar order.
pub const WEEKDAY_CODES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Selling days for a week created without an explicit set.
pub const DEFAULT_SELLING_DAYS: &str = "Mon,Wed,Fri";

/// Week lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeekStatus {
    #[default]
    Open,
    Closed,
}

impl WeekStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }

    /// Parse a stored status. Unknown text reads as `Open`, matching the backfill default.
    pub fn from_db(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("CLOSED") {
            Self::Closed
        } else {
            Self::Open
        }
    }
}

/// Normalize a comma separated weekday list (`"mon, Wed"` -> `"Mon,Wed"`).
///
/// Duplicates are dropped and the result follows calendar order.
/// Returns the offending token when a code is not a weekday.
pub fn normalize_selling_days(raw: &str) -> Result<String, String> {
    let mut seen = [false; 7];
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let idx = WEEKDAY_CODES
            .iter()
            .position(|code| code.eq_ignore_ascii_case(token))
            .ok_or_else(|| token.to_string())?;
        seen[idx] = true;
    }
    let days: Vec<&str> = WEEKDAY_CODES
        .iter()
        .zip(seen)
        .filter_map(|(code, on)| on.then_some(*code))
        .collect();
    if days.is_empty() {
        return Err(raw.to_string());
    }
    Ok(days.join(","))
}

/// Menu week entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuWeek {
    pub id: i64,
    pub selling_days: String,
    pub status: WeekStatus,
    pub published: bool,
    pub starts_at: NaiveDateTime,
    pub created_at: Option<NaiveDateTime>,
}

/// Create menu week payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuWeekCreate {
    pub selling_days: Option<String>,
    pub status: Option<WeekStatus>,
    pub published: Option<bool>,
    /// Defaults to the creation time
    pub starts_at: Option<NaiveDateTime>,
}

/// Update menu week payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuWeekUpdate {
    pub selling_days: Option<String>,
    pub status: Option<WeekStatus>,
    pub published: Option<bool>,
    pub starts_at: Option<NaiveDateTime>,
}

/// Week with its items, as served to customers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuWeekDetail {
    #[serde(flatten)]
    pub week: MenuWeek,
    pub items: Vec<MenuItem>,
}

/// Menu item entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub menu_week_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    /// Price in cents
    pub price_cents: i64,
    pub available: bool,
    pub created_at: Option<NaiveDateTime>,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub menu_week_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub price_cents: i64,
    pub available: Option<bool>,
}

/// Update menu item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub menu_week_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub price_cents: Option<i64>,
    pub available: Option<bool>,
}

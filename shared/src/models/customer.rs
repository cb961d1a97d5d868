//! Customer Model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Customer entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub sms_opt_in: bool,
    pub email_opt_in: bool,
    pub created_at: Option<NaiveDateTime>,
}

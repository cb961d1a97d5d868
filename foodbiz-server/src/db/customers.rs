use shared::models::Customer;
use sqlx::Row;
use sqlx::any::AnyRow;

use super::{Database, get_bool, get_timestamp};

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, \
     CAST(sms_opt_in AS INTEGER) AS sms_opt_in, CAST(email_opt_in AS INTEGER) AS email_opt_in, \
     CAST(created_at AS TEXT) AS created_at";

fn customer_from_row(row: &AnyRow) -> Result<Customer, sqlx::Error> {
    Ok(Customer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        sms_opt_in: get_bool(row, "sms_opt_in")?,
        email_opt_in: get_bool(row, "email_opt_in")?,
        created_at: get_timestamp(row, "created_at")?,
    })
}

pub async fn find_customer(db: &Database, id: i64) -> Result<Option<Customer>, sqlx::Error> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
    let row = sqlx::query(&sql).bind(id).fetch_optional(&db.pool).await?;
    row.as_ref().map(customer_from_row).transpose()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use shared::util::{format_sql_timestamp, now_naive};

    pub async fn customer(db: &Database, name: &str, phone: &str) -> Customer {
        let sql = format!(
            "INSERT INTO customers (name, phone, sms_opt_in, email_opt_in, created_at)
             VALUES ($1, $2, $3, $4, {}) RETURNING id",
            db.dialect.timestamp_param(5)
        );
        let id: i64 = sqlx::query_scalar(&sql)
            .bind(name)
            .bind(phone)
            .bind(true)
            .bind(false)
            .bind(format_sql_timestamp(&now_naive()))
            .fetch_one(&db.pool)
            .await
            .unwrap();
        find_customer(db, id).await.unwrap().unwrap()
    }
}

//! Demo menu for fresh databases

use shared::models::{DEFAULT_SELLING_DAYS, WeekStatus};
use shared::util::now_naive;

use super::Database;
use super::menu::{self, ItemValues, WeekValues};

/// (name, description, price in cents)
const DEMO_ITEMS: [(&str, &str, i64); 8] = [
    ("Tacos al Pastor", "Marinated pork, pineapple, cilantro, onion", 12900),
    ("Pollo Asado Bowl", "Grilled chicken, rice, black beans, pico", 13900),
    ("Enchiladas Verdes", "Chicken enchiladas with salsa verde", 14900),
    ("Chiles Rellenos", "Poblano peppers stuffed with cheese", 14500),
    ("Carne Asada Plate", "Steak, roasted veggies, tortillas", 16900),
    ("Vegetarian Fajitas", "Peppers, onions, mushrooms, guac", 13500),
    ("Pozole Rojo", "Traditional hominy stew with pork", 15500),
    ("Cochinita Pibil", "Yucatán-style achiote pork", 15900),
];

/// Insert one published week starting today with the demo dishes.
///
/// Skipped (returns `false`) when any week or item already exists.
pub async fn seed_demo_menu_if_empty(db: &Database) -> Result<bool, sqlx::Error> {
    if menu::count_weeks(db).await? > 0 || menu::count_items(db).await? > 0 {
        return Ok(false);
    }

    let now = now_naive();
    let starts_at = now.date().and_hms_opt(0, 0, 0).unwrap_or(now);
    let week = menu::create_week(
        db,
        &WeekValues {
            selling_days: DEFAULT_SELLING_DAYS.to_string(),
            status: WeekStatus::Open,
            published: true,
            starts_at,
        },
    )
    .await?;

    for (name, description, price_cents) in DEMO_ITEMS {
        menu::create_item(
            db,
            &ItemValues {
                menu_week_id: week.id,
                name: name.to_string(),
                description: Some(description.to_string()),
                photo_url: None,
                price_cents,
                available: true,
            },
        )
        .await?;
    }

    tracing::info!(week_id = week.id, items = DEMO_ITEMS.len(), "Demo menu inserted");
    Ok(true)
}

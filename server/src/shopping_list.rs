//! Consolidated shopping list for the recipes in a user's cart.

use crate::error::ApiError;
use crate::schema::{cart_items, ingredients, recipe_ingredients};
use diesel::dsl::{exists, sum};
use diesel::prelude::*;
use serde::Serialize;

pub const CSV_HEADER: [&str; 3] = ["name", "unit", "total_amount"];

pub const EMPTY_CART: &str = "Shopping cart is empty.";

/// One line of the exported list: an ingredient in a given unit and the
/// summed amount across all cart recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListRow {
    pub name: String,
    pub unit: String,
    pub total_amount: i64,
}

/// Where cart contents come from.
pub trait CartStore {
    fn has_items(&mut self, user_id: i32) -> QueryResult<bool>;
    fn totals(&mut self, user_id: i32) -> QueryResult<Vec<ShoppingListRow>>;
}

impl CartStore for PgConnection {
    fn has_items(&mut self, user_id: i32) -> QueryResult<bool> {
        diesel::select(exists(
            cart_items::table.filter(cart_items::user_id.eq(user_id)),
        ))
        .get_result(self)
    }

    fn totals(&mut self, user_id: i32) -> QueryResult<Vec<ShoppingListRow>> {
        cart_totals(self, user_id)
    }
}

/// Sum ingredient amounts over the user's cart, grouped by (name, unit).
/// Row order is whatever the database returns for the grouping.
pub fn cart_totals(conn: &mut PgConnection, user_id: i32) -> QueryResult<Vec<ShoppingListRow>> {
    let rows: Vec<(String, String, Option<i64>)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .inner_join(
            cart_items::table.on(cart_items::recipe_id.eq(recipe_ingredients::recipe_id)),
        )
        .filter(cart_items::user_id.eq(user_id))
        .group_by((ingredients::name, ingredients::measurement_unit))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            sum(recipe_ingredients::amount),
        ))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(name, unit, total)| ShoppingListRow {
            name,
            unit,
            total_amount: total.unwrap_or(0),
        })
        .collect())
}

/// Render rows as CSV with a `name,unit,total_amount` header.
pub fn render_csv(rows: &[ShoppingListRow]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Build the CSV export for `user_id`. An empty cart is refused rather than
/// producing an empty file.
pub fn export_cart<S: CartStore + ?Sized>(
    store: &mut S,
    user_id: i32,
) -> Result<Vec<u8>, ApiError> {
    if !store.has_items(user_id)? {
        return Err(ApiError::conflict(EMPTY_CART));
    }

    let rows = store.totals(user_id)?;
    tracing::debug!(user_id, lines = rows.len(), "exporting shopping list");

    render_csv(&rows).map_err(|e| ApiError::Internal(format!("failed to render CSV: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    /// Cart lines keyed by user, each already summed.
    #[derive(Default)]
    struct FakeCart {
        lines: Vec<(i32, ShoppingListRow)>,
        totals_calls: usize,
    }

    impl CartStore for FakeCart {
        fn has_items(&mut self, user_id: i32) -> QueryResult<bool> {
            Ok(self.lines.iter().any(|(owner, _)| *owner == user_id))
        }

        fn totals(&mut self, user_id: i32) -> QueryResult<Vec<ShoppingListRow>> {
            self.totals_calls += 1;
            Ok(self
                .lines
                .iter()
                .filter(|(owner, _)| *owner == user_id)
                .map(|(_, row)| row.clone())
                .collect())
        }
    }

    fn row(name: &str, unit: &str, total_amount: i64) -> ShoppingListRow {
        ShoppingListRow {
            name: name.to_string(),
            unit: unit.to_string(),
            total_amount,
        }
    }

    #[test]
    fn test_render_csv_header_and_rows() {
        let csv = render_csv(&[row("flour", "g", 250), row("eggs", "pcs", 3)]).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "name,unit,total_amount\nflour,g,250\neggs,pcs,3\n"
        );
    }

    #[test]
    fn test_render_csv_quotes_delimiters() {
        let csv = render_csv(&[row("salt, coarse", "g", 5)]).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "name,unit,total_amount\n\"salt, coarse\",g,5\n"
        );
    }

    #[test]
    fn test_render_csv_header_only() {
        let csv = render_csv(&[]).unwrap();
        assert_eq!(String::from_utf8(csv).unwrap(), "name,unit,total_amount\n");
    }

    #[test]
    fn test_non_ascii_names_survive() {
        let csv = render_csv(&[row("мука", "г", 400)]).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "name,unit,total_amount\nмука,г,400\n"
        );
    }

    #[test]
    fn test_empty_cart_refused() {
        let mut cart = FakeCart::default();
        cart.lines.push((2, row("flour", "g", 100)));

        let err = export_cart(&mut cart, 1).unwrap_err();
        assert!(matches!(&err, ApiError::Conflict(msg) if msg == EMPTY_CART));
        assert_eq!(cart.totals_calls, 0);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_export_renders_only_own_cart() {
        let mut cart = FakeCart::default();
        cart.lines.push((1, row("flour", "g", 250)));
        cart.lines.push((2, row("sugar", "g", 40)));

        let csv = export_cart(&mut cart, 1).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "name,unit,total_amount\nflour,g,250\n"
        );
    }
}

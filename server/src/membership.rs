//! Add/remove guards over the per-user relation sets: favorites, shopping
//! cart and author subscriptions.
//!
//! Each set is a [`Membership`]; [`add`] and [`remove`] check presence first
//! and refuse with a conflict instead of silently succeeding.

use crate::error::ApiError;
use crate::models::{NewCartItem, NewFavorite, NewFollow};
use crate::schema::{cart_items, favorites, follows};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// A set of `(user, target)` pairs.
pub trait Membership {
    /// Conflict message for adding a pair that is already present.
    const ALREADY_PRESENT: &'static str;
    /// Conflict message for removing a pair that is absent.
    const NOT_PRESENT: &'static str;

    fn contains(&mut self, user_id: i32, target_id: i32) -> QueryResult<bool>;
    fn insert(&mut self, user_id: i32, target_id: i32) -> QueryResult<()>;
    fn delete(&mut self, user_id: i32, target_id: i32) -> QueryResult<()>;
}

pub fn add<M: Membership>(set: &mut M, user_id: i32, target_id: i32) -> Result<(), ApiError> {
    if set.contains(user_id, target_id)? {
        return Err(ApiError::conflict(M::ALREADY_PRESENT));
    }

    match set.insert(user_id, target_id) {
        Ok(()) => Ok(()),
        // lost a race with a concurrent insert of the same pair
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            Err(ApiError::conflict(M::ALREADY_PRESENT))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn remove<M: Membership>(set: &mut M, user_id: i32, target_id: i32) -> Result<(), ApiError> {
    if !set.contains(user_id, target_id)? {
        return Err(ApiError::conflict(M::NOT_PRESENT));
    }

    set.delete(user_id, target_id)?;
    Ok(())
}

pub const SELF_FOLLOW: &str = "You cannot subscribe to yourself.";

/// Subscribe `user_id` to `author_id`. Subscribing to oneself is refused
/// before the set is consulted.
pub fn follow<M: Membership>(set: &mut M, user_id: i32, author_id: i32) -> Result<(), ApiError> {
    if user_id == author_id {
        return Err(ApiError::conflict(SELF_FOLLOW));
    }
    add(set, user_id, author_id)
}

pub struct Favorites<'a>(pub &'a mut PgConnection);

pub struct ShoppingCart<'a>(pub &'a mut PgConnection);

pub struct Follows<'a>(pub &'a mut PgConnection);

impl Membership for Favorites<'_> {
    const ALREADY_PRESENT: &'static str = "Recipe is already in favorites.";
    const NOT_PRESENT: &'static str = "Recipe is not in favorites.";

    fn contains(&mut self, user_id: i32, recipe_id: i32) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            favorites::table.find((user_id, recipe_id)),
        ))
        .get_result(self.0)
    }

    fn insert(&mut self, user_id: i32, recipe_id: i32) -> QueryResult<()> {
        diesel::insert_into(favorites::table)
            .values(NewFavorite { user_id, recipe_id })
            .execute(self.0)
            .map(|_| ())
    }

    fn delete(&mut self, user_id: i32, recipe_id: i32) -> QueryResult<()> {
        diesel::delete(favorites::table.find((user_id, recipe_id)))
            .execute(self.0)
            .map(|_| ())
    }
}

impl Membership for ShoppingCart<'_> {
    const ALREADY_PRESENT: &'static str = "Recipe is already in the shopping cart.";
    const NOT_PRESENT: &'static str = "Recipe is not in the shopping cart.";

    fn contains(&mut self, user_id: i32, recipe_id: i32) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            cart_items::table.find((user_id, recipe_id)),
        ))
        .get_result(self.0)
    }

    fn insert(&mut self, user_id: i32, recipe_id: i32) -> QueryResult<()> {
        diesel::insert_into(cart_items::table)
            .values(NewCartItem { user_id, recipe_id })
            .execute(self.0)
            .map(|_| ())
    }

    fn delete(&mut self, user_id: i32, recipe_id: i32) -> QueryResult<()> {
        diesel::delete(cart_items::table.find((user_id, recipe_id)))
            .execute(self.0)
            .map(|_| ())
    }
}

impl Membership for Follows<'_> {
    const ALREADY_PRESENT: &'static str = "You are already subscribed to this author.";
    const NOT_PRESENT: &'static str = "You are not subscribed to this author.";

    fn contains(&mut self, user_id: i32, author_id: i32) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            follows::table
                .filter(follows::user_id.eq(user_id))
                .filter(follows::author_id.eq(author_id)),
        ))
        .get_result(self.0)
    }

    fn insert(&mut self, user_id: i32, author_id: i32) -> QueryResult<()> {
        diesel::insert_into(follows::table)
            .values(NewFollow { user_id, author_id })
            .execute(self.0)
            .map(|_| ())
    }

    fn delete(&mut self, user_id: i32, author_id: i32) -> QueryResult<()> {
        diesel::delete(
            follows::table
                .filter(follows::user_id.eq(user_id))
                .filter(follows::author_id.eq(author_id)),
        )
        .execute(self.0)
        .map(|_| ())
    }
}

use crate::api::recipes::repr::{short_recipe, ShortRecipeResponse};
use crate::error::ApiError;
use crate::media::MediaStore;
use crate::models::{Recipe, User};
use crate::schema::{follows, recipes};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Whether the caller follows this user
    pub is_subscribed: bool,
}

impl UserResponse {
    pub fn new(user: &User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
        }
    }
}

/// An author as seen from the subscriptions page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Newest first, truncated to `recipes_limit` when given
    pub recipes: Vec<ShortRecipeResponse>,
    /// Total number of recipes by this author, regardless of the limit
    pub recipes_count: i64,
}

/// The subset of `author_ids` that `viewer` follows. Anonymous viewers follow nobody.
pub fn followed_authors(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    author_ids: &[i32],
) -> QueryResult<HashSet<i32>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<i32> = follows::table
        .filter(follows::user_id.eq(viewer))
        .filter(follows::author_id.eq_any(author_ids))
        .select(follows::author_id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

pub fn user_responses(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    users: &[User],
) -> QueryResult<Vec<UserResponse>> {
    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let followed = followed_authors(conn, viewer, &ids)?;

    Ok(users
        .iter()
        .map(|u| UserResponse::new(u, followed.contains(&u.id)))
        .collect())
}

/// Keep at most `limit` recipes of an author's newest-first list.
pub fn truncate_recipes(mut recipes: Vec<Recipe>, limit: Option<usize>) -> Vec<Recipe> {
    if let Some(limit) = limit {
        recipes.truncate(limit);
    }
    recipes
}

/// Subscription entries for `authors`, all of whom `viewer` follows.
pub fn subscription_responses(
    conn: &mut PgConnection,
    media: &MediaStore,
    viewer: i32,
    authors: &[User],
    recipes_limit: Option<usize>,
) -> Result<Vec<SubscriptionResponse>, ApiError> {
    let ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
    let followed = followed_authors(conn, Some(viewer), &ids)?;

    let all_recipes: Vec<Recipe> = recipes::table
        .filter(recipes::author_id.eq_any(&ids))
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .select(Recipe::as_select())
        .load(conn)?;

    let mut by_author: HashMap<i32, Vec<Recipe>> = HashMap::new();
    for recipe in all_recipes {
        by_author.entry(recipe.author_id).or_default().push(recipe);
    }

    Ok(authors
        .iter()
        .map(|author| {
            let recipes = by_author.remove(&author.id).unwrap_or_default();
            let recipes_count = recipes.len() as i64;
            SubscriptionResponse {
                user: UserResponse::new(author, followed.contains(&author.id)),
                recipes: truncate_recipes(recipes, recipes_limit)
                    .iter()
                    .map(|r| short_recipe(media, r))
                    .collect(),
                recipes_count,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i32) -> User {
        User {
            id,
            email: format!("user{id}@example.com"),
            username: format!("user{id}"),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: "secret-hash".to_string(),
            created_at: Utc::now(),
        }
    }

    fn recipe(id: i32) -> Recipe {
        Recipe {
            id,
            author_id: 1,
            name: format!("recipe {id}"),
            image: format!("recipes/images/{id}.png"),
            text: "Mix and bake.".to_string(),
            cooking_time: 10,
            pub_date: Utc::now(),
        }
    }

    #[test]
    fn test_user_response_hides_password() {
        let json = serde_json::to_value(UserResponse::new(&user(3), true)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["username"], "user3");
        assert_eq!(json["is_subscribed"], true);
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_subscription_flattens_user() {
        let media = MediaStore::new("media", "/media");
        let entry = SubscriptionResponse {
            user: UserResponse::new(&user(2), true),
            recipes: vec![short_recipe(&media, &recipe(7))],
            recipes_count: 4,
        };
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["email"], "user2@example.com");
        assert_eq!(json["recipes_count"], 4);
        assert_eq!(json["recipes"][0]["image"], "/media/recipes/images/7.png");
        assert!(json.get("user").is_none());
    }

    #[test]
    fn test_truncate_recipes() {
        let recipes = vec![recipe(3), recipe(2), recipe(1)];
        assert_eq!(truncate_recipes(recipes.clone(), None).len(), 3);
        let kept = truncate_recipes(recipes.clone(), Some(2));
        assert_eq!(kept.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2]);
        assert!(truncate_recipes(recipes, Some(0)).is_empty());
    }
}

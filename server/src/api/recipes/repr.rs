//! Recipe read models. Relations for a page of recipes are loaded in one
//! query per table and stitched together in memory.

use crate::api::tags::list::TagResponse;
use crate::api::users::repr::{followed_authors, UserResponse};
use crate::error::ApiError;
use crate::media::MediaStore;
use crate::models::{Ingredient, Recipe, Tag, User};
use crate::schema::{cart_items, favorites, ingredients, recipe_ingredients, recipe_tags, tags, users};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    /// Ingredient ID
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i16,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    /// Image URL
    pub image: String,
    pub text: String,
    /// Minutes
    pub cooking_time: i16,
}

/// Compact form used by favorites, the cart and subscriptions.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortRecipeResponse {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i16,
}

pub fn short_recipe(media: &MediaStore, recipe: &Recipe) -> ShortRecipeResponse {
    ShortRecipeResponse {
        id: recipe.id,
        name: recipe.name.clone(),
        image: media.url(&recipe.image),
        cooking_time: recipe.cooking_time,
    }
}

/// Everything a page of recipes refers to, keyed for lookup.
#[derive(Debug, Default)]
pub struct RecipeRelations {
    pub authors: HashMap<i32, User>,
    pub followed_authors: HashSet<i32>,
    pub tags: HashMap<i32, Vec<Tag>>,
    pub ingredients: HashMap<i32, Vec<(Ingredient, i16)>>,
    pub favorited: HashSet<i32>,
    pub in_cart: HashSet<i32>,
}

impl RecipeRelations {
    /// Load relations of `recipes` as seen by `viewer`.
    pub fn load(conn: &mut PgConnection, viewer: Option<i32>, recipes: &[Recipe]) -> QueryResult<Self> {
        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
        let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: Vec<User> = users::table
            .filter(users::id.eq_any(&author_ids))
            .select(User::as_select())
            .load(conn)?;

        let followed_authors = followed_authors(conn, viewer, &author_ids)?;

        let tag_rows: Vec<(i32, Tag)> = recipe_tags::table
            .inner_join(tags::table)
            .filter(recipe_tags::recipe_id.eq_any(&recipe_ids))
            .order(tags::id.asc())
            .select((recipe_tags::recipe_id, Tag::as_select()))
            .load(conn)?;

        let ingredient_rows: Vec<(i32, Ingredient, i16)> = recipe_ingredients::table
            .inner_join(ingredients::table)
            .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
            .order(ingredients::id.asc())
            .select((
                recipe_ingredients::recipe_id,
                Ingredient::as_select(),
                recipe_ingredients::amount,
            ))
            .load(conn)?;

        let (favorited, in_cart) = match viewer {
            Some(user_id) => {
                let favorited: Vec<i32> = favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq_any(&recipe_ids))
                    .select(favorites::recipe_id)
                    .load(conn)?;
                let in_cart: Vec<i32> = cart_items::table
                    .filter(cart_items::user_id.eq(user_id))
                    .filter(cart_items::recipe_id.eq_any(&recipe_ids))
                    .select(cart_items::recipe_id)
                    .load(conn)?;
                (favorited.into_iter().collect(), in_cart.into_iter().collect())
            }
            None => (HashSet::new(), HashSet::new()),
        };

        let mut relations = Self {
            authors: authors.into_iter().map(|u| (u.id, u)).collect(),
            followed_authors,
            favorited,
            in_cart,
            ..Default::default()
        };
        for (recipe_id, tag) in tag_rows {
            relations.tags.entry(recipe_id).or_default().push(tag);
        }
        for (recipe_id, ingredient, amount) in ingredient_rows {
            relations
                .ingredients
                .entry(recipe_id)
                .or_default()
                .push((ingredient, amount));
        }

        Ok(relations)
    }

    pub fn render(&self, media: &MediaStore, recipe: &Recipe) -> Result<RecipeResponse, ApiError> {
        let author = self.authors.get(&recipe.author_id).ok_or_else(|| {
            ApiError::Internal(format!("author {} of recipe {} not loaded", recipe.author_id, recipe.id))
        })?;

        Ok(RecipeResponse {
            id: recipe.id,
            tags: self
                .tags
                .get(&recipe.id)
                .map(|tags| tags.iter().cloned().map(TagResponse::from).collect())
                .unwrap_or_default(),
            author: UserResponse::new(author, self.followed_authors.contains(&author.id)),
            ingredients: self
                .ingredients
                .get(&recipe.id)
                .map(|lines| {
                    lines
                        .iter()
                        .map(|(ingredient, amount)| RecipeIngredientResponse {
                            id: ingredient.id,
                            name: ingredient.name.clone(),
                            measurement_unit: ingredient.measurement_unit.clone(),
                            amount: *amount,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            is_favorited: self.favorited.contains(&recipe.id),
            is_in_shopping_cart: self.in_cart.contains(&recipe.id),
            name: recipe.name.clone(),
            image: media.url(&recipe.image),
            text: recipe.text.clone(),
            cooking_time: recipe.cooking_time,
        })
    }
}

/// Full representations of `recipes`, in the given order.
pub fn recipe_responses(
    conn: &mut PgConnection,
    media: &MediaStore,
    viewer: Option<i32>,
    recipes: &[Recipe],
) -> Result<Vec<RecipeResponse>, ApiError> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let relations = RecipeRelations::load(conn, viewer, recipes)?;
    recipes.iter().map(|r| relations.render(media, r)).collect()
}

pub fn recipe_response(
    conn: &mut PgConnection,
    media: &MediaStore,
    viewer: Option<i32>,
    recipe: &Recipe,
) -> Result<RecipeResponse, ApiError> {
    let relations = RecipeRelations::load(conn, viewer, std::slice::from_ref(recipe))?;
    relations.render(media, recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn author() -> User {
        User {
            id: 1,
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Julia".to_string(),
            last_name: "Child".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    fn recipe(id: i32) -> Recipe {
        Recipe {
            id,
            author_id: 1,
            name: "Pancakes".to_string(),
            image: "recipes/images/p.png".to_string(),
            text: "Whisk and fry.".to_string(),
            cooking_time: 15,
            pub_date: Utc::now(),
        }
    }

    fn relations() -> RecipeRelations {
        let mut relations = RecipeRelations::default();
        relations.authors.insert(1, author());
        relations.tags.insert(
            10,
            vec![Tag {
                id: 2,
                name: "Breakfast".to_string(),
                slug: "breakfast".to_string(),
                color: "#E26C2D".to_string(),
            }],
        );
        relations.ingredients.insert(
            10,
            vec![(
                Ingredient {
                    id: 5,
                    name: "flour".to_string(),
                    measurement_unit: "g".to_string(),
                },
                200,
            )],
        );
        relations
    }

    #[test]
    fn test_render_full_recipe() {
        let media = MediaStore::new("media", "/media");
        let mut relations = relations();
        relations.favorited.insert(10);
        relations.followed_authors.insert(1);

        let json = serde_json::to_value(relations.render(&media, &recipe(10)).unwrap()).unwrap();
        assert_eq!(json["id"], 10);
        assert_eq!(json["image"], "/media/recipes/images/p.png");
        assert_eq!(json["tags"][0]["slug"], "breakfast");
        assert_eq!(json["author"]["username"], "cook");
        assert_eq!(json["author"]["is_subscribed"], true);
        assert_eq!(
            json["ingredients"][0],
            serde_json::json!({"id": 5, "name": "flour", "measurement_unit": "g", "amount": 200})
        );
        assert_eq!(json["is_favorited"], true);
        assert_eq!(json["is_in_shopping_cart"], false);
    }

    #[test]
    fn test_render_recipe_without_relations() {
        let media = MediaStore::new("media", "/media");
        let response = relations().render(&media, &recipe(11)).unwrap();
        assert!(response.tags.is_empty());
        assert!(response.ingredients.is_empty());
        assert!(!response.author.is_subscribed);
    }

    #[test]
    fn test_render_missing_author_is_internal_error() {
        let media = MediaStore::new("media", "/media");
        let result = RecipeRelations::default().render(&media, &recipe(10));
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[test]
    fn test_short_recipe() {
        let media = MediaStore::new("media", "/media");
        let json = serde_json::to_value(short_recipe(&media, &recipe(3))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "name": "Pancakes",
                "image": "/media/recipes/images/p.png",
                "cooking_time": 15
            })
        );
    }
}

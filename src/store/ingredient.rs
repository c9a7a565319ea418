use sqlx::{Pool, Sqlite, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::models::ingredient::IngredientModel;

/// Ingredient rows. Every query is scoped to the owner passed in.
#[derive(Clone, Debug)]
pub struct IngredientRepository {
    pool: Pool<Sqlite>,
}

impl IngredientRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Insert a standalone ingredient. No route does this; ingredients reach
    /// users through recipes, so this exists for seeding test data.
    #[instrument(name = "Inserting ingredient", skip(self))]
    pub async fn create(&self, owner: Uuid, name: &str) -> anyhow::Result<IngredientModel> {
        let row = sqlx::query_as::<_, IngredientModel>(
            "INSERT INTO ingredients (user_id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// All of the owner's ingredients, name descending, id ascending on ties.
    #[instrument(name = "Listing ingredients", skip(self))]
    pub async fn list_by_user(&self, owner: Uuid) -> anyhow::Result<Vec<IngredientModel>> {
        let rows = sqlx::query_as::<_, IngredientModel>(
            r#"SELECT id, name
            FROM ingredients
            WHERE user_id = $1
            ORDER BY name DESC, id ASC"#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Owner's ingredients used by at least one of the owner's recipes, each once.
    #[instrument(name = "Listing assigned ingredients", skip(self))]
    pub async fn list_assigned(&self, owner: Uuid) -> anyhow::Result<Vec<IngredientModel>> {
        let rows = sqlx::query_as::<_, IngredientModel>(
            r#"SELECT DISTINCT i.id, i.name
            FROM ingredients i
            JOIN recipe_ingredients ri ON ri.ingredient_id = i.id
            JOIN recipes r ON r.id = ri.recipe_id
            WHERE i.user_id = $1 AND r.user_id = $1
            ORDER BY i.name DESC, i.id ASC"#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(name = "Fetching ingredient", skip(self))]
    pub async fn find(&self, owner: Uuid, id: i64) -> anyhow::Result<Option<IngredientModel>> {
        let row = sqlx::query_as::<_, IngredientModel>(
            "SELECT id, name FROM ingredients WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[instrument(name = "Renaming ingredient", skip(self))]
    pub async fn update_name(
        &self,
        owner: Uuid,
        id: i64,
        name: &str,
    ) -> anyhow::Result<Option<IngredientModel>> {
        let row = sqlx::query_as::<_, IngredientModel>(
            r#"UPDATE ingredients SET name = $1
            WHERE id = $2 AND user_id = $3
            RETURNING id, name"#,
        )
        .bind(name)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Returns whether a row owned by `owner` was removed.
    #[instrument(name = "Deleting ingredient", skip(self))]
    pub async fn delete(&self, owner: Uuid, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Id of the owner's oldest ingredient called `name`, inserting one if none exists.
pub(crate) async fn find_or_create(
    conn: &mut SqliteConnection,
    owner: Uuid,
    name: &str,
) -> anyhow::Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM ingredients WHERE user_id = $1 AND name = $2 ORDER BY id LIMIT 1",
    )
    .bind(owner)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id = sqlx::query_scalar("INSERT INTO ingredients (user_id, name) VALUES ($1, $2) RETURNING id")
        .bind(owner)
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

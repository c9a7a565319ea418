use std::collections::HashMap;

use sqlx::{FromRow, Pool, QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::models::ingredient::IngredientModel;
use crate::models::recipe::{RecipeFields, RecipeRow};
use crate::store::ingredient::find_or_create;

const RECIPE_COLUMNS: &str = "r.id, r.title, r.description, r.time_minutes, r.price_cents, r.link";

#[derive(FromRow)]
struct LinkedIngredient {
    recipe_id: i64,
    id: i64,
    name: String,
}

/// Recipe rows and their ingredient links. Every query is scoped to the owner passed in.
#[derive(Clone, Debug)]
pub struct RecipeRepository {
    pool: Pool<Sqlite>,
}

impl RecipeRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Owner's recipes, newest first. With `ingredient_ids`, only recipes using
    /// at least one of them, each recipe once.
    #[instrument(name = "Listing recipes", skip(self))]
    pub async fn list(
        &self,
        owner: Uuid,
        ingredient_ids: Option<&[i64]>,
    ) -> anyhow::Result<Vec<RecipeRow>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT DISTINCT ");
        query.push(RECIPE_COLUMNS).push(" FROM recipes r");
        if ingredient_ids.is_some() {
            query.push(" JOIN recipe_ingredients ri ON ri.recipe_id = r.id");
        }
        query.push(" WHERE r.user_id = ").push_bind(owner);
        if let Some(ids) = ingredient_ids {
            query.push(" AND ri.ingredient_id IN (");
            let mut separated = query.separated(", ");
            for id in ids {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
        }
        query.push(" ORDER BY r.id DESC");

        let rows = query
            .build_query_as::<RecipeRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    #[instrument(name = "Fetching recipe", skip(self))]
    pub async fn find(&self, owner: Uuid, id: i64) -> anyhow::Result<Option<RecipeRow>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1 AND r.user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Ingredients of the given recipes keyed by recipe id, each list ordered by ingredient id.
    #[instrument(name = "Fetching recipe ingredients", skip(self, recipe_ids))]
    pub async fn ingredients_for(
        &self,
        owner: Uuid,
        recipe_ids: &[i64],
    ) -> anyhow::Result<HashMap<i64, Vec<IngredientModel>>> {
        let mut by_recipe: HashMap<i64, Vec<IngredientModel>> = HashMap::new();
        if recipe_ids.is_empty() {
            return Ok(by_recipe);
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT ri.recipe_id, i.id, i.name
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE i.user_id = ",
        );
        query.push_bind(owner).push(" AND ri.recipe_id IN (");
        let mut separated = query.separated(", ");
        for id in recipe_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY ri.recipe_id, i.id");

        let links = query
            .build_query_as::<LinkedIngredient>()
            .fetch_all(&self.pool)
            .await?;
        for link in links {
            by_recipe.entry(link.recipe_id).or_default().push(IngredientModel {
                id: link.id,
                name: link.name,
            });
        }
        Ok(by_recipe)
    }

    /// Insert the recipe and link it to the named ingredients, creating missing
    /// ones for the owner. Runs in one transaction.
    #[instrument(name = "Inserting recipe", skip(self, fields, ingredient_names))]
    pub async fn create(
        &self,
        owner: Uuid,
        fields: &RecipeFields,
        ingredient_names: &[String],
    ) -> anyhow::Result<i64> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO recipes (user_id, title, description, time_minutes, price_cents, link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id"#,
        )
        .bind(owner)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.time_minutes)
        .bind(fields.price.cents())
        .bind(&fields.link)
        .fetch_one(&mut *tx)
        .await?;

        link_ingredients(&mut *tx, owner, id, ingredient_names).await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Overwrite the scalar columns and, when `ingredient_names` is given, replace
    /// the links. `false` if no such recipe belongs to `owner`.
    #[instrument(name = "Updating recipe", skip(self, fields, ingredient_names))]
    pub async fn update(
        &self,
        owner: Uuid,
        id: i64,
        fields: &RecipeFields,
        ingredient_names: Option<&[String]>,
    ) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"UPDATE recipes
            SET title = $1, description = $2, time_minutes = $3, price_cents = $4, link = $5
            WHERE id = $6 AND user_id = $7"#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.time_minutes)
        .bind(fields.price.cents())
        .bind(&fields.link)
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        if let Some(names) = ingredient_names {
            sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_ingredients(&mut *tx, owner, id, names).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    #[instrument(name = "Deleting recipe", skip(self))]
    pub async fn delete(&self, owner: Uuid, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn link_ingredients(
    conn: &mut SqliteConnection,
    owner: Uuid,
    recipe_id: i64,
    names: &[String],
) -> anyhow::Result<()> {
    for name in names {
        let ingredient_id = find_or_create(&mut *conn, owner, name).await?;
        sqlx::query(
            "INSERT OR IGNORE INTO recipe_ingredients (recipe_id, ingredient_id) VALUES ($1, $2)",
        )
        .bind(recipe_id)
        .bind(ingredient_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

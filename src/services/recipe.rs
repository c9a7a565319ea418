use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    models::recipe::{RecipeDetail, RecipePatch, RecipePayload, RecipeSummary},
    store::RecipeRepository,
};

#[derive(Clone, Debug)]
pub struct RecipeService {
    repo: RecipeRepository,
}

impl RecipeService {
    pub fn new(repo: RecipeRepository) -> Self {
        Self { repo }
    }

    #[instrument(name = "Service: List recipes", skip(self))]
    pub async fn list(
        &self,
        owner: Uuid,
        ingredient_ids: Option<&[i64]>,
    ) -> anyhow::Result<Vec<RecipeSummary>> {
        let rows = self.repo.list(owner, ingredient_ids).await?;
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut ingredients = self.repo.ingredients_for(owner, &ids).await?;

        rows.into_iter()
            .map(|row| {
                let linked = ingredients.remove(&row.id).unwrap_or_default();
                row.into_summary(linked)
            })
            .collect()
    }

    #[instrument(name = "Service: Get recipe", skip(self))]
    pub async fn get(&self, owner: Uuid, id: i64) -> Result<RecipeDetail, ApiError> {
        let row = self.repo.find(owner, id).await?.ok_or(ApiError::NotFound)?;
        let linked = self
            .repo
            .ingredients_for(owner, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(row.into_detail(linked)?)
    }

    #[instrument(name = "Service: Create recipe", skip(self, payload))]
    pub async fn create(&self, owner: Uuid, payload: RecipePayload) -> Result<RecipeDetail, ApiError> {
        let (fields, names) = payload.validate()?;
        let id = self.repo.create(owner, &fields, &names).await?;
        tracing::info!(recipe_id = id, "Recipe created");
        self.get(owner, id).await
    }

    /// Full update: every column and the ingredient set are replaced.
    #[instrument(name = "Service: Replace recipe", skip(self, payload))]
    pub async fn replace(
        &self,
        owner: Uuid,
        id: i64,
        payload: RecipePayload,
    ) -> Result<RecipeDetail, ApiError> {
        let (fields, names) = payload.validate()?;
        if !self.repo.update(owner, id, &fields, Some(&names)).await? {
            return Err(ApiError::NotFound);
        }
        self.get(owner, id).await
    }

    #[instrument(name = "Service: Patch recipe", skip(self, patch))]
    pub async fn patch(&self, owner: Uuid, id: i64, patch: RecipePatch) -> Result<RecipeDetail, ApiError> {
        let current = self.repo.find(owner, id).await?.ok_or(ApiError::NotFound)?;
        let (fields, names) = patch.apply(&current)?;
        if !self.repo.update(owner, id, &fields, names.as_deref()).await? {
            return Err(ApiError::NotFound);
        }
        self.get(owner, id).await
    }

    #[instrument(name = "Service: Delete recipe", skip(self))]
    pub async fn delete(&self, owner: Uuid, id: i64) -> Result<(), ApiError> {
        if self.repo.delete(owner, id).await? {
            Ok(())
        } else {
            Err(ApiError::NotFound)
        }
    }
}

use tracing::instrument;
use uuid::Uuid;

use crate::{
    errors::ApiError,
    models::ingredient::{IngredientModel, validate_name},
    store::IngredientRepository,
};

#[derive(Clone, Debug)]
pub struct IngredientService {
    repo: IngredientRepository,
}

impl IngredientService {
    pub fn new(repo: IngredientRepository) -> Self {
        Self { repo }
    }

    /// The owner's ingredients by name descending. With `assigned_only`, only
    /// those used by one of the owner's recipes, each listed once.
    #[instrument(name = "Service: List ingredients", skip(self))]
    pub async fn list(&self, owner: Uuid, assigned_only: bool) -> anyhow::Result<Vec<IngredientModel>> {
        if assigned_only {
            self.repo.list_assigned(owner).await
        } else {
            self.repo.list_by_user(owner).await
        }
    }

    /// Seeds a standalone ingredient for tests; the HTTP surface only creates
    /// ingredients through recipes.
    pub async fn create(&self, owner: Uuid, name: &str) -> Result<IngredientModel, ApiError> {
        let name = validate_name("name", name)?;
        Ok(self.repo.create(owner, &name).await?)
    }

    #[instrument(name = "Service: Rename ingredient", skip(self))]
    pub async fn rename(&self, owner: Uuid, id: i64, name: &str) -> Result<IngredientModel, ApiError> {
        let name = validate_name("name", name)?;
        self.repo
            .update_name(owner, id, &name)
            .await?
            .ok_or(ApiError::NotFound)
    }

    /// Partial update: without a name the owned row comes back unchanged.
    #[instrument(name = "Service: Patch ingredient", skip(self))]
    pub async fn patch(
        &self,
        owner: Uuid,
        id: i64,
        name: Option<&str>,
    ) -> Result<IngredientModel, ApiError> {
        match name {
            Some(name) => self.rename(owner, id, name).await,
            None => self.repo.find(owner, id).await?.ok_or(ApiError::NotFound),
        }
    }

    #[instrument(name = "Service: Delete ingredient", skip(self))]
    pub async fn delete(&self, owner: Uuid, id: i64) -> Result<(), ApiError> {
        if self.repo.delete(owner, id).await? {
            Ok(())
        } else {
            tracing::warn!("Ingredient not found for owner");
            Err(ApiError::NotFound)
        }
    }
}

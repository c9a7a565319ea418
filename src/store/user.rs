use crate::models::user::UserModel;
use sqlx::{Pool, Sqlite};
use tracing::instrument;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: Pool<Sqlite>,
}

impl UserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    #[instrument(name = "Saving new user to database", skip(self, password_hash))]
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> anyhow::Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, email, name, password_hash) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(email)
            .bind(name)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to execute query: {:?}", e);
                e
            })?;
        Ok(id)
    }

    #[instrument(name = "Fetching user by email from database", skip(self))]
    pub async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserModel>> {
        let user = sqlx::query_as::<_, UserModel>(
            r#"SELECT id, email, name, password_hash, created_at FROM users WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user: {:?}", e);
            e
        })?;
        Ok(user)
    }

    #[instrument(name = "Fetching user by id from database", skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserModel>> {
        let user = sqlx::query_as::<_, UserModel>(
            r#"SELECT id, email, name, password_hash, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Overwrite the name and, when given, the password hash. `None` if the user is gone.
    #[instrument(name = "Updating user profile", skip(self, password_hash))]
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        password_hash: Option<&str>,
    ) -> anyhow::Result<Option<UserModel>> {
        let user = sqlx::query_as::<_, UserModel>(
            r#"UPDATE users
            SET name = $1, password_hash = COALESCE($2, password_hash)
            WHERE id = $3
            RETURNING id, email, name, password_hash, created_at"#,
        )
        .bind(name)
        .bind(password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

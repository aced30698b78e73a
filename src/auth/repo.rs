use crate::auth::repo_types::User;
use sqlx::PgPool;
use uuid::Uuid;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, profile_picture, bio, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, profile_picture, bio, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user matching either the id or the email, first match wins.
    pub async fn find_by_id_or_email(
        db: &PgPool,
        id: Uuid,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, username, email, password_hash, profile_picture, bio, created_at, updated_at
            FROM users
            WHERE id = $1 OR email = $2
            LIMIT 1
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Whether a user with this email or username already exists.
    pub async fn exists_by_email_or_username(
        db: &PgPool,
        email: &str,
        username: &str,
    ) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 OR username = $2)
            "#,
        )
        .bind(email)
        .bind(username)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    /// Create a new user with hashed password.
    pub async fn create(
        db: &PgPool,
        name: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, username, email, password_hash, profile_picture, bio, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

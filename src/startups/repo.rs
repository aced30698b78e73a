use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::startups::repo_types::{NewStartup, StartupWithAuthor};
use crate::startups::slug::SlugStore;

/// Escape LIKE wildcards so a search term always matches as a literal
/// substring.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

impl StartupWithAuthor {
    /// All startups, newest first, optionally filtered by a case-insensitive
    /// substring match on title, description or category.
    pub async fn list(db: &PgPool, search: Option<&str>) -> anyhow::Result<Vec<StartupWithAuthor>> {
        let pattern = search.map(|q| format!("%{}%", escape_like(q)));
        let rows = sqlx::query_as::<_, StartupWithAuthor>(
            r#"
            SELECT s.id, s.title, s.slug, s.views, s.description, s.category, s.image, s.pitch,
                   s.created_at, s.updated_at,
                   u.id AS author_id, u.name AS author_name, u.username AS author_username,
                   u.bio AS author_bio, u.profile_picture AS author_profile_picture
            FROM startups s
            JOIN users u ON u.id = s.author_id
            WHERE $1::text IS NULL
               OR s.title ILIKE $1
               OR s.description ILIKE $1
               OR s.category ILIKE $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(pattern)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// One startup by id, with author fields attached.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<StartupWithAuthor>> {
        let row = sqlx::query_as::<_, StartupWithAuthor>(
            r#"
            SELECT s.id, s.title, s.slug, s.views, s.description, s.category, s.image, s.pitch,
                   s.created_at, s.updated_at,
                   u.id AS author_id, u.name AS author_name, u.username AS author_username,
                   u.bio AS author_bio, u.profile_picture AS author_profile_picture
            FROM startups s
            JOIN users u ON u.id = s.author_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }
}

/// Insert a new startup and return its id.
pub async fn insert(db: &PgPool, new: &NewStartup<'_>) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO startups (title, slug, author_id, views, description, category, image, pitch)
        VALUES ($1, $2, $3, 0, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(new.title)
    .bind(new.slug)
    .bind(new.author_id)
    .bind(new.description)
    .bind(new.category)
    .bind(new.image)
    .bind(new.pitch)
    .fetch_one(db)
    .await?;
    Ok(id)
}

/// Current view count, or None if the startup does not exist.
pub async fn views(db: &PgPool, id: Uuid) -> anyhow::Result<Option<i64>> {
    let count: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT views FROM startups WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(count)
}

/// Increment the view counter in a single statement so concurrent calls
/// never lose an update, returning the new count.
pub async fn increment_views(db: &PgPool, id: Uuid) -> anyhow::Result<Option<i64>> {
    let count: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE startups SET views = views + 1 WHERE id = $1
        RETURNING views
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(count)
}

#[async_trait]
impl SlugStore for PgPool {
    async fn slug_exists(&self, slug: &str, exclude_id: Option<Uuid>) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM startups
                WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(self)
        .await?;
        Ok(exists)
    }
}

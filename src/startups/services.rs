use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::error::{unique_violation_field, ApiError};
use crate::startups::dto::NewStartupInput;
use crate::startups::repo;
use crate::startups::repo_types::{NewStartup, StartupWithAuthor};
use crate::startups::slug::unique_slug;

fn unique_field(e: &anyhow::Error) -> Option<String> {
    e.downcast_ref::<sqlx::Error>()
        .and_then(unique_violation_field)
}

/// Create a startup for the acting user identified by `user_id`/`email`
/// (either may match, first match wins).
///
/// The slug probe runs before the insert; if a concurrent writer claims the
/// same slug between the check and the insert, the unique index rejects the
/// row and the insert is retried once with a fresh probe.
pub async fn create_startup(
    db: &PgPool,
    user_id: Uuid,
    email: &str,
    input: NewStartupInput,
) -> Result<StartupWithAuthor, ApiError> {
    let author = User::find_by_id_or_email(db, user_id, email)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    let slug = unique_slug(db, &input.title, None).await;

    let id = match insert_with_slug(db, &author, &input, &slug).await {
        Ok(id) => id,
        Err(e) => match unique_field(&e) {
            Some(field) if field == "slug" => {
                warn!(%slug, "slug claimed concurrently, retrying with fresh probe");
                let slug = unique_slug(db, &input.title, None).await;
                insert_with_slug(db, &author, &input, &slug)
                    .await
                    .map_err(|e| match unique_field(&e) {
                        Some(field) => ApiError::Duplicate { field },
                        None => ApiError::Internal(e),
                    })?
            }
            Some(field) => return Err(ApiError::Duplicate { field }),
            None => return Err(ApiError::Internal(e)),
        },
    };

    // Re-load with the author's public fields populated for the response.
    let startup = StartupWithAuthor::find_by_id(db, id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("created startup missing on re-load")))?;

    info!(startup_id = %startup.id, author_id = %author.id, slug = %startup.slug, "startup created");
    Ok(startup)
}

async fn insert_with_slug(
    db: &PgPool,
    author: &User,
    input: &NewStartupInput,
    slug: &str,
) -> anyhow::Result<Uuid> {
    repo::insert(
        db,
        &NewStartup {
            title: &input.title,
            slug,
            author_id: author.id,
            description: &input.description,
            category: &input.category,
            image: &input.image,
            pitch: &input.pitch,
        },
    )
    .await
}

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::startups::repo_types::StartupWithAuthor;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

/// Request body for startup creation. Fields default to empty so one pass
/// can report every missing/invalid field at once.
#[derive(Debug, Deserialize)]
pub struct CreateStartupRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "link")]
    pub image: String,
    #[serde(default)]
    pub pitch: String,
}

/// Validated, trimmed startup fields ready for persistence.
#[derive(Debug)]
pub struct NewStartupInput {
    pub title: String,
    pub description: String,
    pub category: String,
    pub image: String,
    pub pitch: String,
}

lazy_static! {
    static ref IMAGE_URL_RE: Regex = Regex::new(r"^https?://.+").unwrap();
}

impl CreateStartupRequest {
    pub fn validate(self) -> Result<NewStartupInput, ApiError> {
        let title = self.title.trim().to_string();
        let description = self.description.trim().to_string();
        let category = self.category.trim().to_string();
        let image = self.image.trim().to_string();
        let pitch = self.pitch;

        let mut errors = BTreeMap::new();

        if title.is_empty() {
            errors.insert("title".to_string(), "Title is required".to_string());
        } else if title.chars().count() > 100 {
            errors.insert(
                "title".to_string(),
                "Title must be less than 100 characters".to_string(),
            );
        }

        if description.is_empty() {
            errors.insert(
                "description".to_string(),
                "Description is required".to_string(),
            );
        } else if description.chars().count() > 500 {
            errors.insert(
                "description".to_string(),
                "Description must be less than 500 characters".to_string(),
            );
        }

        if category.is_empty() {
            errors.insert("category".to_string(), "Category is required".to_string());
        } else if category.chars().count() > 20 {
            errors.insert(
                "category".to_string(),
                "Category must be less than 20 characters".to_string(),
            );
        }

        if image.is_empty() {
            errors.insert("image".to_string(), "Image URL is required".to_string());
        } else if !IMAGE_URL_RE.is_match(&image) {
            errors.insert(
                "image".to_string(),
                "Image must be a valid URL".to_string(),
            );
        }

        if pitch.trim().is_empty() {
            errors.insert("pitch".to_string(), "Pitch is required".to_string());
        } else if pitch.chars().count() < 10 {
            errors.insert(
                "pitch".to_string(),
                "Pitch must be at least 10 characters".to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(NewStartupInput {
            title,
            description,
            category,
            image,
            pitch,
        })
    }
}

/// Author fields attached to a startup. `username` only appears in the
/// detail view; the listing deliberately omits it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub author: AuthorView,
    pub views: i64,
    pub description: String,
    pub category: String,
    pub image: String,
    pub pitch: String,
}

impl StartupView {
    fn from_row(row: StartupWithAuthor, with_username: bool) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            created_at: row.created_at,
            author: AuthorView {
                id: row.author_id,
                name: row.author_name,
                username: with_username.then_some(row.author_username),
                bio: row.author_bio,
                profile_picture: row.author_profile_picture,
            },
            views: row.views,
            description: row.description,
            category: row.category,
            image: row.image,
            pitch: row.pitch,
        }
    }

    pub fn list_item(row: StartupWithAuthor) -> Self {
        Self::from_row(row, false)
    }

    pub fn detail(row: StartupWithAuthor) -> Self {
        Self::from_row(row, true)
    }
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub id: Uuid,
    pub views: i64,
}

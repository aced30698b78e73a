use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Startup row joined with its author's public fields.
#[derive(Debug, Clone, FromRow)]
pub struct StartupWithAuthor {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub views: i64,
    pub description: String,
    pub category: String,
    pub image: String,
    pub pitch: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_username: String,
    pub author_bio: Option<String>,
    pub author_profile_picture: Option<String>,
}

/// Column values for a startup insert. `views` always starts at 0.
#[derive(Debug)]
pub struct NewStartup<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub author_id: Uuid,
    pub description: &'a str,
    pub category: &'a str,
    pub image: &'a str,
    pub pitch: &'a str,
}

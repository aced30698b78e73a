use async_trait::async_trait;
use rand::Rng;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

/// Read-only existence checks the uniqueness probe runs against. The store's
/// unique index remains the authoritative guard; callers retry on insert if
/// the probe and a concurrent writer picked the same slug.
#[async_trait]
pub trait SlugStore {
    /// Whether a startup other than `exclude_id` already owns `slug`.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<Uuid>) -> anyhow::Result<bool>;
}

/// Normalize a title into a lowercase ASCII-hyphenated token. Runs of
/// non-alphanumeric characters collapse into single hyphens; leading and
/// trailing separators are dropped.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Derive a slug for `title` that no other startup holds at the time of the
/// check. Collisions resolve by a linear probe: `base`, `base-1`, `base-2`, …
/// `exclude_id` skips the record's own row for update-in-place.
///
/// Never fails: if an existence check errors, a synthetic timestamp+random
/// slug is returned without further queries.
pub async fn unique_slug<S>(store: &S, title: &str, exclude_id: Option<Uuid>) -> String
where
    S: SlugStore + ?Sized,
{
    let base = {
        let b = slugify(title);
        if b.is_empty() {
            format!("startup-{}", epoch_millis())
        } else {
            b
        }
    };

    let mut slug = base.clone();
    let mut counter = 1u64;
    loop {
        match store.slug_exists(&slug, exclude_id).await {
            Ok(false) => return slug,
            Ok(true) => {
                slug = format!("{base}-{counter}");
                counter += 1;
            }
            Err(e) => {
                warn!(error = %e, title, "slug existence check failed, falling back to synthetic slug");
                return synthetic_slug();
            }
        }
    }
}

fn epoch_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

fn synthetic_slug() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let token: String = (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("startup-{}-{}", epoch_millis(), token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn slug_charset_ok(slug: &str) {
        assert!(!slug.is_empty());
        assert!(
            slug.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
            "unexpected character in slug {slug:?}"
        );
        assert!(!slug.starts_with('-'));
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("AI Helper"), "ai-helper");
        assert_eq!(slugify("ALLCAPS"), "allcaps");
        assert_eq!(slugify("rust 2024"), "rust-2024");
    }

    #[test]
    fn slugify_collapses_separator_runs() {
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("a - b -- c"), "a-b-c");
    }

    #[test]
    fn slugify_strips_punctuation_and_non_ascii() {
        assert_eq!(slugify("C++ & Rust"), "c-rust");
        assert_eq!(slugify("🚀 to the moon"), "to-the-moon");
    }

    #[test]
    fn slugify_yields_empty_for_unusable_titles() {
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn slugify_output_charset() {
        for title in [
            "AI Helper",
            "  Hello,   World!  ",
            "C++ & Rust",
            "🚀 to the moon",
            "a_b.c/d",
            "UPPER lower 42",
        ] {
            slug_charset_ok(&slugify(title));
        }
    }

    /// In-memory store: slug → owning id.
    struct FakeSlugs(HashMap<String, Uuid>);

    #[async_trait]
    impl SlugStore for FakeSlugs {
        async fn slug_exists(&self, slug: &str, exclude_id: Option<Uuid>) -> anyhow::Result<bool> {
            Ok(match self.0.get(slug) {
                Some(owner) => Some(*owner) != exclude_id,
                None => false,
            })
        }
    }

    struct FailingStore;

    #[async_trait]
    impl SlugStore for FailingStore {
        async fn slug_exists(&self, _: &str, _: Option<Uuid>) -> anyhow::Result<bool> {
            anyhow::bail!("store unavailable")
        }
    }

    #[tokio::test]
    async fn returns_base_when_unclaimed() {
        let store = FakeSlugs(HashMap::new());
        assert_eq!(unique_slug(&store, "AI Helper", None).await, "ai-helper");
    }

    #[tokio::test]
    async fn probes_numeric_suffixes_on_collision() {
        let mut taken = HashMap::new();
        taken.insert("ai-helper".to_string(), Uuid::new_v4());
        let store = FakeSlugs(taken);
        assert_eq!(unique_slug(&store, "AI Helper", None).await, "ai-helper-1");

        let mut taken = HashMap::new();
        taken.insert("ai-helper".to_string(), Uuid::new_v4());
        taken.insert("ai-helper-1".to_string(), Uuid::new_v4());
        let store = FakeSlugs(taken);
        assert_eq!(unique_slug(&store, "AI Helper", None).await, "ai-helper-2");
    }

    #[tokio::test]
    async fn sequential_same_title_slugs_are_distinct() {
        let mut taken = HashMap::new();
        let mut seen = Vec::new();
        for _ in 0..5 {
            let store = FakeSlugs(taken.clone());
            let slug = unique_slug(&store, "AI Helper", None).await;
            assert!(!seen.contains(&slug));
            taken.insert(slug.clone(), Uuid::new_v4());
            seen.push(slug);
        }
        assert_eq!(
            seen,
            vec![
                "ai-helper",
                "ai-helper-1",
                "ai-helper-2",
                "ai-helper-3",
                "ai-helper-4"
            ]
        );
    }

    #[tokio::test]
    async fn own_row_does_not_count_as_collision() {
        let id = Uuid::new_v4();
        let mut taken = HashMap::new();
        taken.insert("ai-helper".to_string(), id);
        let store = FakeSlugs(taken);
        assert_eq!(unique_slug(&store, "AI Helper", Some(id)).await, "ai-helper");
    }

    #[tokio::test]
    async fn empty_normalization_falls_back_to_timestamp_base() {
        let store = FakeSlugs(HashMap::new());
        let slug = unique_slug(&store, "!!!", None).await;
        assert!(slug.starts_with("startup-"));
        slug_charset_ok(&slug);
    }

    #[tokio::test]
    async fn store_failure_falls_back_to_synthetic_slug() {
        let slug = unique_slug(&FailingStore, "AI Helper", None).await;
        assert!(slug.starts_with("startup-"));
        slug_charset_ok(&slug);
        // timestamp plus random token, three hyphen-separated groups after the prefix
        assert!(slug.split('-').count() >= 3);
    }
}

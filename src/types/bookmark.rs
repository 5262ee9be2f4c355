use serde::{Deserialize, Serialize};

/// A stored URL shortcut owned by a user.
///
/// Immutable once created; `id` and `seq` are assigned by the storage layer,
/// never client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Storage-assigned insertion order, breaks `created_at` ties.
    #[serde(default)]
    pub seq: i64,
    pub owner_id: String,
}

impl Bookmark {
    /// Sort key for the newest-first list order: `created_at` descending,
    /// ties broken by insertion order (later insert first).
    pub fn ordering_key(&self) -> (i64, i64) {
        (self.created_at, self.seq)
    }
}

/// Why a draft was rejected before reaching the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftRejection {
    EmptyTitle,
    EmptyUrl,
    /// The URL field is present but not `http://` or `https://` shaped.
    MalformedUrl,
}

impl DraftRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            DraftRejection::EmptyTitle => "empty title",
            DraftRejection::EmptyUrl => "empty url",
            DraftRejection::MalformedUrl => "malformed url",
        }
    }
}

/// Validated `{title, url}` input for a new bookmark.
///
/// Construction is the validation boundary: loose form or RPC fields become
/// a draft only if both fields pass, so everything past this type can assume
/// well-formed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkDraft {
    title: String,
    url: String,
}

impl BookmarkDraft {
    pub fn parse(title: &str, url: &str) -> Result<Self, DraftRejection> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DraftRejection::EmptyTitle);
        }
        let url = url.trim();
        if url.is_empty() {
            return Err(DraftRejection::EmptyUrl);
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(DraftRejection::MalformedUrl);
        }
        Ok(Self {
            title: title.to_string(),
            url: url.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

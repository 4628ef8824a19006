//! Listing draft fields edited by the create and edit forms.

use super::error::DomainError;

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_DESCRIPTION_CHARS: usize = 5_000;

/// Whether a listing may be submitted without any image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePolicy {
    Required,
    #[default]
    Optional,
}

/// Editable listing fields, independent of the images attached to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price_cents: Option<u64>,
    pub category: Option<String>,
}

impl ListingDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Validate the draft; the first offending field is reported.
    pub fn validate(&self) -> Result<(), DomainError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::validation("title", "must not be empty"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(DomainError::validation(
                "title",
                format!("must be at most {MAX_TITLE_CHARS} characters"),
            ));
        }

        let description = self.description.trim();
        if description.is_empty() {
            return Err(DomainError::validation("description", "must not be empty"));
        }
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(DomainError::validation(
                "description",
                format!("must be at most {MAX_DESCRIPTION_CHARS} characters"),
            ));
        }

        if let Some(category) = &self.category
            && category.trim().is_empty()
        {
            return Err(DomainError::validation(
                "category",
                "must not be blank when provided",
            ));
        }

        Ok(())
    }

    /// Clear every field back to an empty draft.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

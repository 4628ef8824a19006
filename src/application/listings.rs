//! Create and edit listing forms.
//!
//! A form owns its draft fields and one [`UploadOrchestrator`]. Submission is
//! blocked until the draft is valid and every selected image is uploaded;
//! failed images must be retried or removed by the user first.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use zackweg_api_types::{ListingResponse, ListingWriteRequest};

use crate::application::ports::{ApiError, ListingsApi};
use crate::application::uploads::{UploadOrchestrator, UploadSummary};
use crate::domain::error::DomainError;
use crate::domain::listings::{ImagePolicy, ListingDraft};
use crate::domain::uploads::ImageId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { listing_id: Uuid },
}

/// Why the submit action is currently unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitBlocked {
    #[error(transparent)]
    InvalidDraft(#[from] DomainError),
    #[error("at least one image is required")]
    ImagesRequired,
    #[error("images are not uploaded yet ({summary})")]
    ImagesPending { summary: UploadSummary },
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("listing cannot be submitted: {0}")]
    Blocked(#[from] SubmitBlocked),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct ListingForm {
    mode: FormMode,
    draft: ListingDraft,
    image_policy: ImagePolicy,
    images: UploadOrchestrator,
    listings: Arc<dyn ListingsApi>,
}

impl ListingForm {
    /// Open an empty create form.
    pub fn create(
        listings: Arc<dyn ListingsApi>,
        images: UploadOrchestrator,
        image_policy: ImagePolicy,
    ) -> Self {
        Self {
            mode: FormMode::Create,
            draft: ListingDraft::default(),
            image_policy,
            images,
            listings,
        }
    }

    /// Open an edit form seeded from an existing listing; its images start
    /// out as uploaded.
    pub fn edit(
        listings: Arc<dyn ListingsApi>,
        mut images: UploadOrchestrator,
        image_policy: ImagePolicy,
        listing: &ListingResponse,
    ) -> Self {
        images.reset();
        for url in &listing.image_urls {
            images.adopt_uploaded(ImageId::generate(), url.clone());
        }

        Self {
            mode: FormMode::Edit {
                listing_id: listing.id,
            },
            draft: ListingDraft {
                title: listing.title.clone(),
                description: listing.description.clone(),
                price_cents: listing.price_cents,
                category: listing.category.clone(),
            },
            image_policy,
            images,
            listings,
        }
    }

    /// Fetch listing `id` and open an edit form for it.
    pub async fn open_edit(
        listings: Arc<dyn ListingsApi>,
        images: UploadOrchestrator,
        image_policy: ImagePolicy,
        id: Uuid,
    ) -> Result<Self, ApiError> {
        let listing = listings.fetch(id).await?;
        Ok(Self::edit(listings, images, image_policy, &listing))
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ListingDraft {
        &mut self.draft
    }

    pub fn images(&self) -> &UploadOrchestrator {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut UploadOrchestrator {
        &mut self.images
    }

    /// Report the first reason submission is blocked, if any.
    pub fn check_submit(&self) -> Result<(), SubmitBlocked> {
        self.draft.validate()?;

        if self.image_policy == ImagePolicy::Required && self.images.is_empty() {
            return Err(SubmitBlocked::ImagesRequired);
        }

        if !self.images.all_uploaded() {
            return Err(SubmitBlocked::ImagesPending {
                summary: self.images.summary(),
            });
        }

        Ok(())
    }

    /// Create or update the listing with the uploaded image URLs.
    ///
    /// On success the image registry is cleared; a create form also clears
    /// its draft so it is ready for the next listing.
    pub async fn submit(&mut self) -> Result<ListingResponse, FormError> {
        self.images.pump();
        self.check_submit()?;

        let request = self.write_request();
        let listing = match self.mode {
            FormMode::Create => self.listings.create(&request).await?,
            FormMode::Edit { listing_id } => self.listings.update(listing_id, &request).await?,
        };

        info!(
            listing_id = %listing.id,
            image_count = request.image_urls.len(),
            mode = ?self.mode,
            "listing submitted"
        );

        self.images.reset();
        if self.mode == FormMode::Create {
            self.draft.clear();
        }
        Ok(listing)
    }

    /// Discard the draft and every selected image.
    pub fn reset(&mut self) {
        self.draft.clear();
        self.images.reset();
    }

    fn write_request(&self) -> ListingWriteRequest {
        let category = self
            .draft
            .category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        ListingWriteRequest {
            title: self.draft.title.trim().to_string(),
            description: self.draft.description.trim().to_string(),
            price_cents: self.draft.price_cents,
            category,
            image_urls: self.images.uploaded_urls().to_vec(),
        }
    }
}

impl std::fmt::Debug for ListingForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingForm")
            .field("mode", &self.mode)
            .field("draft", &self.draft)
            .field("image_policy", &self.image_policy)
            .field("images", &self.images)
            .finish_non_exhaustive()
    }
}

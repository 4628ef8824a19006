mod support;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::timeout;
use uuid::Uuid;
use zackweg::application::listings::{FormError, FormMode, ListingForm, SubmitBlocked};
use zackweg::application::ports::{ApiError, UploadError};
use zackweg::application::uploads::UploadOrchestrator;
use zackweg::domain::error::DomainError;
use zackweg::domain::listings::ImagePolicy;
use zackweg::domain::uploads::{ImageConstraints, ImageId};
use zackweg_api_types::ListingWriteRequest;

use support::{RecordingListings, ScriptedUploader, Step, jpeg, listing};

fn create_form(
    listings: &Arc<RecordingListings>,
    uploader: &Arc<ScriptedUploader>,
    policy: ImagePolicy,
) -> ListingForm {
    ListingForm::create(
        listings.clone(),
        UploadOrchestrator::new(uploader.clone(), ImageConstraints::default()),
        policy,
    )
}

fn fill(form: &mut ListingForm) {
    let draft = form.draft_mut();
    draft.title = "  City bike ".to_string();
    draft.description = "Red, 28 inch wheels".to_string();
    draft.price_cents = Some(12_000);
}

async fn settle(form: &mut ListingForm) {
    timeout(Duration::from_secs(5), form.images_mut().settle())
        .await
        .expect("uploads should settle");
}

#[tokio::test]
async fn invalid_draft_blocks_submission() {
    let listings = RecordingListings::new();
    let uploader = ScriptedUploader::new();
    let mut form = create_form(&listings, &uploader, ImagePolicy::Optional);

    let err = form.submit().await.expect_err("empty draft");
    assert!(matches!(
        err,
        FormError::Blocked(SubmitBlocked::InvalidDraft(DomainError::Validation {
            field: "title",
            ..
        }))
    ));
    assert!(listings.writes().is_empty());
}

#[tokio::test]
async fn required_images_must_be_present() {
    let listings = RecordingListings::new();
    let uploader = ScriptedUploader::new();
    let mut form = create_form(&listings, &uploader, ImagePolicy::Required);
    fill(&mut form);

    assert_eq!(form.check_submit(), Err(SubmitBlocked::ImagesRequired));

    let mut optional = create_form(&listings, &uploader, ImagePolicy::Optional);
    fill(&mut optional);
    assert_eq!(optional.check_submit(), Ok(()));
}

#[tokio::test]
async fn pending_and_failed_images_block_submission() {
    let gate = Arc::new(Notify::new());
    let listings = RecordingListings::new();
    let uploader = ScriptedUploader::new();
    uploader.script(
        &jpeg(1),
        [Step::Gated(gate.clone(), "https://cdn.test/a.jpg".into())],
    );
    uploader.script(&jpeg(2), [Step::Fail(UploadError::rejected(500, None))]);

    let mut form = create_form(&listings, &uploader, ImagePolicy::Optional);
    fill(&mut form);
    form.images_mut().add_and_upload(ImageId::from("a"), jpeg(1));

    let err = form.submit().await.expect_err("image still uploading");
    assert!(matches!(
        err,
        FormError::Blocked(SubmitBlocked::ImagesPending { summary }) if summary.uploading == 1
    ));

    gate.notify_one();
    form.images_mut().add_and_upload(ImageId::from("b"), jpeg(2));
    settle(&mut form).await;

    let err = form.submit().await.expect_err("one image failed");
    assert_eq!(
        err.to_string(),
        "listing cannot be submitted: images are not uploaded yet (1/2 uploaded, 1 failed)"
    );
    assert!(listings.writes().is_empty());

    form.images_mut().remove_item(&ImageId::from("b"));
    form.submit().await.expect("remaining image is uploaded");
    assert_eq!(listings.writes().len(), 1);
}

#[tokio::test]
async fn submit_sends_uploaded_urls_and_resets_the_form() {
    let listings = RecordingListings::new();
    let uploader = ScriptedUploader::new();
    uploader.script(&jpeg(1), [Step::Succeed("https://cdn.test/a.jpg".into())]);
    uploader.script(&jpeg(2), [Step::Succeed("https://cdn.test/b.jpg".into())]);

    let mut form = create_form(&listings, &uploader, ImagePolicy::Required);
    fill(&mut form);
    form.images_mut().add_and_upload(ImageId::from("a"), jpeg(1));
    form.images_mut().add_and_upload(ImageId::from("b"), jpeg(2));
    settle(&mut form).await;

    let created = form.submit().await.expect("submit should succeed");

    let writes = listings.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].title, "City bike");
    assert_eq!(writes[0].price_cents, Some(12_000));
    let mut urls = writes[0].image_urls.clone();
    urls.sort();
    assert_eq!(urls, ["https://cdn.test/a.jpg", "https://cdn.test/b.jpg"]);
    assert_eq!(created.image_urls, writes[0].image_urls);

    assert!(form.images().is_empty());
    assert!(form.images().uploaded_urls().is_empty());
    assert!(form.draft().title.is_empty());
    assert_eq!(form.mode(), FormMode::Create);
}

#[tokio::test]
async fn edit_mode_seeds_existing_images() {
    let listings = RecordingListings::new();
    let uploader = ScriptedUploader::new();
    uploader.script(&jpeg(3), [Step::Succeed("https://cdn.test/new.jpg".into())]);

    let id = Uuid::new_v4();
    listings.seed(listing(
        id,
        &ListingWriteRequest {
            title: "Sofa".to_string(),
            description: "Three seats".to_string(),
            price_cents: None,
            category: Some("furniture".to_string()),
            image_urls: vec![
                "https://cdn.test/old-1.jpg".to_string(),
                "https://cdn.test/old-2.jpg".to_string(),
            ],
        },
    ));

    let mut form = ListingForm::open_edit(
        listings.clone(),
        UploadOrchestrator::new(uploader.clone(), ImageConstraints::default()),
        ImagePolicy::Optional,
        id,
    )
    .await
    .expect("listing exists");

    assert_eq!(form.mode(), FormMode::Edit { listing_id: id });
    assert_eq!(form.draft().title, "Sofa");
    assert!(form.images().all_uploaded());
    assert_eq!(form.images().uploaded_urls().len(), 2);

    let old = form
        .images()
        .uploaded_id("https://cdn.test/old-1.jpg")
        .expect("seeded image");
    form.images_mut().remove_item(&old);
    form.images_mut().add_and_upload(ImageId::from("new"), jpeg(3));
    settle(&mut form).await;

    let updated = form.submit().await.expect("update should succeed");
    assert_eq!(updated.id, id);
    assert_eq!(
        updated.image_urls,
        ["https://cdn.test/old-2.jpg", "https://cdn.test/new.jpg"]
    );
    assert_eq!(form.draft().title, "Sofa");
    assert!(form.images().is_empty());
    assert_eq!(uploader.calls(), 1);
}

#[tokio::test]
async fn opening_a_missing_listing_fails() {
    let listings = RecordingListings::new();
    let uploader = ScriptedUploader::new();

    let err = ListingForm::open_edit(
        listings,
        UploadOrchestrator::new(uploader, ImageConstraints::default()),
        ImagePolicy::Optional,
        Uuid::new_v4(),
    )
    .await
    .expect_err("nothing seeded");

    assert!(matches!(err, ApiError::Server { status: 404, .. }));
}

#[tokio::test]
async fn reset_discards_draft_and_images() {
    let listings = RecordingListings::new();
    let uploader = ScriptedUploader::new();
    let mut form = create_form(&listings, &uploader, ImagePolicy::Optional);
    fill(&mut form);
    form.images_mut()
        .adopt_uploaded(ImageId::from("x"), "https://cdn.test/x.jpg".to_string());

    form.reset();

    assert!(form.draft().title.is_empty());
    assert!(format!("{form:?}").starts_with("ListingForm"));
    assert!(form.images().is_empty());
}

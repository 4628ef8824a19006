use std::{
    path::{Path, PathBuf},
    process,
    sync::Arc,
};

use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use zackweg::{
    application::{
        error::{AppError, ErrorReport},
        listings::ListingForm,
        ports::{ImageUploader, ListingsApi},
        uploads::UploadOrchestrator,
    },
    config::{self, CreateArgs, Settings, UpdateArgs, UploadArgs},
    domain::{
        listings::ImagePolicy,
        uploads::{ImageConstraints, ImageId, ImageUpload, UploadState},
    },
    infra::{
        files,
        http::{ApiClient, HttpImageUploader, HttpListingsApi},
        telemetry,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("zackweg", error);
    if dispatcher::has_been_set() {
        error!(error = %report, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging)?;

    let services = Services::from_settings(&settings)?;
    match cli_args.command {
        config::Command::Upload(args) => run_upload(services, args).await,
        config::Command::Create(args) => run_create(services, args).await,
        config::Command::Update(args) => run_update(services, args).await,
    }
}

struct Services {
    uploader: Arc<dyn ImageUploader>,
    listings: Arc<dyn ListingsApi>,
    constraints: ImageConstraints,
}

impl Services {
    fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let api = ApiClient::from_settings(&settings.api)?;
        info!(base_url = %api.base(), "using listings backend");
        Ok(Self {
            uploader: Arc::new(HttpImageUploader::new(
                api.clone(),
                settings.uploads.chunk_bytes,
            )),
            listings: Arc::new(HttpListingsApi::new(api)),
            constraints: ImageConstraints::with_max_bytes(settings.uploads.max_image_bytes.get()),
        })
    }

    fn orchestrator(&self) -> UploadOrchestrator {
        UploadOrchestrator::new(Arc::clone(&self.uploader), self.constraints)
    }
}

#[derive(Serialize)]
struct ImageReport<'a> {
    file: String,
    id: &'a ImageId,
    #[serde(flatten)]
    state: &'a UploadState,
}

async fn run_upload(services: Services, args: UploadArgs) -> Result<(), AppError> {
    let mut images = services.orchestrator();
    let added = add_images(&mut images, &args.files).await?;
    settle_with_retries(&mut images, args.retry.retries).await;

    for (path, id) in &added {
        if let Some(state) = images.state(id) {
            print_json(&ImageReport {
                file: path.display().to_string(),
                id,
                state,
            })?;
        }
    }

    let summary = images.summary();
    eprintln!("{summary}");
    if !summary.is_complete() {
        return Err(AppError::UploadsFailed {
            failed: summary.failed,
            total: summary.total,
        });
    }
    Ok(())
}

async fn run_create(services: Services, args: CreateArgs) -> Result<(), AppError> {
    let mut form = ListingForm::create(
        Arc::clone(&services.listings),
        services.orchestrator(),
        image_policy(args.require_images),
    );

    let draft = form.draft_mut();
    draft.title = args.title;
    draft.description = args.description;
    draft.price_cents = args.price;
    draft.category = args.category;

    add_images(form.images_mut(), &args.images).await?;
    settle_with_retries(form.images_mut(), args.retry.retries).await;

    let listing = form.submit().await?;
    print_json(&listing)
}

async fn run_update(services: Services, args: UpdateArgs) -> Result<(), AppError> {
    let mut form = ListingForm::open_edit(
        Arc::clone(&services.listings),
        services.orchestrator(),
        image_policy(args.require_images),
        args.id,
    )
    .await?;

    let draft = form.draft_mut();
    if let Some(title) = args.title {
        draft.title = title;
    }
    if let Some(description) = args.description {
        draft.description = description;
    }
    if let Some(price) = args.price {
        draft.price_cents = Some(price);
    }
    if let Some(category) = args.category {
        draft.category = Some(category);
    }

    for url in &args.drop_images {
        let id = form.images().uploaded_id(url).ok_or_else(|| {
            AppError::validation(format!("listing {} has no image `{url}`", args.id))
        })?;
        form.images_mut().remove_item(&id);
    }

    add_images(form.images_mut(), &args.images).await?;
    settle_with_retries(form.images_mut(), args.retry.retries).await;

    let listing = form.submit().await?;
    print_json(&listing)
}

async fn add_images<'a>(
    images: &mut UploadOrchestrator,
    paths: &'a [PathBuf],
) -> Result<Vec<(&'a Path, ImageId)>, AppError> {
    let mut added = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = files::read_image(path).await?;
        let id = images.add(ImageUpload::new(bytes));
        added.push((path.as_path(), id));
    }
    Ok(added)
}

/// Wait for in-flight uploads, then run up to `retries` rounds over the
/// failed subset.
async fn settle_with_retries(images: &mut UploadOrchestrator, retries: u32) {
    images.settle().await;
    for round in 1..=retries {
        let dispatched = images.retry_failed();
        if dispatched == 0 {
            break;
        }
        info!(round, dispatched, "retrying failed uploads");
        images.settle().await;
    }
}

fn image_policy(require_images: bool) -> ImagePolicy {
    if require_images {
        ImagePolicy::Required
    } else {
        ImagePolicy::Optional
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{out}");
    Ok(())
}

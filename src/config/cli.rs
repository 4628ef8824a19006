use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use uuid::Uuid;

/// Command-line arguments for the zackweg binary.
#[derive(Debug, Parser)]
#[command(
    name = "zackweg",
    version,
    about = "Upload listing images and publish zackweg listings"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "ZACKWEG_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Upload JPEG images and print their remote URLs.
    Upload(UploadArgs),
    /// Create a listing, uploading its images first.
    Create(CreateArgs),
    /// Edit an existing listing.
    Update(UpdateArgs),
}

impl Command {
    pub fn overrides(&self) -> &ClientOverrides {
        match self {
            Self::Upload(args) => &args.overrides,
            Self::Create(args) => &args.overrides,
            Self::Update(args) => &args.overrides,
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct ClientOverrides {
    /// Override the backend base URL.
    #[arg(long = "api-base-url", value_name = "URL", value_hint = ValueHint::Url)]
    pub api_base_url: Option<String>,

    /// Override the per-request timeout.
    #[arg(long = "request-timeout-seconds", value_name = "SECONDS")]
    pub request_timeout_seconds: Option<u64>,

    /// Override the largest accepted image size in bytes.
    #[arg(long = "uploads-max-image-bytes", value_name = "BYTES")]
    pub uploads_max_image_bytes: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RetryArgs {
    /// Retry rounds over the images that failed; zero disables retrying.
    #[arg(long, default_value_t = 0, value_name = "COUNT")]
    pub retries: u32,
}

#[derive(Debug, Args, Clone)]
pub struct UploadArgs {
    #[command(flatten)]
    pub overrides: ClientOverrides,

    #[command(flatten)]
    pub retry: RetryArgs,

    /// JPEG files to upload.
    #[arg(required = true, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub overrides: ClientOverrides,

    #[command(flatten)]
    pub retry: RetryArgs,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: String,

    /// Price in cents.
    #[arg(long, value_name = "CENTS")]
    pub price: Option<u64>,

    #[arg(long)]
    pub category: Option<String>,

    /// Refuse to submit without at least one image.
    #[arg(long = "require-images", action = clap::ArgAction::SetTrue)]
    pub require_images: bool,

    #[arg(long = "image", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub images: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub overrides: ClientOverrides,

    #[command(flatten)]
    pub retry: RetryArgs,

    /// Listing id.
    pub id: Uuid,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_name = "CENTS")]
    pub price: Option<u64>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long = "require-images", action = clap::ArgAction::SetTrue)]
    pub require_images: bool,

    /// Remove an existing image by its URL.
    #[arg(long = "drop-image", value_name = "URL")]
    pub drop_images: Vec<String>,

    #[arg(long = "image", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub images: Vec<PathBuf>,
}

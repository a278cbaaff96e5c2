use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use services::services::{config::ThemeServiceConfig, media_fixer::DEFAULT_FALLBACK_IMAGE};
use tracing::error;

mod media;
mod patch_latest;

use patch_latest::{DEFAULT_TAG, PatchError, PatchOptions, PublishRoute};

#[derive(Parser, Debug)]
#[command(name = "patcher", version, about = "Maintenance tasks for generated site themes and pages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a fresh random theme for the latest tagged blog post
    PatchLatest {
        /// Tag identifying random-theme posts
        #[arg(long, default_value = DEFAULT_TAG)]
        tag: String,
        /// Preview function endpoint; defaults to SITE_URL + function path
        #[arg(long, env = "RANDOM_THEME_FUNCTION_URL")]
        function_url: Option<String>,
        #[arg(long, env = "SITE_URL", default_value = "http://localhost:8888")]
        site_url: String,
        /// Domain to theme; defaults to the post's published host
        #[arg(long)]
        domain: Option<String>,
        /// Resolve the post and seed without publishing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Rewrite broken images and YouTube links in page sources
    FixMedia {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, env = "MEDIA_FALLBACK_IMAGE", default_value = DEFAULT_FALLBACK_IMAGE)]
        fallback_image: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Report broken media without changing files; exits 1 when any is found
    ValidateMedia {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, env = "MEDIA_FALLBACK_IMAGE", default_value = DEFAULT_FALLBACK_IMAGE)]
        fallback_image: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    utils::logging::init("info");

    let cli = Cli::parse();
    match cli.command {
        Command::PatchLatest {
            tag,
            function_url,
            site_url,
            domain,
            dry_run,
        } => {
            let options = PatchOptions {
                tag,
                function_url: patch_latest::resolve_function_url(
                    function_url.as_deref(),
                    &site_url,
                ),
                domain,
                dry_run,
            };
            patch(&options).await
        }
        Command::FixMedia {
            paths,
            fallback_image,
            dry_run,
        } => match media::fix(&paths, &fallback_image, dry_run) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Media fix failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Command::ValidateMedia {
            paths,
            fallback_image,
        } => match media::fix(&paths, &fallback_image, true) {
            Ok(report) if report.issue_count() == 0 => ExitCode::SUCCESS,
            Ok(_) => ExitCode::FAILURE,
            Err(e) => {
                error!("Media validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn patch(options: &PatchOptions) -> ExitCode {
    let config = ThemeServiceConfig::from_env();

    match patch_latest::run(options, &config).await {
        Ok(Some(summary)) => {
            let action = match summary.route {
                PublishRoute::Function => "published via function",
                PublishRoute::DirectUpload => "uploaded directly",
                PublishRoute::Skipped => "dry run, nothing published",
            };
            println!(
                "{} ({}): seed {} -> {}",
                summary.post_slug, action, summary.request.seed, summary.css_url
            );
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(PatchError::MissingEnv(name)) => {
            error!("Missing required environment variable {} (or its VITE_ variant)", name);
            ExitCode::FAILURE
        }
        Err(e) => {
            // Failures after the environment check are logged, not fatal
            error!("Patching latest random-theme post failed: {}", e);
            ExitCode::SUCCESS
        }
    }
}

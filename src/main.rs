use clap::{Parser, Subcommand};
use hadith_carousel::assemble::{self, PostRequest, Stores};
use hadith_carousel::content::ContentStore;
use hadith_carousel::posted::PostedStore;
use hadith_carousel::publish::{GraphApiPublisher, Publisher};
use hadith_carousel::render::GlyphRenderer;
use hadith_carousel::{config, output};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "hadith-carousel")]
#[command(about = "Post verified hadith as Instagram carousels")]
#[command(long_about = "\
Post verified hadith as Instagram carousels

Each 'post' run picks one unposted hadith, splits it across as many slides as
it needs, renders them, publishes the carousel and records it as posted.
Variants of one hadith (251a, 251b) count as the same hadith.

Working root layout:

  ./
  ├── config.toml              # Optional, see 'hadith-carousel gen-config'
  ├── verified_hadiths.json    # Content
  ├── posted_hadiths.json      # Posted state (created on first post)
  ├── image_usage.json         # Background image usage counts
  ├── images/                  # Background images
  ├── output/                  # Rendered slides
  └── archive/                 # Copies of posted slides

The Graph API access token is read from INSTAGRAM_ACCESS_TOKEN (configurable).
Set RUST_LOG=hadith_carousel=debug for detailed logs.")]
#[command(version = version_string())]
struct Cli {
    /// Working root holding config, content and state
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Select, render, publish and record one post
    Post {
        /// Prefer texts short enough for few slides
        #[arg(long)]
        prefer_short: bool,
        /// Post the item at this content position instead of selecting
        #[arg(long)]
        index: Option<usize>,
        /// Render slides only; publish nothing and leave state untouched
        #[arg(long)]
        dry_run: bool,
    },
    /// Show posted and remaining counts per collection
    Status,
    /// Forget every posted hadith
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
    /// Validate config and content without touching state
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hadith_carousel=info")),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let root = cli.root;

    match cli.command {
        Command::Post {
            prefer_short,
            index,
            dry_run,
        } => {
            let config = config::load_config(&root)?;
            let mut stores = Stores::open(&root, &config)?;
            if let Some(report) = stores.posted.migration() {
                output::print_migration(report);
            }
            let renderer = GlyphRenderer::new(&config, &root)?;
            let publisher = if dry_run {
                None
            } else {
                Some(GraphApiPublisher::from_config(&config.instagram)?)
            };
            let request = PostRequest {
                prefer_short,
                index,
            };
            let report = assemble::run_post_with(
                &renderer,
                publisher.as_ref().map(|p| p as &dyn Publisher),
                &mut stores,
                &root,
                &config,
                &request,
                &mut rand::rng(),
            )?;
            output::print_run_report(&report, &root);
        }
        Command::Status => {
            let config = config::load_config(&root)?;
            let stores = Stores::open(&root, &config)?;
            output::print_status(&stores.content, &stores.posted);
        }
        Command::Reset { yes } => {
            if !yes {
                return Err("reset forgets every posted hadith; pass --yes to confirm".into());
            }
            let config = config::load_config(&root)?;
            let mut posted = PostedStore::empty(&root.join(&config.state.posted_file));
            posted.reset()?;
            println!("Posted state cleared: {}", posted.path().display());
        }
        Command::Check => {
            let config = config::load_config(&root)?;
            println!("==> Checking {}", root.display());
            let content = ContentStore::load(&root.join(&config.content.file))?;
            let failures = content.validation_failures(&config.content.accepted_grade);
            output::print_check(content.len(), &failures);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

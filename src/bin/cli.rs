//! s3-assets CLI
//!
//! Bucket administration and directory sync from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3_assets::error::Result;
use s3_assets::serve::{AssetServer, AssetUrls};
use s3_assets::store::S3ObjectStore;
use s3_assets::{AssetStorage, StorageConfig};

#[derive(Parser)]
#[command(name = "s3-assets")]
#[command(about = "Mirror static files into S3 and resolve their public URLs")]
#[command(version)]
struct Cli {
    /// Region override (SDK default chain when unset)
    #[arg(long, global = true, env = "S3_ASSETS_REGION")]
    region: Option<String>,

    /// Custom S3-compatible endpoint (MinIO, R2)
    #[arg(long, global = true, env = "S3_ASSETS_ENDPOINT")]
    endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long, global = true, env = "S3_ASSETS_PATH_STYLE")]
    path_style: bool,

    /// Lifetime in seconds of the presigned URL behind resolved URLs
    #[arg(long, global = true, env = "S3_ASSETS_PRESIGN_EXPIRY", default_value = "100")]
    presign_expiry: u64,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a bucket
    CreateBucket {
        /// Bucket name (generated when omitted)
        bucket: Option<String>,
        /// Region (SDK default when omitted)
        region: Option<String>,
    },
    /// List buckets visible to the credentials
    ListBuckets,
    /// Mirror a static directory into a bucket
    SyncBucket {
        /// Bucket name
        bucket: String,
        /// Static directory
        static_dir: String,
        /// Print the counts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what a sync would do without changing the bucket
    Inspect {
        /// Bucket name
        bucket: String,
        /// Static directory
        static_dir: String,
    },
    /// Print the public URL of an object
    Url {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },
    /// Serve redirects from /assets/<key> to the bucket
    Serve {
        /// Bucket name
        bucket: String,
        /// Listen port
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

impl Cli {
    fn storage_config(&self, bucket: &str, static_dir: &str) -> StorageConfig {
        let mut config = StorageConfig::new(bucket, shellexpand::tilde(static_dir).into_owned());
        config.region = self.region.clone();
        config.endpoint = self.endpoint.clone();
        config.force_path_style = self.path_style;
        config.presign_expiry_secs = self.presign_expiry;
        config
    }
}

fn init_logging(format: LogFormat) {
    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::from_default_env());
    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::CreateBucket { bucket, region } => {
            let bucket = match bucket {
                Some(name) => name.clone(),
                None => {
                    println!("No bucket name provided, one will be generated.");
                    format!("s3-assets-{}", uuid::Uuid::new_v4())
                }
            };

            let config = cli.storage_config(&bucket, ".");
            let store = S3ObjectStore::connect(&config).await?;

            let region = match region.clone().or_else(|| config.region.clone()) {
                Some(region) => region,
                None => {
                    println!("No region specified, using default.");
                    store.region().unwrap_or_else(|| "us-east-1".to_string())
                }
            };

            store.create_bucket(&bucket, &region).await?;
            println!("Bucket created! Bucket name: {} Region: {}", bucket, region);
        }

        Commands::ListBuckets => {
            let config = cli.storage_config("", ".");
            let store = S3ObjectStore::connect(&config).await?;
            for name in store.list_buckets().await? {
                println!("{}", name);
            }
        }

        Commands::SyncBucket {
            bucket,
            static_dir,
            json,
        } => {
            let storage = AssetStorage::connect(cli.storage_config(bucket, static_dir)).await?;
            let report = storage.sync().await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Synced s3://{} ({})", bucket, report);
            }
        }

        Commands::Inspect { bucket, static_dir } => {
            let storage = AssetStorage::connect(cli.storage_config(bucket, static_dir)).await?;
            let plan = storage.plan().await?;
            for (key, action) in plan.inventory.actions() {
                println!("{:<6} {}", action, key);
            }
            println!("{}", plan.report);
        }

        Commands::Url { bucket, key } => {
            let storage = AssetStorage::connect(cli.storage_config(bucket, ".")).await?;
            println!("{}", storage.resolve_url(key).await?);
        }

        Commands::Serve { bucket, port } => {
            let storage = AssetStorage::connect(cli.storage_config(bucket, ".")).await?;
            let server = AssetServer::new(AssetUrls::from_storage(&storage), *port);
            server.start().await?;
        }
    }

    Ok(())
}

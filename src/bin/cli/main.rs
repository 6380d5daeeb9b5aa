use anyhow::{Context, Result};
use bucket_store::{ClientConfig, ObjectKey, PutOptions, RequestContext, StoreClient};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::{path::PathBuf, time::Duration};
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bucket-store")]
#[command(about = "Move files and blobs to and from a single object storage bucket", long_about = None)]
struct Cli {
    /// Backend endpoint as host[:port] (always TLS)
    #[arg(long, env = "STORE_ENDPOINT")]
    endpoint: String,

    /// Access key
    #[arg(long, env = "STORE_ACCESS_KEY")]
    access_key: String,

    /// Secret key
    #[arg(long, env = "STORE_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Bucket name
    #[arg(short, long, env = "STORE_BUCKET")]
    bucket: String,

    /// Region used for request signing
    #[arg(long, env = "STORE_REGION", default_value = "us-east-1")]
    region: String,

    /// Directory for temporary downloads
    #[arg(long, env = "STORE_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Overall deadline for the command, in seconds
    #[arg(long, env = "STORE_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a local file
    Put {
        /// File path to upload
        file: PathBuf,
        /// Object key
        key: String,
        /// Content type
        #[arg(long)]
        content_type: Option<String>,
        /// User metadata as key=value, repeatable
        #[arg(short, long = "meta", value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,
    },

    /// Download an object to a file
    Get {
        /// Object key
        key: String,
        /// Output file path
        #[arg(short, long, conflicts_with = "dir")]
        output: Option<PathBuf>,
        /// Destination directory, created if missing
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// File name inside --dir (defaults to the key's file name)
        #[arg(short, long, requires = "dir")]
        name: Option<String>,
    },

    /// Write an object to stdout
    Cat {
        /// Object key
        key: String,
    },

    /// Download an object to a new temporary file and print its path
    Temp {
        /// Object key
        key: String,
    },

    /// Check whether an object exists (exit code 1 when absent)
    Exists {
        /// Object key
        key: String,
    },

    /// Show object metadata as JSON
    Stat {
        /// Object key
        key: String,
    },

    /// List objects under a prefix
    Ls {
        /// Key prefix; empty lists the whole bucket
        #[arg(default_value = "")]
        prefix: String,
        /// Print one JSON document per object
        #[arg(long)]
        json: bool,
    },

    /// Delete an object
    Rm {
        /// Object key
        key: String,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn parse_key(raw: &str) -> Result<ObjectKey> {
    ObjectKey::new(raw).with_context(|| format!("invalid object key '{}'", raw))
}

impl Cli {
    fn to_client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(
            self.endpoint.clone(),
            self.access_key.clone(),
            self.secret_key.clone(),
            self.bucket.clone(),
        )
        .with_region(self.region.clone());

        if let Some(temp_dir) = &self.temp_dir {
            config = config.with_temp_dir(temp_dir.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        config
    }

    fn request_context(&self) -> RequestContext {
        match self.timeout_secs {
            Some(secs) => RequestContext::background().with_timeout(Duration::from_secs(secs)),
            None => RequestContext::background(),
        }
    }

    fn init_logging(&self) -> Result<()> {
        let level: tracing::Level = self
            .log_level
            .parse()
            .with_context(|| format!("invalid log level '{}'", self.log_level))?;

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();

        Ok(())
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let client = StoreClient::connect(&cli.to_client_config())
        .context("Failed to create store client")?;
    let ctx = cli.request_context();

    match cli.command {
        Commands::Put {
            file,
            key,
            content_type,
            metadata,
        } => {
            let key = parse_key(&key)?;
            let mut options = PutOptions::new();
            options.content_type = content_type;
            options.user_metadata.extend(metadata);

            let sent = client.put_file(&ctx, &file, &key, &options).await?;
            info!("Uploaded {} ({} bytes) to {}", file.display(), sent, key);
        }
        Commands::Get {
            key,
            output,
            dir,
            name,
        } => {
            let key = parse_key(&key)?;
            let written = match (output, dir) {
                (_, Some(dir)) => {
                    let name = name.unwrap_or_else(|| key.file_name().to_string());
                    client.download(&ctx, &key, &dir, &name).await?
                }
                (Some(output), None) => client.download_object(&ctx, &key, &output).await?,
                (None, None) => {
                    let output = PathBuf::from(key.file_name());
                    client.download_object(&ctx, &key, &output).await?
                }
            };
            info!("Downloaded {} ({} bytes)", key, written);
        }
        Commands::Cat { key } => {
            let key = parse_key(&key)?;
            let data = client.get_object_bytes(&ctx, &key).await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
        Commands::Temp { key } => {
            let key = parse_key(&key)?;
            let path = client.object_to_tempfile(&ctx, &key).await?;
            println!("{}", path.display());
        }
        Commands::Exists { key } => {
            let key = parse_key(&key)?;
            let exists = client.object_exists(&ctx, &key).await?;
            println!("{}", exists);
            return Ok(exists);
        }
        Commands::Stat { key } => {
            let key = parse_key(&key)?;
            match client.stat_object(&ctx, &key).await? {
                Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                None => anyhow::bail!("object not found: {}", key),
            }
        }
        Commands::Ls { prefix, json } => {
            let mut listing = client.list_objects(&ctx, &prefix);
            let mut failures = 0usize;
            while let Some(item) = listing.next().await {
                match item {
                    Ok(info) if json => println!("{}", serde_json::to_string(&info)?),
                    Ok(info) => println!(
                        "{}\t{:>12}\t{}",
                        info.last_modified.format("%Y-%m-%d %H:%M:%S"),
                        info.size,
                        info.key
                    ),
                    Err(e) => {
                        failures += 1;
                        eprintln!("error: {}", e);
                    }
                }
            }
            if failures > 0 {
                anyhow::bail!("{} listing entries failed", failures);
            }
        }
        Commands::Rm { key } => {
            let key = parse_key(&key)?;
            client.delete_object(&ctx, &key).await?;
            info!("Deleted {}", key);
        }
    }

    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    if !run(cli).await? {
        std::process::exit(1);
    }

    Ok(())
}

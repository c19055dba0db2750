//! urlmeta CLI - fetch and cache metadata for URLs

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use urlmeta::{Metadata, UrlMetadataClient};

/// Output format for the fetch subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Full record as JSON
    Json,
}

/// urlmeta - cache metadata from URLs
#[derive(Parser, Debug)]
#[command(name = "urlmeta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cache root directory (defaults to URLMETA_DATA_DIR or the platform
    /// data directory)
    #[arg(long, global = true, env = "URLMETA_DATA_DIR")]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch metadata for a URL, using the cache when possible
    Fetch {
        /// URL to describe
        url: String,

        /// Output format
        #[arg(long, short, default_value = "text")]
        output: OutputFormat,

        /// Seconds to wait between outbound requests
        #[arg(long, default_value_t = 5)]
        sleep_time: u64,

        /// Don't attempt to download video subtitles
        #[arg(long)]
        skip_subtitles: bool,

        /// Subtitle language for video sites
        #[arg(long, default_value = "en")]
        subtitle_language: String,
    },
    /// Print the cache entry directory for a URL, if cached
    Where {
        /// URL to look up
        url: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            url,
            output,
            sleep_time,
            skip_subtitles,
            subtitle_language,
        } => {
            let mut builder = UrlMetadataClient::builder()
                .sleep_time(Duration::from_secs(sleep_time))
                .skip_subtitles(skip_subtitles)
                .subtitle_language(subtitle_language);
            if let Some(dir) = cli.cache_dir {
                builder = builder.cache_dir(dir);
            }
            let client = build_or_exit(builder);

            match client.get(&url).await {
                Ok(metadata) => print_metadata(&metadata, output),
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Where { url } => {
            let mut builder = UrlMetadataClient::builder();
            if let Some(dir) = cli.cache_dir {
                builder = builder.cache_dir(dir);
            }
            let client = build_or_exit(builder);

            match client.cache_dir_for(&url) {
                Ok(Some(dir)) => println!("{}", dir.display()),
                Ok(None) => {
                    eprintln!("Not cached: {url}");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

fn build_or_exit(builder: urlmeta::ClientBuilder) -> UrlMetadataClient {
    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_metadata(metadata: &Metadata, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            match serde_json::to_string_pretty(metadata) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing record: {e}");
                    std::process::exit(1);
                }
            }
        }
        OutputFormat::Text => {
            println!("url:       {}", metadata.url);
            println!("fetched:   {}", metadata.timestamp);
            if let Some(title) = metadata.title() {
                println!("title:     {title}");
            }
            if let Some(desc) = metadata
                .info_field("description")
                .and_then(|v| v.as_str())
            {
                println!("desc:      {desc}");
            }
            if let Some(summary) = &metadata.html_summary {
                let excerpt: String = summary.chars().take(200).collect();
                println!("summary:   {excerpt}");
            }
            for key in metadata.extra.keys() {
                println!("extra:     {key}");
            }
        }
    }
}

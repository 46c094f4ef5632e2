//! hcache: CLI client for hcached.

use std::io::{self, Read};

use clap::{Parser, Subcommand};
use hcache::RequestDescriptor;
use hcache::client::CacheClient;

/// hcache CLI client
#[derive(Parser)]
#[command(name = "hcache")]
#[command(version = hcache::PKG_VERSION)]
#[command(about = "Fetch responses through an hcached server")]
struct Args {
    /// Server address
    #[arg(
        short,
        long,
        env = "HCACHED_ADDRESS",
        default_value = "http://127.0.0.1:6001"
    )]
    address: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a URL through the cache
    Get {
        /// Upstream URL
        url: String,
        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Request header as "Name: Value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Request body
        #[arg(short, long, default_value = "")]
        body: String,
        /// Refresh interval in seconds
        #[arg(short, long, default_value_t = 60)]
        ttl: u64,
    },

    /// Send a JSON request descriptor read from stdin
    Raw,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let client = CacheClient::connect(&args.address).await?;

    let response = match args.command {
        Command::Get {
            url,
            method,
            headers,
            body,
            ttl,
        } => {
            let descriptor = RequestDescriptor::new(url)
                .method(method)
                .headers(hcache::Headers::List(headers))
                .body(body)
                .ttl(ttl);
            client.request(&descriptor).await?
        }
        Command::Raw => {
            let mut json = String::new();
            io::stdin().read_to_string(&mut json)?;
            client.request_json(json).await?
        }
    };

    print!("{response}");
    Ok(())
}

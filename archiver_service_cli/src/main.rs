use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use archiver_service_cli::{
    ai::ContentCleaner, archiver::Archiver, proxy::ProxyFetcher, utils, ArchiveConfig,
    ArchiveRequest,
};
use clap::Parser;
use dotenv::dotenv;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the article to archive
    #[arg(short, long)]
    url: String,

    /// Destination folder path inside the archive (slash-separated)
    #[arg(short, long)]
    folder: String,

    /// Directory where the final zip is written
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Archive the raw fetched HTML without the AI cleaning call
    #[arg(short, long)]
    skip_ai: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let args = Args::parse();

    let config = ArchiveConfig::default();
    let fetcher = ProxyFetcher::new(&config.proxy_endpoint)?;

    println!("🔍 A descarregar: {}", args.url);
    let raw_html = fetcher.fetch_page(&args.url).await?;

    let cleaned_html = if args.skip_ai {
        raw_html
    } else {
        let api_key = env::var("API_KEY").expect("API_KEY environment variable not set");
        println!("🤖 A consultar a IA...");
        ContentCleaner::new(api_key).clean_content(&raw_html).await?
    };

    let archiver = Archiver::new(config, Arc::new(fetcher));
    let request = ArchiveRequest {
        destination_path: args.folder,
        cleaned_html,
        original_url: args.url,
    };

    let progress = |msg: &str| println!("▶ {}", msg);
    let output = archiver.create_archive(&request, &progress).await?;

    std::fs::create_dir_all(&args.output_dir)?;
    utils::save_bytes(&output.zip_bytes, &args.output_dir.join(&output.filename))?;

    Ok(())
}

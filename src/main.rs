//! PDF Compression CLI
//!
//! Command-line interface for compressing PDFs locally or through a remote
//! compression service.

use anyhow::{bail, Context};
use clap::Parser;
use compress_pdf::collab::{DirectoryStorage, JsonLinesActivityLog};
use compress_pdf::file_ops::{compress_pdf_file, default_output_path};
use compress_pdf::remote::{CompressionLevel, RemoteConfig, SERVICE_URL_ENV};
use compress_pdf::server::ServerCompressor;
use compress_pdf::{CompressOptions, ProfileKind};
use std::fs;
use std::path::{Path, PathBuf};

/// Shrink a PDF by stripping metadata, scaling oversized pages and picking the
/// smallest of several saves
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PDF file path
    #[arg(short, long)]
    input: PathBuf,

    /// Output PDF file path (default: compressed_<input name> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Compression profile: web, mobile, print, archive or auto
    #[arg(short, long, default_value = "web")]
    profile: String,

    /// Server-side level: light, medium, high or maximum. Enables remote-first mode
    #[arg(short, long)]
    level: Option<String>,

    /// Base URL of the remote compression service
    #[arg(long, env = SERVICE_URL_ENV)]
    remote_url: Option<String>,

    /// Append an activity record (JSON lines) to this file
    #[arg(long)]
    activity_log: Option<PathBuf>,

    /// Copy the compressed file into this directory
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// User id written to the activity log
    #[arg(long)]
    user_id: Option<String>,

    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn server_mode(&self) -> bool {
        self.level.is_some()
            || self.remote_url.is_some()
            || self.activity_log.is_some()
            || self.storage_dir.is_some()
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .parse_default_env()
        .init();

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    println!("PDF Compressor");
    println!("==============");

    if args.server_mode() {
        run_server(&args, &output)
    } else {
        run_local(&args, &output)
    }
}

fn run_local(args: &Args, output: &Path) -> anyhow::Result<()> {
    let profile = parse_profile(&args.profile, &args.input)?;
    let options = CompressOptions::with_profile(profile);

    let result = compress_pdf_file(&args.input, output, &options)
        .with_context(|| format!("Failed to compress {:?}", args.input))?;

    println!("\nProfile: {}", profile);
    println!(
        "Pages: {} ({} complexity{})",
        result.analysis.page_count,
        result.analysis.estimated_complexity,
        if result.analysis.has_large_pages { ", large pages" } else { "" }
    );
    println!("Optimizations:");
    for optimization in &result.optimizations {
        println!("  - {}", optimization);
    }
    println!("Best save: {}", result.winning_attempt);
    print_summary(
        result.original_size,
        result.compressed_size,
        result.compression_ratio,
        result.processing_time_ms,
    );
    println!("Output saved to: {:?}", output);
    Ok(())
}

fn run_server(args: &Args, output: &Path) -> anyhow::Result<()> {
    let level = match args.level.as_deref() {
        Some(name) => match CompressionLevel::from_name(name) {
            Some(level) => level,
            None => bail!(
                "Unknown compression level '{}' (expected light, medium, high or maximum)",
                name
            ),
        },
        None => CompressionLevel::default(),
    };

    let mut server = match &args.remote_url {
        Some(url) => ServerCompressor::from_config(RemoteConfig::with_base_url(url.clone()))?,
        None => ServerCompressor::local_only(),
    };
    if let Some(path) = &args.activity_log {
        server = server.activity_sink(Box::new(JsonLinesActivityLog::new(path.clone())));
    }
    if let Some(dir) = &args.storage_dir {
        server = server.storage_sink(Box::new(DirectoryStorage::new(dir.clone())));
    }

    let input = fs::read(&args.input).with_context(|| format!("Failed to read {:?}", args.input))?;
    let file_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input.pdf".to_string());

    let outcome = server
        .compress(&input, &file_name, level, args.user_id.as_deref())
        .with_context(|| format!("Failed to compress {:?}", args.input))?;
    fs::write(output, &outcome.bytes).with_context(|| format!("Failed to write {:?}", output))?;

    println!("\nLevel: {}", level);
    println!("Compressed by: {:?}", outcome.source);
    for optimization in &outcome.optimizations {
        println!("  - {}", optimization);
    }
    print_summary(
        outcome.original_size,
        outcome.compressed_size,
        outcome.compression_ratio,
        outcome.processing_time_ms,
    );
    if let Some(url) = &outcome.download_url {
        println!("Stored at: {}", url);
    }
    println!("Output saved to: {:?}", output);
    Ok(())
}

fn parse_profile(name: &str, input: &Path) -> anyhow::Result<ProfileKind> {
    if name.eq_ignore_ascii_case("auto") {
        let size = fs::metadata(input)
            .with_context(|| format!("Failed to read {:?}", input))?
            .len() as usize;
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(ProfileKind::adaptive(&file_name, size));
    }
    match ProfileKind::from_name(name) {
        Some(kind) => Ok(kind),
        None => bail!("Unknown profile '{}' (expected web, mobile, print, archive or auto)", name),
    }
}

fn print_summary(original: usize, compressed: usize, ratio: f64, time_ms: u64) {
    println!(
        "\nDone! {} -> {} bytes ({:.1}% smaller) in {} ms",
        original, compressed, ratio, time_ms
    );
}

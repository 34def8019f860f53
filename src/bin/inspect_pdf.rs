//! Print page sizes, the analysis and the profile that would be used for a PDF.

use anyhow::Context;
use compress_pdf::analysis::page_size;
use compress_pdf::{analyze, select_profile_by_name};
use lopdf::Document;
use std::env;
use std::fs;

fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let path = args.next().context("usage: inspect_pdf <file.pdf> [profile]")?;
    let requested = args.next().unwrap_or_else(|| "web".to_string());

    let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path))?;
    println!("Read {} bytes", bytes.len());

    let doc = Document::load_mem(&bytes).with_context(|| format!("Failed to load {}", path))?;
    println!("PDF {} with {} objects", doc.version, doc.objects.len());

    for (number, page_id) in doc.get_pages() {
        match page_size(&doc, page_id) {
            Ok((width, height)) => println!("  page {}: {:.1} x {:.1} pt", number, width, height),
            Err(e) => println!("  page {}: unreadable ({})", number, e),
        }
    }

    let analysis = analyze(&doc, bytes.len());
    println!("\n{}", serde_json::to_string_pretty(&analysis)?);

    let profile = select_profile_by_name(&requested, &analysis);
    println!(
        "\nProfile for '{}': {} ({:?}, {} objects per tick)",
        requested, profile.name, profile.aggressiveness, profile.objects_per_tick
    );

    Ok(())
}

//! In-place structural changes applied once before saving.
//!
//! Runs exactly once per document: metadata stripping, rescaling of oversized
//! pages, and the structure optimization hook. Saving afterwards may happen any
//! number of times without repeating these steps.

use crate::analysis::{
    inherited_attribute, page_size, parse_rect, resolve, DocumentAnalysis, MAX_PAGE_DIMENSION,
};
use crate::profile::{Aggressiveness, CompressionProfile};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::Serialize;
use std::fmt;

/// Info dictionary fields cleared on every run
pub const METADATA_FIELDS: [&str; 6] =
    ["Title", "Author", "Subject", "Keywords", "Producer", "Creator"];

const PAGE_BOXES: [&[u8]; 5] = [b"MediaBox", b"CropBox", b"BleedBox", b"TrimBox", b"ArtBox"];
/// Boxes that may be inherited from the page tree
const INHERITABLE_BOXES: [&[u8]; 2] = [b"MediaBox", b"CropBox"];

/// A named optimization step reported back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Optimization {
    #[serde(rename = "Aggressive Metadata Removal")]
    MetadataRemoval,
    #[serde(rename = "Page Dimension Optimization")]
    PageDimensionOptimization,
    #[serde(rename = "PDF Structure Optimization")]
    StructureOptimization,
    #[serde(rename = "Multi-Attempt Compression")]
    MultiAttemptSerialization,
}

impl Optimization {
    pub fn name(&self) -> &'static str {
        match self {
            Optimization::MetadataRemoval => "Aggressive Metadata Removal",
            Optimization::PageDimensionOptimization => "Page Dimension Optimization",
            Optimization::StructureOptimization => "PDF Structure Optimization",
            Optimization::MultiAttemptSerialization => "Multi-Attempt Compression",
        }
    }
}

impl fmt::Display for Optimization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A page that was scaled down
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRescale {
    pub page_number: u32,
    pub scale: f32,
}

/// Apply all structural optimizations and return the ones that ran, in order.
pub fn mutate(
    doc: &mut Document,
    analysis: &DocumentAnalysis,
    profile: &CompressionProfile,
) -> Vec<Optimization> {
    let mut applied = Vec::new();

    strip_metadata(doc);
    applied.push(Optimization::MetadataRemoval);

    if analysis.has_large_pages {
        let rescaled = rescale_oversized_pages(doc);
        log::info!("Rescaled {} oversized page(s)", rescaled.len());
        applied.push(Optimization::PageDimensionOptimization);
    }

    if optimize_structure(doc, profile.aggressiveness) {
        applied.push(Optimization::StructureOptimization);
    }

    applied
}

/// Blank out the standard Info dictionary fields. Returns how many were cleared.
///
/// An Info dictionary is created when the document has none, so the output
/// always carries explicitly empty fields.
pub fn strip_metadata(doc: &mut Document) -> usize {
    let info = match info_dictionary_mut(doc) {
        Ok(info) => info,
        Err(e) => {
            log::warn!("Metadata removal skipped: {}", e);
            return 0;
        }
    };

    let mut cleared = 0;
    for field in METADATA_FIELDS {
        info.set(field, Object::string_literal(""));
        cleared += 1;
    }
    log::debug!("Cleared {} metadata fields", cleared);
    cleared
}

enum InfoLocation {
    Inline,
    Indirect(ObjectId),
    Missing,
}

fn info_dictionary_mut(doc: &mut Document) -> Result<&mut Dictionary, String> {
    let location = match doc.trailer.get(b"Info") {
        Ok(Object::Dictionary(_)) => InfoLocation::Inline,
        Ok(Object::Reference(id)) if matches!(doc.get_object(*id), Ok(Object::Dictionary(_))) => {
            InfoLocation::Indirect(*id)
        }
        Ok(other) => {
            log::warn!("Replacing unusable /Info entry {:?}", other);
            InfoLocation::Missing
        }
        Err(_) => InfoLocation::Missing,
    };

    match location {
        InfoLocation::Inline => doc
            .trailer
            .get_mut(b"Info")
            .and_then(Object::as_dict_mut)
            .map_err(|e| e.to_string()),
        InfoLocation::Indirect(id) => doc.get_dictionary_mut(id).map_err(|e| e.to_string()),
        InfoLocation::Missing => {
            let id = doc.add_object(Dictionary::new());
            doc.trailer.set("Info", id);
            doc.get_dictionary_mut(id).map_err(|e| e.to_string())
        }
    }
}

/// Scale every page exceeding the dimension limit down to fit it.
///
/// Pages within bounds are left alone. A page that fails to scale is logged
/// and skipped.
pub fn rescale_oversized_pages(doc: &mut Document) -> Vec<PageRescale> {
    let mut rescaled = Vec::new();

    for (page_number, page_id) in doc.get_pages() {
        let (width, height) = match page_size(doc, page_id) {
            Ok(size) => size,
            Err(e) => {
                log::warn!("Page {} size unreadable, not rescaling: {}", page_number, e);
                continue;
            }
        };

        if width <= MAX_PAGE_DIMENSION && height <= MAX_PAGE_DIMENSION {
            continue;
        }

        let scale = (MAX_PAGE_DIMENSION / width)
            .min(MAX_PAGE_DIMENSION / height)
            .min(1.0);
        if scale >= 1.0 {
            continue;
        }

        match scale_page(doc, page_id, scale) {
            Ok(()) => {
                log::debug!("Page {} scaled down by {:.1}%", page_number, scale * 100.0);
                rescaled.push(PageRescale { page_number, scale });
            }
            Err(e) => log::warn!("Page {} rescale failed: {}", page_number, e),
        }
    }

    rescaled
}

/// Uniformly scale one page: its boxes, its content and its annotation rectangles
fn scale_page(doc: &mut Document, page_id: ObjectId, scale: f32) -> Result<(), String> {
    // Resolve everything first so a failure leaves the page untouched
    let mut boxes = Vec::new();
    for key in PAGE_BOXES {
        let value = if INHERITABLE_BOXES.contains(&key) {
            inherited_attribute(doc, page_id, key).ok()
        } else {
            doc.get_dictionary(page_id)
                .ok()
                .and_then(|page| page.get(key).ok())
                .and_then(|obj| resolve(doc, obj).ok())
        };
        if let Some(value) = value {
            let rect = parse_rect(value)?;
            boxes.push((key, rect.map(|v| v * scale)));
        }
    }

    let contents = doc
        .get_dictionary(page_id)
        .map_err(|e| e.to_string())?
        .get(b"Contents")
        .ok()
        .cloned();
    let wrapped = match contents {
        Some(contents) => Some(wrap_contents(doc, contents, scale)?),
        None => None,
    };

    let annotations = annotation_ids(doc, page_id);

    let page = doc.get_dictionary_mut(page_id).map_err(|e| e.to_string())?;
    for (key, rect) in boxes {
        page.set(key, rect_object(rect));
    }
    if let Some(wrapped) = wrapped {
        page.set("Contents", wrapped);
    }

    for annot_id in annotations {
        if let Ok(annot) = doc.get_dictionary_mut(annot_id) {
            if let Some(rect) = annot.get(b"Rect").ok().and_then(|r| parse_rect(r).ok()) {
                annot.set("Rect", rect_object(rect.map(|v| v * scale)));
            }
        }
    }

    Ok(())
}

/// Surround the existing content with a saved, scaled graphics state
fn wrap_contents(doc: &mut Document, contents: Object, scale: f32) -> Result<Object, String> {
    let mut streams = match contents {
        Object::Reference(id) => match doc.get_object(id) {
            Ok(Object::Array(items)) => items.clone(),
            Ok(_) => vec![Object::Reference(id)],
            Err(e) => return Err(format!("dangling /Contents: {}", e)),
        },
        Object::Array(items) => items,
        other => return Err(format!("unexpected /Contents {:?}", other)),
    };

    let prefix = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(scale),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(scale),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
        ],
    };
    let suffix = Content {
        operations: vec![Operation::new("Q", vec![])],
    };

    let prefix_id = doc.add_object(Stream::new(
        Dictionary::new(),
        prefix.encode().map_err(|e| e.to_string())?,
    ));
    let suffix_id = doc.add_object(Stream::new(
        Dictionary::new(),
        suffix.encode().map_err(|e| e.to_string())?,
    ));

    streams.insert(0, Object::Reference(prefix_id));
    streams.push(Object::Reference(suffix_id));
    Ok(Object::Array(streams))
}

fn annotation_ids(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let annots = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
        .and_then(|annots| resolve(doc, annots).ok());

    match annots {
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_reference().ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn rect_object(rect: [f32; 4]) -> Object {
    Object::Array(rect.iter().map(|v| Object::Real(*v)).collect())
}

/// Extension point for deeper structural optimization on aggressive profiles.
///
/// Currently performs no changes. Returns whether the step ran.
pub fn optimize_structure(_doc: &mut Document, aggressiveness: Aggressiveness) -> bool {
    if aggressiveness.is_high() {
        log::debug!("Structure optimization requested at {:?} aggressiveness", aggressiveness);
        true
    } else {
        false
    }
}

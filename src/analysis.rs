//! Document analysis
//!
//! Reads page geometry and byte size to classify a document and recommend a
//! compression profile. Read-only; never fails as a whole.

use crate::profile::ProfileKind;
use lopdf::{Document, Object, ObjectId};
use serde::Serialize;
use std::fmt;

/// Pages wider or taller than this (in points) are considered oversized
pub const MAX_PAGE_DIMENSION: f32 = 1200.0;
/// Pages with a larger area (in points squared) are considered oversized
pub const MAX_PAGE_AREA: f32 = 1_440_000.0;

const COMPLEX_PAGE_COUNT: usize = 50;
const COMPLEX_FILE_SIZE: usize = 15_000_000;
const COMPLEX_AVERAGE_AREA: f32 = 2_000_000.0;
const MEDIUM_PAGE_COUNT: usize = 20;
const MEDIUM_FILE_SIZE: usize = 5_000_000;
const PRINT_MAX_FILE_SIZE: usize = 1_000_000;
const PRINT_MAX_PAGE_COUNT: usize = 10;

/// Guards against cyclic `/Parent` chains
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Rough document complexity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Complexity::Simple => "simple",
            Complexity::Medium => "medium",
            Complexity::Complex => "complex",
        })
    }
}

/// Result of analyzing a loaded document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub page_count: usize,
    pub file_size: usize,
    pub estimated_complexity: Complexity,
    pub recommended_profile: ProfileKind,
    pub has_large_pages: bool,
}

/// Analyze a document's page geometry and size.
///
/// Pages whose size cannot be read are logged and contribute no area, but
/// still count towards the page total.
pub fn analyze(doc: &Document, file_size: usize) -> DocumentAnalysis {
    let pages = doc.get_pages();
    let page_count = pages.len();

    let mut has_large_pages = false;
    let mut total_area = 0.0f32;

    for (page_num, &page_id) in pages.iter() {
        match page_size(doc, page_id) {
            Ok((width, height)) => {
                let area = width * height;
                total_area += area;
                if is_oversized(width, height) {
                    log::debug!("Page {} is oversized: {}x{}", page_num, width, height);
                    has_large_pages = true;
                }
            }
            Err(e) => log::warn!("Skipping page {} during analysis: {}", page_num, e),
        }
    }

    let average_area = if page_count > 0 {
        total_area / page_count as f32
    } else {
        0.0
    };

    let estimated_complexity = classify(page_count, file_size, average_area);
    let recommended_profile = recommend_profile(estimated_complexity, page_count, file_size);

    log::debug!(
        "Analysis: {} pages, {} bytes, avg area {:.0}, {:?}, recommends {}",
        page_count,
        file_size,
        average_area,
        estimated_complexity,
        recommended_profile
    );

    DocumentAnalysis {
        page_count,
        file_size,
        estimated_complexity,
        recommended_profile,
        has_large_pages,
    }
}

fn is_oversized(width: f32, height: f32) -> bool {
    width > MAX_PAGE_DIMENSION || height > MAX_PAGE_DIMENSION || width * height > MAX_PAGE_AREA
}

/// Complexity bucket from page count, byte size and average page area
pub fn classify(page_count: usize, file_size: usize, average_area: f32) -> Complexity {
    if page_count > COMPLEX_PAGE_COUNT
        || file_size > COMPLEX_FILE_SIZE
        || average_area > COMPLEX_AVERAGE_AREA
    {
        Complexity::Complex
    } else if page_count > MEDIUM_PAGE_COUNT || file_size > MEDIUM_FILE_SIZE {
        Complexity::Medium
    } else {
        Complexity::Simple
    }
}

fn recommend_profile(complexity: Complexity, page_count: usize, file_size: usize) -> ProfileKind {
    if complexity == Complexity::Complex {
        ProfileKind::Mobile
    } else if file_size < PRINT_MAX_FILE_SIZE && page_count < PRINT_MAX_PAGE_COUNT {
        ProfileKind::Print
    } else {
        ProfileKind::Web
    }
}

/// Width and height of a page in points, taken from its (possibly inherited) MediaBox
pub fn page_size(doc: &Document, page_id: ObjectId) -> Result<(f32, f32), String> {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")?;
    let [x1, y1, x2, y2] = parse_rect(media_box)?;
    Ok(((x2 - x1).abs(), (y2 - y1).abs()))
}

/// Look up a page attribute, walking up the page tree when the page lacks it
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<&'a Object, String> {
    let mut current = doc
        .get_dictionary(page_id)
        .map_err(|e| format!("page {:?} is not a dictionary: {}", page_id, e))?;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }
        match current.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent_id) => {
                current = doc
                    .get_dictionary(parent_id)
                    .map_err(|e| format!("broken /Parent {:?}: {}", parent_id, e))?;
            }
            Err(_) => break,
        }
    }

    Err(format!("no /{} entry", String::from_utf8_lossy(key)))
}

/// Follow a reference if `obj` is one
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, String> {
    match obj {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| format!("dangling reference {:?}: {}", id, e)),
        _ => Ok(obj),
    }
}

pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(n) => Some(*n as f32),
        Object::Real(n) => Some(*n),
        _ => None,
    }
}

/// Parse a `[x1 y1 x2 y2]` rectangle
pub(crate) fn parse_rect(obj: &Object) -> Result<[f32; 4], String> {
    match obj {
        Object::Array(arr) if arr.len() == 4 => {
            let mut rect = [0.0f32; 4];
            for (slot, value) in rect.iter_mut().zip(arr) {
                *slot = number(value)
                    .ok_or_else(|| format!("non-numeric rectangle entry {:?}", value))?;
            }
            Ok(rect)
        }
        other => Err(format!("malformed rectangle {:?}", other)),
    }
}

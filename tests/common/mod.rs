//! Shared PDF builders for integration tests

#![allow(dead_code)]

use compress_pdf::error::AttemptError;
use compress_pdf::profile::SaveSettings;
use compress_pdf::serialize::DocumentSaver;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::cell::RefCell;

/// Build a PDF with one text page per `(width, height)` entry
pub fn create_test_pdf(sizes: &[(f32, f32)]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for (i, &(width, height)) in sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 100.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Hello from page {}", i + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![
                Object::Real(10.0),
                Object::Real(10.0),
                Object::Real(width - 10.0),
                Object::Real(50.0),
            ],
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
            "Contents" => content_id,
            "Annots" => vec![annot_id.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Same as [`create_test_pdf`] with a filled-in Info dictionary
pub fn create_test_pdf_with_metadata(sizes: &[(f32, f32)]) -> Document {
    let mut doc = create_test_pdf(sizes);
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Annual Report"),
        "Author" => Object::string_literal("Finance Team"),
        "Subject" => Object::string_literal("Results"),
        "Keywords" => Object::string_literal("annual, results"),
        "Producer" => Object::string_literal("Report Generator 3.2"),
        "Creator" => Object::string_literal("Word Processor"),
        "CreationDate" => Object::string_literal("D:20240101000000Z"),
    });
    doc.trailer.set("Info", info_id);
    doc
}

pub fn pdf_bytes(doc: &Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.clone().save_to(&mut buffer).unwrap();
    buffer
}

/// Saves with lopdf and records what it was asked to do
#[derive(Default)]
pub struct RecordingSaver {
    pub ticks: RefCell<Vec<u32>>,
    pub sizes: RefCell<Vec<usize>>,
}

impl DocumentSaver for RecordingSaver {
    fn save(&self, doc: &Document, settings: &SaveSettings) -> Result<Vec<u8>, AttemptError> {
        self.ticks.borrow_mut().push(settings.objects_per_tick);
        let mut buffer = Vec::new();
        doc.clone()
            .save_to(&mut buffer).map_err(|e| AttemptError::Save(e.to_string()))?;
        self.sizes.borrow_mut().push(buffer.len());
        Ok(buffer)
    }
}

/// Never manages to save anything
pub struct BrokenSaver;

impl DocumentSaver for BrokenSaver {
    fn save(&self, _doc: &Document, _settings: &SaveSettings) -> Result<Vec<u8>, AttemptError> {
        Err(AttemptError::Save("disk on fire".to_string()))
    }
}

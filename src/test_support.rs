//! In-memory PDF builders for unit tests

use crate::error::AttemptError;
use crate::profile::SaveSettings;
use crate::serialize::DocumentSaver;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::cell::{Cell, RefCell};

pub fn size_letter() -> (f32, f32) {
    (612.0, 792.0)
}

fn page_content(index: usize) -> Vec<u8> {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
            Operation::new("Td", vec![Object::Integer(72), Object::Integer(72)]),
            Operation::new(
                "Tj",
                vec![Object::string_literal(format!("Page {}", index + 1))],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    content.encode().unwrap()
}

fn media_box(width: f32, height: f32) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(width),
        Object::Real(height),
    ])
}

fn finish(
    mut doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    extra: Option<(&str, Object)>,
) -> Document {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let mut pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    };
    if let Some((key, value)) = extra {
        pages.set(key, value);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// A document with one text page per entry in `sizes`
pub fn document_with_pages(sizes: &[(f32, f32)]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for (i, &(width, height)) in sizes.iter().enumerate() {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(i)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box(width, height),
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    finish(doc, pages_id, kids, None)
}

/// A document whose pages inherit their MediaBox from the page tree root
pub fn document_with_inherited_media_box(width: f32, height: f32, count: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for i in 0..count {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(i)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    finish(doc, pages_id, kids, Some(("MediaBox", media_box(width, height))))
}

/// Attach an Info dictionary with every standard field filled in
pub fn with_metadata(mut doc: Document) -> Document {
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Quarterly Report"),
        "Author" => Object::string_literal("Jane Doe"),
        "Subject" => Object::string_literal("Finance"),
        "Keywords" => Object::string_literal("q3, revenue"),
        "Producer" => Object::string_literal("Some Producer 1.0"),
        "Creator" => Object::string_literal("Some Editor"),
    });
    doc.trailer.set("Info", info_id);
    doc
}

/// Save a copy, leaving `doc` untouched
pub fn to_bytes(doc: &Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.clone().save_to(&mut buffer).unwrap();
    buffer
}

/// Saver that follows a script: `Some(padding)` saves a valid PDF grown by
/// roughly `padding` bytes, `None` fails. Calls past the script fail.
pub struct ScriptedSaver {
    plan: Vec<Option<usize>>,
    calls: Cell<usize>,
    sizes: RefCell<Vec<usize>>,
    ticks: RefCell<Vec<u32>>,
}

impl ScriptedSaver {
    pub fn new(plan: Vec<Option<usize>>) -> Self {
        Self {
            plan,
            calls: Cell::new(0),
            sizes: RefCell::new(Vec::new()),
            ticks: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Sizes of the successful saves, in call order
    pub fn sizes(&self) -> Vec<usize> {
        self.sizes.borrow().clone()
    }

    /// `objects_per_tick` of every call, in call order
    pub fn ticks(&self) -> Vec<u32> {
        self.ticks.borrow().clone()
    }
}

impl DocumentSaver for ScriptedSaver {
    fn save(&self, doc: &Document, settings: &SaveSettings) -> Result<Vec<u8>, AttemptError> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        self.ticks.borrow_mut().push(settings.objects_per_tick);

        match self.plan.get(call).copied().flatten() {
            Some(padding) => {
                let mut copy = doc.clone();
                if padding > 0 {
                    copy.add_object(Object::string_literal(vec![b'x'; padding]));
                }
                let mut buffer = Vec::new();
                copy.save_to(&mut buffer)
                    .map_err(|e| AttemptError::Save(e.to_string()))?;
                self.sizes.borrow_mut().push(buffer.len());
                Ok(buffer)
            }
            None => Err(AttemptError::Save(format!("scripted failure on call {}", call + 1))),
        }
    }
}

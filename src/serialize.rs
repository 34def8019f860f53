//! Multi-attempt saving
//!
//! The mutated document is saved with three fixed parameter sets, from most to
//! least conservative. Every attempt runs; the smallest output that reloads as
//! a PDF wins. If all three fail, one last save with the most conservative
//! settings is made, and its failure is fatal.

use crate::attempts::{run_attempts, smallest_success, Attempt};
use crate::error::{AttemptError, CompressError};
use crate::profile::{CompressionProfile, SaveSettings};
use lopdf::{Document, SaveOptions};

/// Upper bound on the profile-driven batch size, whatever the profile asks for
const MAX_PROFILE_OBJECTS_PER_TICK: u32 = 100;

pub const ULTRA_CONSERVATIVE: &str = "Ultra Conservative";
pub const CONSERVATIVE: &str = "Conservative";
pub const PROFILE_SETTINGS: &str = "Profile Settings";
pub const ULTIMATE_FALLBACK: &str = "Ultimate Fallback";

/// Something that can turn a document into bytes with given settings.
///
/// Takes the document by shared reference: saving never changes it, so every
/// attempt starts from the same mutated document.
pub trait DocumentSaver {
    fn save(&self, doc: &Document, settings: &SaveSettings) -> Result<Vec<u8>, AttemptError>;
}

/// Saves through lopdf's writer.
///
/// lopdf's writer updates the trailer (and may allocate an object id for an
/// xref stream), so every save works on a copy. `objects_per_tick` becomes
/// the object-stream size when object streams are requested.
/// `add_default_page` and `update_field_appearances` have no lopdf
/// counterpart and are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfSaver;

impl DocumentSaver for LopdfSaver {
    fn save(&self, doc: &Document, settings: &SaveSettings) -> Result<Vec<u8>, AttemptError> {
        let mut buffer = Vec::new();
        let mut copy = doc.clone();

        if settings.use_object_streams {
            let options = SaveOptions::builder()
                .use_object_streams(true)
                .use_xref_streams(true)
                .max_objects_per_stream(settings.objects_per_tick.max(1) as usize)
                .build();
            copy.save_with_options(&mut buffer, options)
                .map_err(|e| AttemptError::Save(e.to_string()))?;
        } else {
            copy.save_to(&mut buffer)
                .map_err(|e| AttemptError::Save(e.to_string()))?;
        }

        Ok(buffer)
    }
}

/// The winning save
#[derive(Debug, Clone)]
pub struct SerializedOutput {
    pub bytes: Vec<u8>,
    pub attempt: &'static str,
}

/// The three save attempts for a profile, most conservative first
pub fn save_attempts(profile: &CompressionProfile) -> [Attempt<SaveSettings>; 3] {
    [
        Attempt::new(ULTRA_CONSERVATIVE, SaveSettings::conservative(25)),
        Attempt::new(CONSERVATIVE, SaveSettings::conservative(50)),
        Attempt::new(
            PROFILE_SETTINGS,
            SaveSettings::conservative(profile.objects_per_tick.min(MAX_PROFILE_OBJECTS_PER_TICK)),
        ),
    ]
}

/// Save once and check the output reloads with its catalog and every page
fn probe_save<S: DocumentSaver + ?Sized>(
    saver: &S,
    doc: &Document,
    settings: &SaveSettings,
    expected_pages: usize,
) -> Result<Vec<u8>, AttemptError> {
    let bytes = saver.save(doc, settings)?;
    if bytes.is_empty() {
        return Err(AttemptError::Empty);
    }

    let reloaded = Document::load_mem(&bytes).map_err(|e| AttemptError::Unloadable(e.to_string()))?;
    reloaded
        .catalog()
        .map_err(|e| AttemptError::Incomplete(format!("catalog unreadable: {}", e)))?;
    let pages = reloaded.get_pages().len();
    if pages != expected_pages {
        return Err(AttemptError::Incomplete(format!(
            "{} of {} pages survived",
            pages, expected_pages
        )));
    }

    Ok(bytes)
}

/// Save `doc` with every attempt and keep the smallest valid result
pub fn serialize<S: DocumentSaver + ?Sized>(
    doc: &Document,
    profile: &CompressionProfile,
    saver: &S,
) -> Result<SerializedOutput, CompressError> {
    let attempts = save_attempts(profile);
    let expected_pages = doc.get_pages().len();

    let outcomes = run_attempts(&attempts, |attempt| {
        let bytes = probe_save(saver, doc, &attempt.params, expected_pages)?;
        log::info!("{}: {} bytes", attempt.name, bytes.len());
        Ok::<_, AttemptError>(bytes)
    });

    if let Some((attempt, bytes)) = smallest_success(outcomes) {
        log::info!("Best compression: {} ({} bytes)", attempt, bytes.len());
        return Ok(SerializedOutput { bytes, attempt });
    }

    log::warn!("All compression attempts failed, using fallback");
    let fallback = SaveSettings::conservative(25);
    let bytes = probe_save(saver, doc, &fallback, expected_pages).map_err(|e| {
        CompressError::Save(format!("every save attempt failed, including the fallback: {}", e))
    })?;

    Ok(SerializedOutput {
        bytes,
        attempt: ULTIMATE_FALLBACK,
    })
}

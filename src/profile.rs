//! Compression profiles and profile selection.
//!
//! The four built-in profiles live in an immutable table. Selection returns an
//! owned copy, so adjusting a profile for a particular document never touches
//! the table.

use crate::analysis::{Complexity, DocumentAnalysis};
use serde::Serialize;
use std::fmt;

/// Named compression intent requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    #[default]
    Web,
    Mobile,
    Print,
    Archive,
}

impl ProfileKind {
    pub const ALL: [ProfileKind; 4] = [
        ProfileKind::Web,
        ProfileKind::Mobile,
        ProfileKind::Print,
        ProfileKind::Archive,
    ];

    /// Parse a profile name (case-insensitive). Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "web" => Some(ProfileKind::Web),
            "mobile" => Some(ProfileKind::Mobile),
            "print" => Some(ProfileKind::Print),
            "archive" => Some(ProfileKind::Archive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Web => "web",
            ProfileKind::Mobile => "mobile",
            ProfileKind::Print => "print",
            ProfileKind::Archive => "archive",
        }
    }

    /// Pick a profile from the file name and size alone, without loading the PDF.
    ///
    /// Files over 10 MiB get `mobile`; names mentioning scans or images get
    /// `web`; names mentioning print or HQ get `print`; everything else `web`.
    pub fn adaptive(file_name: &str, file_size: usize) -> Self {
        let name = file_name.to_lowercase();
        if file_size > 10 * 1024 * 1024 {
            ProfileKind::Mobile
        } else if name.contains("scan") || name.contains("image") {
            ProfileKind::Web
        } else if name.contains("print") || name.contains("hq") {
            ProfileKind::Print
        } else {
            ProfileKind::Web
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much structural risk a profile accepts for size reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggressiveness {
    Low,
    Medium,
    High,
    Maximum,
}

impl Aggressiveness {
    pub fn is_high(&self) -> bool {
        matches!(self, Aggressiveness::High | Aggressiveness::Maximum)
    }
}

/// Parameters for a single document save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveSettings {
    /// Pack objects into compressed object streams
    pub use_object_streams: bool,
    /// Add a blank page when the document has none
    pub add_default_page: bool,
    /// Regenerate form field appearance streams
    pub update_field_appearances: bool,
    /// Number of objects handled per batch while writing
    pub objects_per_tick: u32,
}

impl SaveSettings {
    /// Conservative settings with the given batch size
    pub const fn conservative(objects_per_tick: u32) -> Self {
        Self {
            use_object_streams: false,
            add_default_page: false,
            update_field_appearances: false,
            objects_per_tick,
        }
    }
}

/// A named bundle of save-time parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionProfile {
    pub kind: ProfileKind,
    pub name: &'static str,
    pub description: &'static str,
    pub aggressiveness: Aggressiveness,
    pub objects_per_tick: u32,
    pub save_settings: SaveSettings,
}

static PROFILES: [CompressionProfile; 4] = [
    CompressionProfile {
        kind: ProfileKind::Web,
        name: "Web Optimization",
        description: "Optimized for web viewing and fast loading",
        aggressiveness: Aggressiveness::Medium,
        objects_per_tick: 300,
        save_settings: SaveSettings::conservative(300),
    },
    CompressionProfile {
        kind: ProfileKind::Mobile,
        name: "Mobile Optimization",
        description: "Maximum compression for mobile devices",
        aggressiveness: Aggressiveness::High,
        objects_per_tick: 500,
        save_settings: SaveSettings::conservative(500),
    },
    CompressionProfile {
        kind: ProfileKind::Print,
        name: "Print Quality",
        description: "Maintains high quality for printing",
        aggressiveness: Aggressiveness::Low,
        objects_per_tick: 100,
        save_settings: SaveSettings::conservative(100),
    },
    CompressionProfile {
        kind: ProfileKind::Archive,
        name: "Archive Balance",
        description: "Balanced compression for long-term storage",
        aggressiveness: Aggressiveness::Medium,
        objects_per_tick: 200,
        save_settings: SaveSettings::conservative(200),
    },
];

impl CompressionProfile {
    /// The built-in profile for `kind`
    pub fn canonical(kind: ProfileKind) -> &'static CompressionProfile {
        match kind {
            ProfileKind::Web => &PROFILES[0],
            ProfileKind::Mobile => &PROFILES[1],
            ProfileKind::Print => &PROFILES[2],
            ProfileKind::Archive => &PROFILES[3],
        }
    }

    /// All built-in profiles in table order
    pub fn all() -> &'static [CompressionProfile] {
        &PROFILES
    }
}

/// Resolve the profile to use for a document.
///
/// The only adjustment is for `web` on a complex document, which is bumped to
/// high aggressiveness with 500 objects per tick.
pub fn select_profile(requested: ProfileKind, analysis: &DocumentAnalysis) -> CompressionProfile {
    let profile = CompressionProfile::canonical(requested).clone();

    if requested == ProfileKind::Web && analysis.estimated_complexity == Complexity::Complex {
        return CompressionProfile {
            aggressiveness: Aggressiveness::High,
            objects_per_tick: 500,
            save_settings: SaveSettings {
                objects_per_tick: 500,
                ..profile.save_settings
            },
            ..profile
        };
    }

    profile
}

/// Like [`select_profile`], but takes a profile name. Unknown names fall back to `web`.
pub fn select_profile_by_name(requested: &str, analysis: &DocumentAnalysis) -> CompressionProfile {
    let kind = ProfileKind::from_name(requested).unwrap_or_else(|| {
        log::warn!("Unknown compression profile {:?}, using web", requested);
        ProfileKind::Web
    });
    select_profile(kind, analysis)
}

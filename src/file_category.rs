//! File categorization by extension.
//!
//! A file belongs to exactly one [`Category`] or to none at all. The mapping
//! lives in an immutable [`CategoryTable`] that is built once and shared
//! read-only by every worker.
//!
//! # Examples
//!
//! ```
//! use symsort::file_category::{Category, CategoryTable};
//!
//! let table = CategoryTable::default();
//! assert_eq!(table.classify("jpg"), Some(Category::Pictures));
//! assert_eq!(table.classify("MP3"), Some(Category::Audio));
//! assert_eq!(table.classify("xyz"), None);
//! ```
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// One of the four fixed file classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Photos and images (JPG, PNG, HEIC, etc.)
    Pictures,
    /// Music and recordings (MP3, FLAC, WAV, etc.)
    Audio,
    /// Movies and clips (MP4, MKV, MOV, etc.)
    Video,
    /// Documents and books (TXT, PDF, DOCX, EPUB, etc.)
    Text,
}

impl Category {
    /// Every category, in report order.
    pub const ALL: [Category; 4] = [
        Category::Pictures,
        Category::Audio,
        Category::Video,
        Category::Text,
    ];

    /// Returns the directory name for this category under the output root.
    ///
    /// # Examples
    ///
    /// ```
    /// use symsort::file_category::Category;
    ///
    /// assert_eq!(Category::Pictures.dir_name(), "pictures");
    /// assert_eq!(Category::Text.dir_name(), "text");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Pictures => "pictures",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Text => "text",
        }
    }

    /// Returns a human-readable label for reports.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Pictures => "Pictures",
            Category::Audio => "Audio",
            Category::Video => "Video",
            Category::Text => "Text",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

const PICTURE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "tiff", "tif", "ico", "heic", "raw",
];
const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "m4a", "aac", "ogg", "wma", "opus", "ape", "alac",
];
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp",
];
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "pdf", "doc", "docx", "rtf", "odt", "md", "epub", "mobi",
];

/// Maps lowercase file extensions to categories.
///
/// The table is never mutated once a run starts. To support more
/// extensions, build a new table with [`CategoryTable::with_mapping`].
#[derive(Debug, Clone)]
pub struct CategoryTable {
    extension_map: HashMap<String, Category>,
}

impl CategoryTable {
    /// Creates a table with the standard extension sets.
    pub fn new() -> Self {
        let mut extension_map = HashMap::new();
        let standard = [
            (PICTURE_EXTENSIONS, Category::Pictures),
            (AUDIO_EXTENSIONS, Category::Audio),
            (VIDEO_EXTENSIONS, Category::Video),
            (TEXT_EXTENSIONS, Category::Text),
        ];
        for (extensions, category) in standard {
            for ext in extensions {
                extension_map.insert((*ext).to_string(), category);
            }
        }
        Self { extension_map }
    }

    /// Returns a copy of this table with one more extension mapped.
    pub fn with_mapping(mut self, ext: &str, category: Category) -> Self {
        self.extension_map
            .insert(ext.trim_start_matches('.').to_lowercase(), category);
        self
    }

    /// Maps a file extension (with or without the leading dot) to a category.
    ///
    /// Matching is case-insensitive. `None` means the file is uncategorized.
    pub fn classify(&self, ext: &str) -> Option<Category> {
        self.extension_map
            .get(&ext.trim_start_matches('.').to_lowercase())
            .copied()
    }

    /// Classifies a path by its extension. Files without one are uncategorized.
    pub fn classify_path(&self, path: &Path) -> Option<Category> {
        let ext = path.extension()?.to_str()?;
        self.classify(ext)
    }

    /// Returns the sorted extensions mapped to `category`.
    pub fn extensions_for(&self, category: Category) -> Vec<&str> {
        let mut extensions: Vec<&str> = self
            .extension_map
            .iter()
            .filter(|(_, c)| **c == category)
            .map(|(ext, _)| ext.as_str())
            .collect();
        extensions.sort_unstable();
        extensions
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new()
    }
}

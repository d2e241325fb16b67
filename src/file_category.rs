/// Extension-based file categorization.
///
/// A file is routed to a category folder by looking up its extension, first in
/// the user's custom rules and then in the built-in table. Extensions that
/// appear in neither get a category synthesized from their own name.
///
/// # Examples
///
/// ```
/// use foldersort::file_category::{ExtensionTable, classify};
///
/// let rules = ExtensionTable::new();
/// assert_eq!(classify(".pdf", &rules).category, "Documents");
/// assert_eq!(classify(".xyz", &rules).category, "XYZ_Files");
/// assert_eq!(classify("", &rules).category, "No_Extension_Files");
/// ```
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

/// Category used for files that have no extension at all.
pub const NO_EXTENSION_CATEGORY: &str = "No_Extension_Files";

/// Built-in categories and the extensions that belong to them.
const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "System_Apps",
        &[".exe", ".msi", ".bat", ".apk", ".jar", ".dmg", ".bin", ".iso"],
    ),
    (
        "Documents",
        &[
            ".txt", ".doc", ".docx", ".pdf", ".xls", ".xlsx", ".ppt", ".pptx", ".rtf", ".csv",
        ],
    ),
    (
        "Images",
        &[
            ".jpg", ".jpeg", ".png", ".gif", ".svg", ".bmp", ".psd", ".webp", ".ico",
        ],
    ),
    ("Audio", &[".mp3", ".wav", ".flac", ".mid", ".midi", ".ogg"]),
    ("Videos", &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv"]),
    ("Archives", &[".zip", ".rar", ".7z", ".tar", ".gz"]),
    (
        "Developer_Files",
        &[
            ".html", ".css", ".js", ".py", ".php", ".json", ".xml", ".sql",
        ],
    ),
];

/// Flattened extension -> category lookup, built once on first use.
static BUILTIN_TABLE: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    BUILTIN_CATEGORIES
        .iter()
        .flat_map(|(category, extensions)| extensions.iter().map(move |ext| (*ext, *category)))
        .collect()
});

/// Returns the built-in category for an extension, if there is one.
pub fn builtin_category(extension: &str) -> Option<&'static str> {
    BUILTIN_TABLE.get(extension).copied()
}

/// The outcome of classifying one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Folder name the file should be moved into.
    pub category: String,
    /// True when the category was synthesized rather than looked up.
    pub is_dynamic: bool,
}

/// Errors raised when a custom rule does not satisfy the table invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Extension must look like `.ext`.
    InvalidExtension(String),
    /// Target folder name is empty.
    EmptyFolderName,
    /// Target folder name is not a single plain path component.
    InvalidFolderName(String),
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleError::InvalidExtension(ext) => {
                write!(f, "Invalid extension '{}'. Use format .ext", ext)
            }
            RuleError::EmptyFolderName => write!(f, "Target folder name cannot be empty."),
            RuleError::InvalidFolderName(name) => {
                write!(f, "Invalid target folder name '{}'", name)
            }
        }
    }
}

impl std::error::Error for RuleError {}

/// User-defined extension -> category overrides.
///
/// Keys are always lowercase and start with a dot; values are non-empty
/// single-component folder names. Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct ExtensionTable {
    rules: BTreeMap<String, String>,
}

impl ExtensionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a rule after normalizing and validating it.
    ///
    /// Returns the normalized `(extension, folder)` pair that was stored.
    pub fn insert(&mut self, extension: &str, folder: &str) -> Result<(String, String), RuleError> {
        let extension = normalize_extension(extension)?;
        let folder = validate_folder_name(folder)?;
        self.rules.insert(extension.clone(), folder.clone());
        Ok((extension, folder))
    }

    /// Looks up the override for an already-normalized extension.
    pub fn get(&self, extension: &str) -> Option<&str> {
        self.rules.get(extension).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates rules sorted by extension.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<BTreeMap<String, String>> for ExtensionTable {
    /// Builds a table from stored rules, dropping entries that break the invariants.
    fn from(raw: BTreeMap<String, String>) -> Self {
        let mut table = Self::new();
        for (extension, folder) in raw {
            let _ = table.insert(&extension, &folder);
        }
        table
    }
}

impl From<ExtensionTable> for BTreeMap<String, String> {
    fn from(table: ExtensionTable) -> Self {
        table.rules
    }
}

fn normalize_extension(extension: &str) -> Result<String, RuleError> {
    let normalized = extension.trim().to_lowercase();
    if !normalized.starts_with('.') || normalized.len() < 2 {
        return Err(RuleError::InvalidExtension(extension.trim().to_string()));
    }
    Ok(normalized)
}

fn validate_folder_name(folder: &str) -> Result<String, RuleError> {
    let folder = folder.trim();
    if folder.is_empty() {
        return Err(RuleError::EmptyFolderName);
    }
    if folder == "." || folder == ".." || folder.contains(['/', '\\']) {
        return Err(RuleError::InvalidFolderName(folder.to_string()));
    }
    Ok(folder.to_string())
}

/// Returns the lowercase, dot-prefixed extension of a file name.
///
/// Dotfiles such as `.bashrc` and names ending in a bare `.` have no
/// extension and yield an empty string.
pub fn extension_of(file_name: &Path) -> String {
    match file_name.extension().map(|ext| ext.to_string_lossy()) {
        Some(ext) if !ext.is_empty() => format!(".{}", ext.to_lowercase()),
        _ => String::new(),
    }
}

/// Maps an extension to its destination category.
///
/// Precedence: custom rules, then the built-in table, then a synthesized
/// `{EXT}_Files` category, then [`NO_EXTENSION_CATEGORY`] for an empty
/// extension. Total over any input.
pub fn classify(extension: &str, overrides: &ExtensionTable) -> Classification {
    if let Some(category) = overrides.get(extension) {
        return Classification {
            category: category.to_string(),
            is_dynamic: false,
        };
    }

    if let Some(category) = builtin_category(extension) {
        return Classification {
            category: category.to_string(),
            is_dynamic: false,
        };
    }

    let letters = extension.strip_prefix('.').unwrap_or(extension);
    let category = if letters.is_empty() {
        NO_EXTENSION_CATEGORY.to_string()
    } else {
        format!("{}_Files", letters.to_uppercase())
    };

    Classification {
        category,
        is_dynamic: true,
    }
}

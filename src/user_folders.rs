//! The conventional per-user folders organized in bulk mode.

use crate::session::Job;
use std::path::{Path, PathBuf};

/// Summary reported after organizing a single selected folder.
pub const SELECTED_FOLDER_SUMMARY: &str = "Folder organized successfully.";

/// Summary reported after organizing the standard folder set.
pub const STANDARD_FOLDERS_SUMMARY: &str = "Organized all 6 user folders successfully!";

/// Folder names under the home directory, with the extensions each protects.
/// Shortcuts on the Desktop stay where they are.
const STANDARD_FOLDERS: &[(&str, &[&str])] = &[
    ("Desktop", &[".lnk", ".url"]),
    ("Downloads", &[]),
    ("Documents", &[]),
    ("Pictures", &[]),
    ("Music", &[]),
    ("Videos", &[]),
];

/// Builds the bulk-mode jobs for the folders under `home`, in fixed order.
pub fn standard_jobs(home: &Path) -> Vec<Job> {
    STANDARD_FOLDERS
        .iter()
        .map(|(name, protected)| Job::new(*name, home.join(name)).protecting(protected.iter()))
        .collect()
}

/// Builds the job for a folder the user picked.
pub fn selected_folder_job(folder: &Path) -> Job {
    Job::new("Selected Folder", folder)
}

/// The folder a fresh session starts with: `~/Downloads` if present,
/// otherwise the current directory.
pub fn default_folder() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Downloads"))
        .filter(|downloads| downloads.is_dir())
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

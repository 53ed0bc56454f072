//! Data models for Drive Fetcher
//!
//! This module defines the core data structures used throughout the application:
//! validated folder identifiers, the remote folder tree as listed by Drive, and
//! the flattened plan of local directories and files a fetch materializes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{drive, files};
use crate::errors::{FolderError, FolderResult};

/// Validated Google Drive folder identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderId(String);

impl FolderId {
    /// Parse a folder identifier from a Drive URL or a bare ID
    ///
    /// Accepted forms:
    ///
    /// ```text
    /// 1jFZvTNlQnoFRB3WVw4cKewKW15olW95U
    /// https://drive.google.com/drive/folders/1jFZvTNlQnoFRB3WVw4cKewKW15olW95U
    /// https://drive.google.com/drive/u/0/folders/1jFZvTNlQnoFRB3WVw4cKewKW15olW95U?usp=sharing
    /// https://drive.google.com/open?id=1jFZvTNlQnoFRB3WVw4cKewKW15olW95U
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `FolderError::InvalidIdentifier` for anything else
    pub fn parse(input: &str) -> FolderResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid(input, "identifier is empty"));
        }

        if !trimmed.contains("://") {
            return Self::from_bare_id(input, trimmed);
        }

        let url = Url::parse(trimmed).map_err(|e| invalid(input, &e.to_string()))?;
        let host = url.host_str().unwrap_or_default();
        if !drive::HOSTS.contains(&host) {
            return Err(invalid(input, "not a Google Drive URL"));
        }

        let mut segments = url.path_segments().into_iter().flatten();
        if segments.any(|s| s == "folders") {
            if let Some(id) = segments.next() {
                return Self::from_bare_id(input, id);
            }
        }

        if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "id") {
            return Self::from_bare_id(input, &id);
        }

        Err(invalid(input, "URL does not reference a folder"))
    }

    fn from_bare_id(input: &str, id: &str) -> FolderResult<Self> {
        if id.len() < drive::MIN_ID_LENGTH {
            return Err(invalid(input, "ID is too short"));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid(input, "ID contains invalid characters"));
        }
        Ok(Self(id.to_string()))
    }

    /// The raw ID
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Folder page URL under `base`, with the interface language pinned to English
    /// so the page title can be parsed
    pub fn folder_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_path(&format!("/drive/folders/{}", self.0));
        url.set_query(Some("hl=en"));
        url
    }
}

fn invalid(input: &str, reason: &str) -> FolderError {
    FolderError::InvalidIdentifier {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for FolderId {
    type Err = FolderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One child of a folder as listed on its Drive page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEntry {
    /// Drive file or folder ID
    pub id: String,
    /// Display name
    pub name: String,
    /// MIME type reported by Drive
    pub mime_type: String,
}

impl DriveEntry {
    /// Whether this entry is a sub-folder
    pub fn is_folder(&self) -> bool {
        self.mime_type == drive::FOLDER_MIME_TYPE
    }
}

/// A node of the resolved remote tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveNode {
    File(DriveEntry),
    Folder(DriveFolder),
}

/// A remote folder with its children resolved recursively
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveFolder {
    pub id: String,
    pub name: String,
    pub children: Vec<DriveNode>,
}

impl DriveFolder {
    /// Number of files in this folder and all sub-folders
    pub fn file_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                DriveNode::File(_) => 1,
                DriveNode::Folder(folder) => folder.file_count(),
            })
            .sum()
    }

    /// Flatten the tree into directories to create and files to download,
    /// relative to the folder's local root, in listing order
    pub fn plan(&self) -> Vec<PlannedEntry> {
        let mut entries = Vec::new();
        self.plan_into(Path::new(""), &mut entries);
        entries
    }

    fn plan_into(&self, prefix: &Path, entries: &mut Vec<PlannedEntry>) {
        for child in &self.children {
            match child {
                DriveNode::Folder(folder) => {
                    let path = prefix.join(sanitize_name(&folder.name));
                    entries.push(PlannedEntry {
                        file_id: None,
                        relative_path: path.clone(),
                    });
                    folder.plan_into(&path, entries);
                }
                DriveNode::File(file) => entries.push(PlannedEntry {
                    file_id: Some(file.id.clone()),
                    relative_path: prefix.join(sanitize_name(&file.name)),
                }),
            }
        }
    }
}

/// A directory to create (`file_id` is `None`) or a file to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub file_id: Option<String>,
    pub relative_path: PathBuf,
}

impl PlannedEntry {
    pub fn is_directory(&self) -> bool {
        self.file_id.is_none()
    }
}

/// Make a remote name safe to use as a single local path component
pub fn sanitize_name(name: &str) -> String {
    let replaced = name.replace(['/', '\\'], files::NAME_REPLACEMENT);
    match replaced.as_str() {
        "" | "." | ".." => files::NAME_REPLACEMENT.to_string(),
        _ => replaced,
    }
}

/// A named folder the application fetches by default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset name used in log and status output
    pub name: String,
    /// Folder URL or ID
    pub folder: String,
}

impl Dataset {
    pub fn new(name: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
        }
    }

    /// The commodities and macro datasets
    pub fn defaults() -> Vec<Self> {
        use crate::constants::datasets::*;
        vec![
            Self::new(COMMODITIES_NAME, COMMODITIES_URL),
            Self::new(MACRO_NAME, MACRO_URL),
        ]
    }
}

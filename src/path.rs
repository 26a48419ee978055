//! Path value types for the virtual workspace tree.
//!
//! All path arithmetic lives here; no other module concatenates or splits
//! path strings. A folder path is root-relative and `/`-separated, with two
//! special rules baked in:
//!
//! - the root folder has the reserved path `"root"`, and
//! - children of root use their bare name (`"docs"`), deeper folders use
//!   `parent/name` (`"proj/sub"`).
//!
//! Files are identified by a [`FileId`]: the owning folder's path plus the
//! bare file name. Name uniqueness is only enforced within a folder, so the
//! full location is the primary key.

use crate::error::WorkspaceError;

/// Reserved path of the always-present root folder.
pub const ROOT_PATH: &str = "root";

/// Separator between folder path segments.
pub const SEPARATOR: char = '/';

/// Check that a file or folder name is usable as a single path segment.
///
/// Names containing the separator are rejected here rather than escaped
/// anywhere; this is a validation contract, not a storage-format feature.
pub fn validate_name(name: &str) -> Result<(), WorkspaceError> {
    if name.trim().is_empty() {
        return Err(WorkspaceError::validation("name cannot be empty"));
    }
    if name.contains(SEPARATOR) {
        return Err(WorkspaceError::validation(format!(
            "name '{name}' cannot contain '{SEPARATOR}'"
        )));
    }
    Ok(())
}

/// Check a name intended to become a folder path segment: a valid name
/// that is not the reserved root path.
pub fn validate_folder_name(name: &str) -> Result<(), WorkspaceError> {
    validate_name(name)?;
    if name == ROOT_PATH {
        return Err(WorkspaceError::validation(format!(
            "'{ROOT_PATH}' is a reserved folder name"
        )));
    }
    Ok(())
}

/// Root-relative path of a folder in the workspace tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderPath(String);

impl FolderPath {
    /// The root folder's path.
    pub fn root() -> Self {
        FolderPath(ROOT_PATH.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_PATH
    }

    /// Parse an untrusted path string (e.g. from a persisted snapshot).
    pub fn parse(raw: &str) -> Result<Self, WorkspaceError> {
        if raw == ROOT_PATH {
            return Ok(Self::root());
        }
        if raw.is_empty() {
            return Err(WorkspaceError::validation("folder path cannot be empty"));
        }
        for segment in raw.split(SEPARATOR) {
            validate_name(segment)?;
            if segment == ROOT_PATH {
                return Err(WorkspaceError::validation(format!(
                    "'{ROOT_PATH}' is reserved and cannot appear in folder path '{raw}'"
                )));
            }
        }
        Ok(FolderPath(raw.to_string()))
    }

    /// Path of a child folder named `name` under this folder.
    pub fn join(&self, name: &str) -> FolderPath {
        if self.is_root() {
            FolderPath(name.to_string())
        } else {
            FolderPath(format!("{}{SEPARATOR}{name}", self.0))
        }
    }

    /// Parent folder path, or `None` for root.
    pub fn parent(&self) -> Option<FolderPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rsplit_once(SEPARATOR) {
            Some((prefix, _)) => Some(FolderPath(prefix.to_string())),
            None => Some(FolderPath::root()),
        }
    }

    /// The folder's own name (last segment; `"root"` for the root folder).
    pub fn name(&self) -> &str {
        match self.0.rsplit_once(SEPARATOR) {
            Some((_, name)) => name,
            None => &self.0,
        }
    }

    /// True if `other` lies strictly below this folder.
    pub fn is_ancestor_of(&self, other: &FolderPath) -> bool {
        if other.is_root() || self == other {
            return false;
        }
        if self.is_root() {
            return true;
        }
        other
            .0
            .strip_prefix(&self.0)
            .is_some_and(|rest| rest.starts_with(SEPARATOR))
    }

    /// Rewrite this path if it equals `old` or lies below it.
    ///
    /// Used during folder rename/move, where the whole old→new mapping is
    /// computed before any entry is touched.
    pub fn rebase(&self, old: &FolderPath, new: &FolderPath) -> Option<FolderPath> {
        if self == old {
            return Some(new.clone());
        }
        if old.is_ancestor_of(self) {
            let rest = if old.is_root() {
                self.0.as_str()
            } else {
                &self.0[old.0.len() + 1..]
            };
            return Some(new.join_relative(rest));
        }
        None
    }

    /// Join a multi-segment relative path (already validated) below this folder.
    fn join_relative(&self, relative: &str) -> FolderPath {
        if self.is_root() {
            FolderPath(relative.to_string())
        } else {
            FolderPath(format!("{}{SEPARATOR}{relative}", self.0))
        }
    }

    /// Segments from the root's child down to this folder (empty for root).
    pub fn segments(&self) -> Vec<&str> {
        if self.is_root() {
            Vec::new()
        } else {
            self.0.split(SEPARATOR).collect()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FolderPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Primary key of a file: owning folder plus bare name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId {
    pub folder: FolderPath,
    pub name: String,
}

impl FileId {
    pub fn new(folder: FolderPath, name: impl Into<String>) -> Self {
        FileId {
            folder,
            name: name.into(),
        }
    }

    /// Root-relative display/storage form, e.g. `"docs/readme.md"`.
    ///
    /// Files directly under root use the bare name, mirroring folder paths.
    pub fn full_path(&self) -> String {
        if self.folder.is_root() {
            self.name.clone()
        } else {
            format!("{}{SEPARATOR}{}", self.folder.as_str(), self.name)
        }
    }

    /// Inverse of [`FileId::full_path`] for untrusted snapshot keys.
    pub fn parse(raw: &str) -> Result<Self, WorkspaceError> {
        match raw.rsplit_once(SEPARATOR) {
            Some((folder, name)) => {
                validate_name(name)?;
                Ok(FileId::new(FolderPath::parse(folder)?, name))
            }
            None => {
                validate_name(raw)?;
                Ok(FileId::new(FolderPath::root(), raw))
            }
        }
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_children_use_bare_names() {
        let root = FolderPath::root();
        let docs = root.join("docs");
        assert_eq!(docs.as_str(), "docs");
        assert_eq!(docs.parent(), Some(FolderPath::root()));
        assert_eq!(docs.name(), "docs");
    }

    #[test]
    fn test_nested_paths_use_separator() {
        let sub = FolderPath::root().join("proj").join("sub");
        assert_eq!(sub.as_str(), "proj/sub");
        assert_eq!(sub.parent().unwrap().as_str(), "proj");
        assert_eq!(sub.name(), "sub");
    }

    #[test]
    fn test_ancestor_checks() {
        let root = FolderPath::root();
        let proj = root.join("proj");
        let sub = proj.join("sub");
        let projection = root.join("projection");

        assert!(root.is_ancestor_of(&sub));
        assert!(proj.is_ancestor_of(&sub));
        assert!(!proj.is_ancestor_of(&projection), "prefix is not ancestry");
        assert!(!sub.is_ancestor_of(&proj));
        assert!(!proj.is_ancestor_of(&proj));
    }

    #[test]
    fn test_rebase_rewrites_subtree_paths() {
        let old = FolderPath::root().join("proj").join("sub");
        let new = FolderPath::root().join("proj").join("lib");
        let deep = old.join("inner");

        assert_eq!(old.rebase(&old, &new), Some(new.clone()));
        assert_eq!(deep.rebase(&old, &new).unwrap().as_str(), "proj/lib/inner");
        let unrelated = FolderPath::root().join("docs");
        assert_eq!(unrelated.rebase(&old, &new), None);
    }

    #[test]
    fn test_names_with_separator_rejected() {
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("").is_err());
        assert!(validate_name("  ").is_err());
        assert!(validate_name("a.txt").is_ok());
    }

    #[test]
    fn test_file_id_full_path_round_trip() {
        let id = FileId::new(FolderPath::root().join("docs"), "readme.md");
        assert_eq!(id.full_path(), "docs/readme.md");
        assert_eq!(FileId::parse("docs/readme.md").unwrap(), id);

        let top = FileId::new(FolderPath::root(), "main.rs");
        assert_eq!(top.full_path(), "main.rs");
        assert_eq!(FileId::parse("main.rs").unwrap(), top);
    }

    #[test]
    fn test_folder_names_cannot_be_reserved() {
        assert!(validate_folder_name("root").is_err());
        assert!(validate_folder_name("a/b").is_err());
        assert!(validate_folder_name("docs").is_ok());
    }

    #[test]
    fn test_parse_rejects_reserved_segments() {
        assert!(FolderPath::parse("root").unwrap().is_root());
        assert!(FolderPath::parse("a/root").is_err());
        assert!(FolderPath::parse("").is_err());
        assert!(FolderPath::parse("a//b").is_err());
    }
}

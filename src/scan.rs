//! Class discovery: a lazy, depth-first walk over a compiled class tree.

use ignore::{Walk, WalkBuilder};
use std::path::{Component, Path, PathBuf};

use crate::error::ScanError;

const CLASS_SUFFIX: &str = ".class";

/// A `.class` file found under the class root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredClassFile {
    relative_path: String,
    absolute_path: PathBuf,
}

impl DiscoveredClassFile {
    /// Root-relative path with `/` separators, e.g. `com/x/Foo.class`.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Fully qualified binary name, e.g. `com.x.Foo` or `com.x.Foo$Inner`.
    pub fn class_name(&self) -> String {
        class_path_to_class_name(&self.relative_path)
    }
}

/// Iterator over the class files below a root, in walk order.
pub struct ClassFiles {
    root: PathBuf,
    walk: Walk,
}

impl Iterator for ClassFiles {
    type Item = Result<DiscoveredClassFile, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walk.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    return Some(Err(ScanError::Walk {
                        root: self.root.clone(),
                        source,
                    }));
                }
            };

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            if let Some(relative_path) = relative_class_path(&self.root, path) {
                return Some(Ok(DiscoveredClassFile {
                    relative_path,
                    absolute_path: path.to_path_buf(),
                }));
            }
        }
    }
}

/// Starts a walk over `root`. Nothing is read until the iterator is advanced.
pub fn scan_class_files(root: &Path) -> Result<ClassFiles, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootMissing(root.to_path_buf()));
    }

    let walk = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .build();

    Ok(ClassFiles {
        root: root.to_path_buf(),
        walk,
    })
}

/// `/`-separated path of `file` relative to `root`, if it names a class.
///
/// Files called exactly `.class`, paths starting with `.` and paths that are
/// not valid UTF-8 are not class names and yield `None`.
pub fn relative_class_path(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }

    let file_name = *parts.last()?;
    if file_name == CLASS_SUFFIX || !file_name.ends_with(CLASS_SUFFIX) {
        return None;
    }

    let joined = parts.join("/");
    if joined.starts_with('.') {
        return None;
    }
    Some(joined)
}

pub fn class_name_to_class_path(class_name: &str) -> String {
    format!("{}{CLASS_SUFFIX}", class_name.replace('.', "/"))
}

pub fn class_path_to_class_name(class_path: &str) -> String {
    class_path
        .strip_suffix(CLASS_SUFFIX)
        .unwrap_or(class_path)
        .replace('/', ".")
}

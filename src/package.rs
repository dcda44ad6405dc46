//! Packaging of a generated class tree into a jar.

use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

use crate::scan::relative_class_path;

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const DEFAULT_CLASSIFIER: &str = "api";

/// `<final_name>-<classifier>.jar`, or `<final_name>.jar` without a
/// classifier.
pub fn jar_file_name(final_name: &str, classifier: Option<&str>) -> Result<String> {
    if final_name.trim().is_empty() {
        bail!("finalName is not allowed to be empty");
    }
    Ok(match classifier.filter(|c| !c.is_empty()) {
        Some(classifier) => format!("{final_name}-{classifier}.jar"),
        None => format!("{final_name}.jar"),
    })
}

/// Writes every `.class` file under `content_dir` into `jar_path`, manifest
/// first, entries sorted by path. Returns the number of class entries.
pub fn package_jar(content_dir: &Path, jar_path: &Path) -> Result<usize> {
    let mut entries = Vec::new();
    for entry in WalkBuilder::new(content_dir).standard_filters(false).build() {
        let entry = entry.with_context(|| format!("Failed to walk {}", content_dir.display()))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if let Some(name) = relative_class_path(content_dir, entry.path()) {
            entries.push((name, entry.path().to_path_buf()));
        }
    }
    entries.sort();

    if let Some(parent) = jar_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let file = File::create(jar_path)
        .with_context(|| format!("Failed to create jar: {}", jar_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(MANIFEST_PATH, options)?;
    zip.write_all(manifest().as_bytes())?;

    for (name, path) in &entries {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&bytes)?;
    }
    zip.finish()
        .with_context(|| format!("Failed to finish jar: {}", jar_path.display()))?;

    Ok(entries.len())
}

fn manifest() -> String {
    format!(
        "Manifest-Version: 1.0\r\nCreated-By: {} {}\r\n\r\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EmitError;
use crate::rewrite::RewrittenClass;
use crate::scan::class_name_to_class_path;

#[derive(Debug, Clone)]
pub struct EmittedFile {
    pub path: PathBuf,
    pub sha256: String,
}

/// `<output_root>/<package dirs>/<SimpleName>.class`
pub fn class_output_path(output_root: &Path, class_name: &str) -> PathBuf {
    output_root.join(class_name_to_class_path(class_name))
}

/// Writes `class` below `output_root`, replacing any existing file.
pub fn emit_class(output_root: &Path, class: &RewrittenClass) -> Result<EmittedFile, EmitError> {
    let path = class_output_path(output_root, &class.name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| EmitError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&path, &class.bytes).map_err(|source| EmitError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(EmittedFile {
        path,
        sha256: hash_bytes(&class.bytes),
    })
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

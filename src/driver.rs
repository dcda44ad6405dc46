//! Batch driver: discovery, resolution, eligibility, rewrite and emission
//! for every class file below the class root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::classpath::{ClassLoader, ClasspathRoot};
use crate::eligibility::{self, Eligibility};
use crate::emit::emit_class;
use crate::error::GenerateError;
use crate::report::{BatchReport, FailureKind};
use crate::rewrite::rewrite_class;
use crate::scan::{DiscoveredClassFile, scan_class_files};

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Compiled class tree to rewrite.
    pub classes_root: PathBuf,
    /// Ordered classpath used to resolve discovered names.
    pub classpath: Vec<PathBuf>,
    /// Created if absent.
    pub output_root: PathBuf,
}

/// Runs one batch. Per-class failures are recorded in the report; only a
/// failure to create the output root or to walk the class root is fatal.
pub fn generate(request: &GenerateRequest) -> Result<BatchReport, GenerateError> {
    let start = Instant::now();
    info!("Generating api classes...");

    fs::create_dir_all(&request.output_root).map_err(|source| GenerateError::Output {
        path: request.output_root.clone(),
        source,
    })?;

    let roots: Vec<ClasspathRoot> = request
        .classpath
        .iter()
        .map(|p| ClasspathRoot::from_path(p))
        .collect();
    let mut loader = ClassLoader::new(&roots, &request.classes_root);
    if loader.is_degraded() {
        debug!("Couldn't build the classpath; resolving from the class root only");
    }
    debug!("Resolving classes from {} roots", loader.root_paths().len());

    let mut report = BatchReport::new(&request.classes_root, &request.output_root);
    report.classpath_degraded = loader.is_degraded();

    info!("Looking for classes in {}", request.classes_root.display());
    for entry in scan_class_files(&request.classes_root)? {
        let entry = entry?;
        process_class(&mut loader, &entry, &request.output_root, &mut report);
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        emitted = report.emitted_count(),
        failed = report.failed_count(),
        skipped = report.skipped,
        "Done creating api classes"
    );
    Ok(report)
}

fn process_class(
    loader: &mut ClassLoader,
    entry: &DiscoveredClassFile,
    output_root: &Path,
    report: &mut BatchReport,
) {
    let class_name = entry.class_name();
    debug!("Found class file {}", entry.relative_path());

    let class = match loader.load_class(&class_name) {
        Ok(class) => class,
        Err(err) => {
            let kind = err.kind();
            if kind == FailureKind::NotFound {
                error!("Could not find class {class_name}! Resulting api jar may be incomplete!");
            } else {
                error!("Could not load class {class_name}: {err}");
            }
            report.record_failure(&class_name, kind, err.to_string());
            return;
        }
    };
    debug!("Resolved {class_name} from {}", class.origin().display());

    if let Eligibility::Rejected(reason) = eligibility::check(&class) {
        debug!("Skipping {class_name} ({reason:?})");
        report.skipped += 1;
        return;
    }

    let rewritten = match rewrite_class(class) {
        Ok(rewritten) => rewritten,
        Err(err) => {
            error!("Could not rewrite class {class_name}: {err}");
            report.record_failure(&class_name, FailureKind::RewriteError, err.to_string());
            return;
        }
    };

    match emit_class(output_root, &rewritten) {
        Ok(emitted) => {
            info!("Created api class for {class_name}");
            report.record_emitted(&class_name, &emitted.path, emitted.sha256);
        }
        Err(err) => {
            error!("Could not write api class for {class_name}: {err}");
            report.record_failure(&class_name, FailureKind::IoError, err.to_string());
        }
    }
}

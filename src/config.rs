use anyhow::{Result, bail};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::cli::GenerateArgs;
use crate::driver::GenerateRequest;
use crate::package::jar_file_name;

/// Extra classpath entries, joined with the platform path separator.
pub const CLASSPATH_ENV: &str = "API_DIST_CLASSPATH";
pub const GENERATED_DIR_NAME: &str = "generated-api-classes";

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub request: GenerateRequest,
    pub jar: Option<PathBuf>,
}

pub fn resolve_generate_config(args: &GenerateArgs) -> Result<GenerateConfig> {
    build_generate_config(args, env::var_os(CLASSPATH_ENV))
}

pub fn build_generate_config(
    args: &GenerateArgs,
    env_classpath: Option<OsString>,
) -> Result<GenerateConfig> {
    let classes_root = args.classes.clone();
    if classes_root.as_os_str().is_empty() {
        bail!("--classes must not be empty");
    }
    let build_dir = build_dir(&classes_root);

    // Compiled output first, so a dependency carrying an older copy of a
    // project class never shadows it.
    let mut classpath = vec![classes_root.clone()];
    if let Some(test_classes) = args.test_classes.as_ref().filter(|p| p.is_dir()) {
        classpath.push(test_classes.clone());
    }
    for value in &args.classpath {
        classpath.extend(parse_classpath_entries(value.as_ref()));
    }
    if let Some(value) = env_classpath {
        classpath.extend(parse_classpath_entries(&value));
    }
    dedup_preserving_order(&mut classpath);

    let output_root = args
        .output
        .clone()
        .unwrap_or_else(|| build_dir.join(GENERATED_DIR_NAME));

    let jar = match (&args.jar, &args.final_name) {
        (Some(jar), _) => Some(jar.clone()),
        (None, Some(final_name)) => {
            Some(build_dir.join(jar_file_name(final_name, Some(&args.classifier))?))
        }
        (None, None) => None,
    };

    Ok(GenerateConfig {
        request: GenerateRequest {
            classes_root,
            classpath,
            output_root,
        },
        jar,
    })
}

/// Splits a classpath string on the platform path separator, dropping empty
/// entries.
pub fn parse_classpath_entries(value: &std::ffi::OsStr) -> Vec<PathBuf> {
    env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

/// Directory holding the class root, where generated artifacts go
/// (`target/` for `target/classes`).
pub fn build_dir(classes_root: &Path) -> PathBuf {
    match classes_root.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn dedup_preserving_order(paths: &mut Vec<PathBuf>) {
    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
}

//! Batch report: one outcome per discovered class, in discovery order.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    NotFound,
    IoError,
    RewriteError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Emitted {
        name: String,
        path: String,
        sha256: String,
    },
    Failed {
        name: String,
        kind: FailureKind,
        detail: String,
    },
}

impl Outcome {
    pub fn name(&self) -> &str {
        match self {
            Outcome::Emitted { name, .. } | Outcome::Failed { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub classes_root: String,
    pub output_root: String,
    pub classpath_degraded: bool,
    /// Interfaces, abstract classes and module descriptors.
    pub skipped: usize,
    pub duration_ms: u64,
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn new(classes_root: &Path, output_root: &Path) -> Self {
        Self {
            classes_root: classes_root.to_string_lossy().to_string(),
            output_root: output_root.to_string_lossy().to_string(),
            ..Self::default()
        }
    }

    pub fn record_emitted(&mut self, name: &str, path: &Path, sha256: String) {
        self.outcomes.push(Outcome::Emitted {
            name: name.to_string(),
            path: path.to_string_lossy().to_string(),
            sha256,
        });
    }

    pub fn record_failure(&mut self, name: &str, kind: FailureKind, detail: String) {
        self.outcomes.push(Outcome::Failed {
            name: name.to_string(),
            kind,
            detail,
        });
    }

    pub fn emitted(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Emitted { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Failed { .. }))
    }

    pub fn emitted_count(&self) -> usize {
        self.emitted().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "classes_root: {}", self.classes_root);
        let _ = writeln!(out, "output_root: {}", self.output_root);
        let _ = writeln!(out, "emitted: {}", self.emitted_count());
        let _ = writeln!(out, "failed: {}", self.failed_count());
        let _ = writeln!(out, "skipped: {}", self.skipped);
        if self.classpath_degraded {
            let _ = writeln!(out, "classpath: degraded");
        }
        let _ = writeln!(out, "duration_ms: {}", self.duration_ms);
        for outcome in self.failed() {
            if let Outcome::Failed { name, kind, detail } = outcome {
                let _ = writeln!(out, "- {name}: {kind:?}: {detail}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_keep_insertion_order_and_counts() {
        let mut report = BatchReport::new(Path::new("classes"), Path::new("api"));
        report.record_emitted("a.A", Path::new("api/a/A.class"), "00".into());
        report.record_failure("a.B", FailureKind::NotFound, "missing".into());
        report.record_emitted("a.C", Path::new("api/a/C.class"), "11".into());

        let names: Vec<&str> = report.outcomes.iter().map(Outcome::name).collect();
        assert_eq!(names, vec!["a.A", "a.B", "a.C"]);
        assert_eq!(report.emitted_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert!(report.has_failures());
    }

    #[test]
    fn serializes_tagged_outcomes() {
        let mut report = BatchReport::new(Path::new("classes"), Path::new("api"));
        report.record_failure("a.B", FailureKind::RewriteError, "bad".into());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][0]["outcome"], "failed");
        assert_eq!(json["outcomes"][0]["kind"], "RewriteError");
        assert_eq!(json["outcomes"][0]["name"], "a.B");
    }

    #[test]
    fn text_summary_lists_failures() {
        let mut report = BatchReport::new(Path::new("classes"), Path::new("api"));
        report.skipped = 2;
        report.record_failure("a.B", FailureKind::IoError, "disk full".into());
        let text = report.render_text();
        assert!(text.contains("failed: 1"));
        assert!(text.contains("skipped: 2"));
        assert!(text.contains("- a.B: IoError: disk full"));
    }
}

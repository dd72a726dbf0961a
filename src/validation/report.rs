//! Validation report types for the non-aborting `validate` command.
//!
//! The conversion pipeline stops at the first bad annotation. When checking a
//! dataset by hand it is more useful to see every rejection at once, so
//! [`super::validate_annotations`] collects them here instead.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{ErrorKind, FacerecordsError};

/// The result of validating a set of annotation files.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    /// Number of annotation files checked.
    pub total: usize,

    /// One entry per rejected annotation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Number of annotations that were rejected.
    pub fn failed_count(&self) -> usize {
        self.issues.len()
    }

    /// Number of annotations that would produce a record.
    pub fn passed_count(&self) -> usize {
        self.total.saturating_sub(self.issues.len())
    }

    /// Returns true if every annotation passed.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Rejection counts per error kind, in a stable order.
    pub fn counts_by_kind(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(
                f,
                "Validation passed: {} annotation(s), no issues found",
                self.total
            );
        }

        writeln!(
            f,
            "Validation failed: {} of {} annotation(s) rejected",
            self.failed_count(),
            self.total
        )?;
        for (kind, count) in self.counts_by_kind() {
            writeln!(f, "  {}: {}", kind, count)?;
        }
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single rejected annotation.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    /// The annotation file that was rejected.
    pub annotation: PathBuf,

    /// Which category of check failed.
    pub kind: ErrorKind,

    /// A human-readable description of the failure.
    pub message: String,
}

impl ValidationIssue {
    /// Builds an issue from the error that rejected `annotation`.
    pub fn from_error(annotation: impl Into<PathBuf>, error: &FacerecordsError) -> Self {
        Self {
            annotation: annotation.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.kind,
            self.annotation.display(),
            self.message
        )
    }
}

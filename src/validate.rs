use std::collections::HashSet;

use tracing::debug;

use crate::table::{NodeType, PATH_SEPARATOR, ROOT_MARKER, StateTable};

/// Message attached to rows repeating a state code within a class.
pub const DUPLICATE_CODE_MESSAGE: &str = "Duplicate State Code";
/// Message attached to rows repeating an already-seen path.
pub const DUPLICATE_PATH_MESSAGE: &str = "Duplicate Path";
/// Message prefix attached to rows whose ancestor chain has a gap.
pub const MISSING_PARENTS_MESSAGE: &str = "Missing parents";

/// One validation rule's output: the rule and the rows it flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// State rows repeating a code within their StateClass group; first
    /// occurrences are not listed.
    DuplicateStateCode { rows: Vec<usize> },
    /// Rows repeating a path already seen earlier in the table.
    DuplicatePath { rows: Vec<usize> },
    /// Rows whose parent chain has absent ancestors.
    MissingParents { rows: Vec<MissingParent> },
}

/// A single missing-parent offender with the ancestor paths it lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingParent {
    pub row: usize,
    pub missing: Vec<String>,
}

impl Finding {
    /// The human-readable rule name, as written to the error column.
    pub fn rule(&self) -> &'static str {
        match self {
            Finding::DuplicateStateCode { .. } => DUPLICATE_CODE_MESSAGE,
            Finding::DuplicatePath { .. } => DUPLICATE_PATH_MESSAGE,
            Finding::MissingParents { .. } => MISSING_PARENTS_MESSAGE,
        }
    }

    /// The flagged row indices.
    pub fn rows(&self) -> Vec<usize> {
        match self {
            Finding::DuplicateStateCode { rows } | Finding::DuplicatePath { rows } => rows.clone(),
            Finding::MissingParents { rows } => rows.iter().map(|offender| offender.row).collect(),
        }
    }
}

/// Runs the three integrity rules over the table. Every rule is evaluated;
/// none aborts. Offending rows get the rule's message appended to their
/// error cell, and each non-empty rule contributes one finding. Findings
/// are data: whether they block further processing is the caller's call.
pub fn validate(table: &mut StateTable) -> Vec<Finding> {
    let mut findings = Vec::new();

    if let Some(finding) = check_duplicate_state_codes(table) {
        findings.push(finding);
    }
    if let Some(finding) = check_duplicate_paths(table) {
        findings.push(finding);
    }
    if let Some(finding) = check_missing_parents(table) {
        findings.push(finding);
    }

    debug!(finding_count = findings.len(), "validation completed");
    findings
}

/// Rule 1: within each StateClass group, a state code may appear once; every
/// repeat is flagged. Class rows never participate.
fn check_duplicate_state_codes(table: &mut StateTable) -> Option<Finding> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut duplicates = Vec::new();

    for (index, row) in table.rows().iter().enumerate() {
        if row.node_type != NodeType::State {
            continue;
        }
        if !seen.insert((row.state_class.clone(), row.code.clone())) {
            duplicates.push(index);
        }
    }

    if duplicates.is_empty() {
        return None;
    }

    annotate(table, &duplicates, DUPLICATE_CODE_MESSAGE);
    Some(Finding::DuplicateStateCode { rows: duplicates })
}

/// Rule 2: a path may appear once in the whole table; every repeat is
/// flagged.
fn check_duplicate_paths(table: &mut StateTable) -> Option<Finding> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = Vec::new();

    for (index, row) in table.rows().iter().enumerate() {
        if !seen.insert(row.path.clone()) {
            duplicates.push(index);
        }
    }

    if duplicates.is_empty() {
        return None;
    }

    annotate(table, &duplicates, DUPLICATE_PATH_MESSAGE);
    Some(Finding::DuplicatePath { rows: duplicates })
}

/// Rule 3: walking in table order, every prefix of a row's parent must name
/// a path seen earlier (seeded with the root marker). The row's own path
/// enters the known set whether or not it was flagged, so one break in a
/// chain does not cascade onto every descendant. Assumes path-sorted input.
fn check_missing_parents(table: &mut StateTable) -> Option<Finding> {
    let mut known: HashSet<String> = HashSet::from([ROOT_MARKER.to_string()]);
    let mut offenders = Vec::new();

    for (index, row) in table.rows().iter().enumerate() {
        if !known.contains(&row.parent) {
            let missing: Vec<String> = subpaths(&row.parent)
                .into_iter()
                .filter(|prefix| !known.contains(prefix))
                .collect();
            if !missing.is_empty() {
                offenders.push(MissingParent { row: index, missing });
            }
        }
        known.insert(row.path.clone());
    }

    if offenders.is_empty() {
        return None;
    }

    let rows_mut = table.rows_mut();
    for offender in &offenders {
        let message = format!("{MISSING_PARENTS_MESSAGE}: {}", offender.missing.join(", "));
        rows_mut[offender.row].append_error(&message);
    }

    Some(Finding::MissingParents { rows: offenders })
}

/// Decomposes a path into all of its prefix paths, shortest first:
/// `~/a/b` becomes `~`, `~/a`, `~/a/b`.
fn subpaths(path: &str) -> Vec<String> {
    let mut parts = path.split(PATH_SEPARATOR);
    let mut subpath = match parts.next() {
        Some(first) => first.to_string(),
        None => return Vec::new(),
    };
    let mut subpaths = vec![subpath.clone()];

    for part in parts {
        subpath.push(PATH_SEPARATOR);
        subpath.push_str(part);
        subpaths.push(subpath.clone());
    }

    subpaths
}

fn annotate(table: &mut StateTable, rows: &[usize], message: &str) {
    let rows_mut = table.rows_mut();
    for &index in rows {
        rows_mut[index].append_error(message);
    }
}

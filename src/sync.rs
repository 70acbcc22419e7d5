use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::error::{Result, ToolError};
use crate::flatten::flatten;
use crate::io::csv_file;
use crate::io::excel_read;
use crate::io::excel_write;
use crate::io::xml_read;
use crate::io::xml_write;
use crate::reconstruct::reconstruct;
use crate::table::StateTable;
use crate::validate::{Finding, validate};

/// Result of a file-to-file conversion workflow.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The requested output was written. Findings may still be present when
    /// the target is tabular; the error column is the report surface there.
    Written { findings: Vec<Finding> },
    /// Validation blocked a markup export: the annotated table was written
    /// to `annotated` instead of the requested output.
    Rejected {
        annotated: PathBuf,
        findings: Vec<Finding>,
    },
}

impl SyncOutcome {
    /// The findings the validation pass produced, whichever way it went.
    pub fn findings(&self) -> &[Finding] {
        match self {
            SyncOutcome::Written { findings } | SyncOutcome::Rejected { findings, .. } => findings,
        }
    }
}

/// Converts a markup export into a CSV table.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn xml_to_csv(input: &Path, output: &Path) -> Result<SyncOutcome> {
    let tree = xml_read::read_tree(input)?;
    let mut table = flatten(&tree)?;
    let findings = validate(&mut table);
    report_findings(&findings);
    csv_file::write_table(output, &table)?;
    Ok(SyncOutcome::Written { findings })
}

/// Converts a markup export into an Excel workbook.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn xml_to_excel(input: &Path, output: &Path) -> Result<SyncOutcome> {
    let tree = xml_read::read_tree(input)?;
    let mut table = flatten(&tree)?;
    let findings = validate(&mut table);
    report_findings(&findings);
    excel_write::write_table(output, &table)?;
    Ok(SyncOutcome::Written { findings })
}

/// Converts a CSV table back into a markup export, refusing when validation
/// finds anything.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn csv_to_xml(input: &Path, output: &Path) -> Result<SyncOutcome> {
    let table = csv_file::read_table(input)?;
    table_to_markup(table, output)
}

/// Converts an Excel workbook back into a markup export, refusing when
/// validation finds anything.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn excel_to_xml(input: &Path, output: &Path) -> Result<SyncOutcome> {
    let table = excel_read::read_table(input)?;
    table_to_markup(table, output)
}

/// Transcodes a CSV table into an Excel workbook.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn csv_to_excel(input: &Path, output: &Path) -> Result<SyncOutcome> {
    let mut table = csv_file::read_table(input)?;
    let findings = validate(&mut table);
    report_findings(&findings);
    excel_write::write_table(output, &table)?;
    Ok(SyncOutcome::Written { findings })
}

/// Transcodes an Excel workbook into a CSV table.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display())
)]
pub fn excel_to_csv(input: &Path, output: &Path) -> Result<SyncOutcome> {
    let mut table = excel_read::read_table(input)?;
    let findings = validate(&mut table);
    report_findings(&findings);
    csv_file::write_table(output, &table)?;
    Ok(SyncOutcome::Written { findings })
}

/// The validation gate in front of every markup export: a table with any
/// finding is written out annotated instead of being reconstructed.
fn table_to_markup(mut table: StateTable, output: &Path) -> Result<SyncOutcome> {
    let findings = validate(&mut table);
    if !findings.is_empty() {
        let annotated = annotated_path(output);
        csv_file::write_table(&annotated, &table)?;
        warn!(
            finding_count = findings.len(),
            annotated = %annotated.display(),
            "validation failed; annotated table written instead of markup"
        );
        return Ok(SyncOutcome::Rejected {
            annotated,
            findings,
        });
    }

    let tree = reconstruct(&table).map_err(ToolError::from)?;
    info!(
        class_count = tree.classes.len(),
        state_count = tree.state_count(),
        "table reconstructed into a tree"
    );
    xml_write::write_tree(output, &tree)?;
    Ok(SyncOutcome::Written { findings })
}

fn annotated_path(output: &Path) -> PathBuf {
    output.with_extension("errors.csv")
}

fn report_findings(findings: &[Finding]) {
    for finding in findings {
        warn!(rule = finding.rule(), rows = ?finding.rows(), "validation finding");
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-of-run summary and exit code.

use std::fmt::Write;

use crate::constants::{EXIT_CANCELLED, EXIT_ZONE_FAILURE};
use crate::zone::{MigrationOutcome, OutcomeStatus};

const HEADERS: [&str; 4] = ["ZONE", "STATUS", "RECORD SETS", "DETAIL"];

/// Render outcomes as a plain-text table followed by a totals line.
#[must_use]
pub fn render_summary(outcomes: &[MigrationOutcome]) -> String {
    let rows: Vec<[String; 4]> = outcomes
        .iter()
        .map(|o| {
            [
                o.zone.clone(),
                o.status.to_string(),
                o.records_written.to_string(),
                o.detail.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let header = HEADERS.map(str::to_string);
    for row in std::iter::once(&header).chain(&rows) {
        let _ = writeln!(
            out,
            "{:<w0$}  {:<w1$}  {:>w2$}  {}",
            row[0],
            row[1],
            row[2],
            row[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        );
    }

    let count = |status: OutcomeStatus| outcomes.iter().filter(|o| o.status == status).count();
    let _ = writeln!(
        out,
        "\n{} zones: {} succeeded, {} skipped, {} failed",
        outcomes.len(),
        count(OutcomeStatus::Success),
        count(OutcomeStatus::Skipped),
        count(OutcomeStatus::Failed),
    );
    out
}

/// Process exit code for a finished run.
#[must_use]
pub fn exit_code(outcomes: &[MigrationOutcome], cancelled: bool) -> i32 {
    if cancelled {
        EXIT_CANCELLED
    } else if outcomes.iter().any(MigrationOutcome::is_failure) {
        EXIT_ZONE_FAILURE
    } else {
        0
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod report_tests;

//! Plain-text statements for the command results.

use std::fmt::Write;

use fare_audit::{CompletenessReport, NameDrift, OrphanReport, SkippedFile};

pub fn completeness_statement(report: &CompletenessReport) -> String {
    let mut out = String::new();
    match (report.requests_start, report.requests_end) {
        (Some(start), Some(end)) => {
            let _ = writeln!(
                out,
                "Scrapes were recorded on {} day(s) between {} and {}, with {} gap(s) in the daily cadence.",
                report.n_requested_days, start, end, report.n_missing_days
            );
        }
        _ => {
            let _ = writeln!(out, "No scrapes recorded.");
        }
    }
    write_skipped(&mut out, &report.skipped_snapshots);
    out
}

pub fn drift_statement(drift: &NameDrift) -> String {
    if drift.is_empty() {
        return "No station code changed name.\n".to_string();
    }

    let mut out = String::new();
    for (code, names) in drift {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{}: {}", code, names.join(" | "));
    }
    out
}

pub fn orphan_statement(report: &OrphanReport) -> String {
    if report.orphans.is_empty() {
        let mut out = "Every observed origin code is in the station catalog.\n".to_string();
        write_skipped(&mut out, &report.skipped_snapshots);
        return out;
    }

    let mut out = String::new();
    let _ = writeln!(out, "{} origin code(s) missing from the station catalog:", report.orphans.len());
    for code in &report.orphans {
        let _ = writeln!(out, "{}", code);
        for row in report.samples.get(code).into_iter().flatten() {
            let _ = writeln!(
                out,
                "  train {} on {}: {} ({}) -> {} ({})",
                row.train_number,
                row.trip_date,
                row.origin_name,
                row.origin_code,
                row.destination_name,
                row.destination_code
            );
        }
        for candidate in report.suggestions.get(code).into_iter().flatten() {
            let _ = writeln!(
                out,
                "  possible match (advisory): {} {} score {:.3}",
                candidate.code, candidate.name, candidate.score
            );
        }
    }
    write_skipped(&mut out, &report.skipped_snapshots);
    out
}

fn write_skipped(out: &mut String, skipped: &[SkippedFile]) {
    for file in skipped {
        let path = file
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());
        let _ = writeln!(out, "Skipped {}: {}", path, file.reason);
    }
}

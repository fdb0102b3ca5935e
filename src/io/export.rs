//! CSV and JSON export of a finished quote.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::quote::QuoteResult;
use crate::system::generation::{DAYS_IN_MONTH, MONTH_NAMES};

/// Column header of the year-by-year audit table.
const YEAR_HEADER: &str = "year,generation_kwh,savings,maintenance,loan_payment,\
                           tax_benefit,net_flow,cumulative,discounted_flow,\
                           partial_npv,partial_irr";

/// Column header of the monthly generation table.
const MONTH_HEADER: &str = "month,days,hsp,generation_kwh";

/// Written in place of an undefined metric.
const NOT_AVAILABLE: &str = "N/A";

/// Exports the year-by-year table to a CSV file at the given path.
///
/// # Errors
///
/// Returns [`QuoteError::Io`](crate::QuoteError::Io) if the file cannot be
/// created and [`QuoteError::Csv`](crate::QuoteError::Csv) if writing fails.
pub fn export_cashflow_csv(result: &QuoteResult, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_cashflow_csv(result, io::BufWriter::new(file))
}

/// Writes the year-by-year table, year 0 first, to any writer.
///
/// Partial IRR is the IRR of the series truncated at that year and is
/// written as `N/A` where it is undefined.
///
/// # Arguments
///
/// * `result` - Finished quote
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns a CSV or I/O error if writing fails.
pub fn write_cashflow_csv(result: &QuoteResult, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(YEAR_HEADER.split(',').map(str::trim))?;

    for r in &result.years {
        wtr.write_record(&[
            r.year.to_string(),
            format!("{:.2}", r.generation_kwh),
            format!("{:.2}", r.savings),
            format!("{:.2}", r.maintenance),
            format!("{:.2}", r.loan_payment),
            format!("{:.2}", r.tax_benefit),
            format!("{:.2}", r.net_flow),
            format!("{:.2}", r.cumulative),
            format!("{:.2}", r.discounted_flow),
            format!("{:.2}", r.partial_npv),
            r.partial_irr
                .map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.6}")),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Exports the first-year monthly generation table to a CSV file.
///
/// # Errors
///
/// Returns an I/O or CSV error if file creation or writing fails.
pub fn export_monthly_csv(result: &QuoteResult, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_monthly_csv(result, io::BufWriter::new(file))
}

/// Writes one row per calendar month to any writer.
///
/// # Errors
///
/// Returns a CSV or I/O error if writing fails.
pub fn write_monthly_csv(result: &QuoteResult, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(MONTH_HEADER.split(','))?;

    for (month, name) in MONTH_NAMES.iter().enumerate() {
        let hsp = result.hsp.get(month).copied().unwrap_or(0.0);
        wtr.write_record(&[
            (*name).to_string(),
            format!("{:.2}", DAYS_IN_MONTH[month]),
            format!("{hsp:.2}"),
            format!("{:.2}", result.monthly_generation[month]),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Exports the full result record as pretty-printed JSON.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or flushed and a JSON
/// error if serialization fails.
pub fn export_json(result: &QuoteResult, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_json(result, io::BufWriter::new(file))
}

/// Writes the full result record as pretty-printed JSON to any writer.
///
/// Undefined metrics serialize as `null`.
///
/// # Errors
///
/// Returns a JSON error if serialization or writing fails.
pub fn write_json(result: &QuoteResult, mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuoteError;
    use crate::quote::QuoteEngine;
    use crate::types::tests::medellin_inputs;

    fn reference() -> QuoteResult {
        QuoteEngine::new()
            .quote(&medellin_inputs())
            .expect("reference quote")
    }

    /// Writer whose every write fails.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn render(write: impl Fn(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        write(&mut buf).ok();
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn header_matches_schema() {
        let result = reference();
        let output = render(|b| write_cashflow_csv(&result, b));
        let first_line = output.lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "year,generation_kwh,savings,maintenance,loan_payment,\
             tax_benefit,net_flow,cumulative,discounted_flow,\
             partial_npv,partial_irr"
        );
    }

    #[test]
    fn row_count_matches_horizon() {
        let result = reference();
        let output = render(|b| write_cashflow_csv(&result, b));
        // 1 header + year 0 + 25 operating years
        assert_eq!(output.lines().count(), 27);
    }

    #[test]
    fn undefined_partial_irr_is_marked() {
        let result = reference();
        let output = render(|b| write_cashflow_csv(&result, b));
        let year0 = output.lines().nth(1).unwrap_or("");
        assert!(year0.starts_with("0,"));
        assert!(year0.ends_with(",N/A"));
    }

    #[test]
    fn round_trip_parseable() {
        let result = reference();
        let mut buf = Vec::new();
        write_cashflow_csv(&result, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(11));

        let mut last_npv = None;
        for record in rdr.records() {
            let rec = record.expect("every row should parse");
            for i in 0..10 {
                assert!(rec[i].parse::<f64>().is_ok(), "column {i} should be numeric");
            }
            let irr = &rec[10];
            assert!(irr == "N/A" || irr.parse::<f64>().is_ok());
            last_npv = rec[9].parse::<f64>().ok();
        }
        let npv = last_npv.expect("at least one row");
        assert!((npv - result.metrics.npv).abs() < 0.01);
    }

    #[test]
    fn monthly_table_has_twelve_rows() {
        let result = reference();
        let output = render(|b| write_monthly_csv(&result, b));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 13);
        assert_eq!(lines[0], "month,days,hsp,generation_kwh");
        assert_eq!(lines[1], "Jan,31.00,4.55,1269.45");
        assert!(lines[2].starts_with("Feb,28.25,"));
    }

    #[test]
    fn deterministic_output() {
        let result = reference();
        let a = render(|b| write_cashflow_csv(&result, b));
        let b = render(|b| write_cashflow_csv(&result, b));
        assert_eq!(a, b);
    }

    #[test]
    fn files_are_written() {
        let result = reference();
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("cashflow.csv");
        let json_path = dir.path().join("quote.json");
        export_cashflow_csv(&result, &csv_path).expect("csv export");
        export_json(&result, &json_path).expect("json export");

        let csv = std::fs::read_to_string(&csv_path).expect("read csv");
        assert_eq!(csv.lines().count(), 27);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).expect("read json"))
                .expect("valid json");
        assert_eq!(json["panel_count"], 20);
        assert_eq!(json["inverter_plan"], "2x6kW");
        assert!(json["irr"].is_number());
        assert!(json["carbon"].is_null());
        assert_eq!(json["cash_flows"].as_array().map(Vec::len), Some(26));
    }

    #[test]
    fn json_writer_matches_file_export() {
        let result = reference();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("quote.json");
        export_json(&result, &path).expect("json export");
        let from_file = std::fs::read_to_string(&path).expect("read json");
        assert_eq!(render(|b| write_json(&result, b)), from_file);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let result = reference();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent").join("cashflow.csv");
        let err = export_cashflow_csv(&result, &path).expect_err("no parent directory");
        assert!(matches!(err, QuoteError::Io(_)), "got {err:?}");
    }

    #[test]
    fn failing_writer_surfaces_format_errors() {
        let result = reference();
        let err = write_cashflow_csv(&result, BrokenPipe).expect_err("csv write");
        assert!(matches!(err, QuoteError::Csv(_)), "got {err:?}");
        let err = write_json(&result, BrokenPipe).expect_err("json write");
        assert!(matches!(err, QuoteError::Json(_)), "got {err:?}");
    }
}

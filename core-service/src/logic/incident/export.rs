//! Incident Exporter
//!
//! Dashboard export of a session's incident log (CSV / JSON).

use std::io::Write;

use super::types::IncidentRecord;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSONL (one JSON per line)
    Jsonl,
    /// CSV for spreadsheet analysis
    Csv,
    /// Pretty JSON array
    JsonArray,
}

/// Export records to any writer. Returns number of records written.
pub fn export_incidents<'a, W, I>(
    records: I,
    writer: &mut W,
    format: ExportFormat,
) -> std::io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a IncidentRecord>,
{
    let records: Vec<&IncidentRecord> = records.into_iter().collect();

    match format {
        ExportFormat::Jsonl => {
            for record in &records {
                writeln!(writer, "{}", serde_json::to_string(record)?)?;
            }
        }
        ExportFormat::JsonArray => {
            let json = serde_json::to_string_pretty(&records)?;
            writer.write_all(json.as_bytes())?;
        }
        ExportFormat::Csv => {
            export_csv(writer, &records)?;
        }
    }

    Ok(records.len())
}

fn export_csv<W: Write>(writer: &mut W, records: &[&IncidentRecord]) -> std::io::Result<()> {
    writeln!(writer, "seq,timestamp,class,penalty,detail")?;

    for record in records {
        // Escape CSV fields
        let detail = record.detail.replace('"', "\"\"");

        writeln!(
            writer,
            "{},{},{},{},\"{}\"",
            record.seq,
            record.timestamp.to_rfc3339(),
            record.class.as_str(),
            record.penalty(),
            detail
        )?;
    }

    Ok(())
}

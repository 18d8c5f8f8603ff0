//! CSV export of server listings.

use crate::store::ServerRow;
use chrono_tz::Tz;
use std::error::Error;
use std::io::Write;

/// Column order of the export, matching the import headers.
pub const EXPORT_HEADERS: [&str; 9] = [
    "customer_number",
    "customer_name",
    "server_name",
    "ip_internal",
    "ip_wan",
    "host",
    "farm",
    "is_deleted",
    "deleted_at",
];

/// Quote a field when it holds a comma, quote or line break.
pub fn escape_csv_field(input: &str) -> String {
    if input.contains(',') || input.contains('"') || input.contains('\n') || input.contains('\r') {
        // Excel also dislikes spaces after the separator, so none are written.
        let escaped = input.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        input.to_string()
    }
}

fn write_record<W: Write>(writer: &mut W, fields: &[String]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_csv_field(f))
        .collect::<Vec<String>>()
        .join(",");
    writeln!(writer, "{line}")
}

/// Write `rows` as CSV, rendering deletion times in `tz`.
pub fn export_csv<W: Write>(rows: &[ServerRow], tz: Tz, writer: &mut W) -> Result<(), Box<dyn Error>> {
    log::info!("#Start export_csv() rows={}", rows.len());

    let headers: Vec<String> = EXPORT_HEADERS.iter().map(|h| h.to_string()).collect();
    write_record(writer, &headers)?;

    for row in rows {
        let s = &row.server;
        write_record(
            writer,
            &[
                row.customer_number.clone(),
                row.customer_name.clone(),
                s.server_name.clone(),
                s.ip_internal.clone(),
                s.ip_wan.clone(),
                s.host.clone().unwrap_or_default(),
                s.farm.clone().unwrap_or_default(),
                if s.is_deleted { "1" } else { "0" }.to_string(),
                s.deleted_at
                    .map(|t| t.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default(),
            ],
        )?;
    }
    writer.flush()?;
    Ok(())
}

// CSV export (RFC 4180 quoting, comma-delimited, UTF-8)

use crate::ExportTable;

pub fn export(table: &ExportTable) -> Result<Vec<u8>, String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&table.header).map_err(|e| e.to_string())?;
    writer.write_record(&table.row).map_err(|e| e.to_string())?;

    writer.into_inner().map_err(|e| e.to_string())
}

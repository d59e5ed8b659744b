// Excel export (xlsx only)
//
// Single worksheet "Resultados": bold header row, one data row. The document
// creation timestamp is pinned so repeated exports are byte-identical.

use std::borrow::Cow;

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, FormatAlign, Workbook as XlsxWorkbook};

use crate::{ExportTable, SHEET_NAME};

const MIN_COLUMN_WIDTH: usize = 10;
const MAX_COLUMN_WIDTH: usize = 60;

/// Longest string Excel accepts in one cell.
pub const MAX_CELL_CHARS: usize = 32_767;

pub fn export(table: &ExportTable) -> Result<Vec<u8>, String> {
    let mut xlsx_workbook = XlsxWorkbook::new();

    let created = ExcelDateTime::from_ymd(2024, 1, 1)
        .map_err(|e| format!("Failed to build document timestamp: {}", e))?;
    xlsx_workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let header_format = Format::new().set_bold();
    let value_format = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    let worksheet = xlsx_workbook
        .add_worksheet()
        .set_name(SHEET_NAME)
        .map_err(|e| format!("Failed to create sheet '{}': {}", SHEET_NAME, e))?;

    for (col, name) in table.header.iter().enumerate() {
        let col = column_index(col)?;
        worksheet
            .write_string_with_format(0, col, &*fit_cell(name), &header_format)
            .map_err(|e| format!("Failed to write header ({}): {}", col, e))?;
    }

    for (col, value) in table.row.iter().enumerate() {
        let col = column_index(col)?;
        worksheet
            .write_string_with_format(1, col, &*fit_cell(value), &value_format)
            .map_err(|e| format!("Failed to write cell (1, {}): {}", col, e))?;
    }

    for (col, (name, value)) in table.header.iter().zip(&table.row).enumerate() {
        let width = column_width(name, value);
        let col = column_index(col)?;
        worksheet
            .set_column_width(col, width as f64)
            .map_err(|e| format!("Failed to set column {} width: {}", col, e))?;
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| format!("Failed to set freeze panes: {}", e))?;

    xlsx_workbook
        .save_to_buffer()
        .map_err(|e| format!("Failed to save XLSX file: {}", e))
}

fn column_index(col: usize) -> Result<u16, String> {
    u16::try_from(col).map_err(|_| format!("Too many columns for XLSX: {}", col + 1))
}

/// Cut text that would not fit in a cell. Excel rejects anything longer.
fn fit_cell(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((cut, _)) => {
            log::warn!(
                "cell text of {} characters truncated to {}",
                text.chars().count(),
                MAX_CELL_CHARS
            );
            Cow::Owned(text[..cut].to_string())
        }
        None => Cow::Borrowed(text),
    }
}

/// Width in characters: the longest line of header or value, clamped.
fn column_width(header: &str, value: &str) -> usize {
    let longest = header
        .lines()
        .chain(value.lines())
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    (longest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use tesisview_protocol::{AnalysisResult, ObservationList};

    fn read_back(bytes: Vec<u8>) -> (Vec<String>, Vec<Vec<String>>) {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let names = workbook.sheet_names().to_vec();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let rows = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Data::String(s) => s.clone(),
                        Data::Empty => String::new(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect();
        (names, rows)
    }

    fn sample() -> ExportTable {
        let results: AnalysisResult = [("Autor", "Ana Pérez"), ("Año", "2023")].into_iter().collect();
        ExportTable::build(&results, &ObservationList::new(vec!["Falta firma del jurado".into()]))
    }

    #[test]
    fn test_xlsx_one_sheet_one_data_row() {
        let (names, rows) = read_back(export(&sample()).unwrap());
        assert_eq!(names, vec!["Resultados"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["Autor", "Año", "Observaciones"]);
        assert_eq!(rows[1], vec!["Ana Pérez", "2023", "Falta firma del jurado"]);
    }

    #[test]
    fn test_xlsx_values_kept_as_text() {
        // "2023" must stay a string, not turn into a number
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(export(&sample()).unwrap())).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get((1, 1)), Some(&Data::String("2023".to_string())));
    }

    #[test]
    fn test_xlsx_special_characters_survive() {
        let results: AnalysisResult =
            [("Resumen", "línea 1\nlínea 2"), ("Nota", "a; b, \"c\" <d> & e")].into_iter().collect();
        let table = ExportTable::build(&results, &ObservationList::default());
        let (_, rows) = read_back(export(&table).unwrap());
        assert_eq!(rows[1][0], "línea 1\nlínea 2");
        assert_eq!(rows[1][1], "a; b, \"c\" <d> & e");
        assert_eq!(rows[0][2], "Observaciones");
    }

    #[test]
    fn test_xlsx_is_deterministic() {
        let table = sample();
        assert_eq!(export(&table).unwrap(), export(&table).unwrap());
    }

    #[test]
    fn test_xlsx_overlong_value_truncated_not_rejected() {
        let results: AnalysisResult =
            [("Resumen", "x".repeat(40_000)), ("Autor", "Ana".to_string())].into_iter().collect();
        let observations = ObservationList::new(vec!["ñ".repeat(MAX_CELL_CHARS + 10)]);
        let table = ExportTable::build(&results, &observations);

        let (_, rows) = read_back(export(&table).unwrap());
        assert_eq!(rows[1][0].chars().count(), MAX_CELL_CHARS);
        assert_eq!(rows[1][1], "Ana");
        assert_eq!(rows[1][2], "ñ".repeat(MAX_CELL_CHARS));
    }

    #[test]
    fn test_fit_cell_boundary() {
        let exact = "a".repeat(MAX_CELL_CHARS);
        assert!(matches!(fit_cell(&exact), Cow::Borrowed(_)));
        let over = format!("{}é", exact);
        assert_eq!(fit_cell(&over), exact);
    }

    #[test]
    fn test_column_width_clamped() {
        assert_eq!(column_width("Año", "2023"), MIN_COLUMN_WIDTH);
        assert_eq!(column_width("Resumen", &"x".repeat(200)), MAX_COLUMN_WIDTH);
        assert_eq!(column_width("Título", "una línea\nmás larga que la otra"), 23);
    }
}

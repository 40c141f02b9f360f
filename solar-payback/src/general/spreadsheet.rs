use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use std::path::Path;

/// Read a worksheet by name, or the first worksheet when `sheet` is `None`
pub fn read_worksheet(path: &Path, sheet: Option<&str>) -> Result<Range<Data>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open Excel workbook: {}", path.display()))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .with_context(|| format!("No sheets found in {}", path.display()))?,
    };

    workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read worksheet '{}'", sheet_name))
}

/// Numeric value of a cell; text cells may use a decimal comma
pub fn cell_as_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(value) => Some(*value),
        Data::Int(value) => Some(*value as f64),
        Data::String(text) => text.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

pub fn cell_as_str(cell: &Data) -> Option<&str> {
    match cell {
        Data::String(text) => Some(text.as_str()),
        _ => None,
    }
}

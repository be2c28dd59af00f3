use csv::ReaderBuilder;

use crate::error::{MiloError, Result};

/// Header row plus data rows from one uploaded file, read-only after parse.
/// Row indices are 1-based (file line minus header) everywhere downstream so
/// errors point at the line the user sees in their spreadsheet.
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse CSV bytes. The first non-empty line is the header row; every
    /// later non-empty line becomes a data row keyed by header.
    pub fn parse(bytes: &[u8]) -> Result<RawTable> {
        let mut records = read_records(bytes)?;
        if records.is_empty() {
            return Err(MiloError::EmptyFile);
        }
        let headers: Vec<String> = records.remove(0).iter().map(|h| clean_header(h)).collect();
        let rows = records
            .into_iter()
            .map(|r| fit_to_headers(r, headers.len()))
            .collect();
        Ok(RawTable { headers, rows })
    }

    /// Parse CSV bytes that carry no header line. The caller supplies
    /// positional headers; every non-empty line is data.
    pub fn parse_headerless(bytes: &[u8], headers: Vec<String>) -> Result<RawTable> {
        let records = read_records(bytes)?;
        if records.is_empty() {
            return Err(MiloError::EmptyFile);
        }
        let rows = records
            .into_iter()
            .map(|r| fit_to_headers(r, headers.len()))
            .collect();
        Ok(RawTable { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell value for a header in the given 0-based row, None if the header
    /// does not exist. Missing trailing fields are already padded to "".
    pub fn cell(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Column values for one header across all rows, in row order.
    /// Used to sample date cells for format detection.
    pub fn column(&self, header: &str) -> Vec<&str> {
        match self.headers.iter().position(|h| h == header) {
            Some(col) => self.rows.iter().map(|r| r[col].as_str()).collect(),
            None => Vec::new(),
        }
    }
}

fn read_records(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        // Only whitespace-only lines are skipped. A line of bare separators
        // (",,") is a data row of empty fields and keeps its row number so
        // validation can report it.
        if record.len() <= 1 && record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        records.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(records)
}

fn clean_header(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|h| h.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Pad short rows with empty trailing fields; drop fields past the headers.
fn fit_to_headers(mut row: Vec<String>, width: usize) -> Vec<String> {
    row.truncate(width);
    while row.len() < width {
        row.push(String::new());
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let table = RawTable::parse(b"Date,Amount,Desc\n2024-01-02,-5.00,Coffee\n").unwrap();
        assert_eq!(table.headers(), &["Date", "Amount", "Desc"]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, "Desc"), Some("Coffee"));
    }

    #[test]
    fn test_parse_skips_empty_lines() {
        let table =
            RawTable::parse(b"\n\nDate,Amount\n\n2024-01-02,-5.00\n\n2024-01-03,9.00\n").unwrap();
        assert_eq!(table.headers(), &["Date", "Amount"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let table = RawTable::parse(b"Date,Amount,Desc\n2024-01-02,-5.00\n").unwrap();
        assert_eq!(table.cell(0, "Desc"), Some(""));
    }

    #[test]
    fn test_parse_quoted_delimiter_not_split() {
        let table =
            RawTable::parse(b"Date,Desc,Amount\n2024-01-02,\"Coffee, large\",-5.00\n").unwrap();
        assert_eq!(table.cell(0, "Desc"), Some("Coffee, large"));
        assert_eq!(table.cell(0, "Amount"), Some("-5.00"));
    }

    #[test]
    fn test_parse_keeps_separator_only_rows() {
        let table =
            RawTable::parse(b"Date,Amount\n,\n2024-01-02,-5.00\n").unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, "Date"), Some(""));
        assert_eq!(table.cell(0, "Amount"), Some(""));
        // The later row keeps its position.
        assert_eq!(table.cell(1, "Date"), Some("2024-01-02"));
    }

    #[test]
    fn test_parse_empty_file_fails() {
        assert!(matches!(RawTable::parse(b""), Err(MiloError::EmptyFile)));
        assert!(matches!(RawTable::parse(b"\n\n  \n"), Err(MiloError::EmptyFile)));
    }

    #[test]
    fn test_parse_header_only_file_has_zero_rows() {
        let table = RawTable::parse(b"Date,Amount\n").unwrap();
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_parse_headerless() {
        let headers = vec!["date".to_string(), "amount".to_string()];
        let table = RawTable::parse_headerless(b"2024-01-02,-5.00\n", headers).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, "date"), Some("2024-01-02"));
    }

    #[test]
    fn test_column_values() {
        let table =
            RawTable::parse(b"Date,Amount\n2024-01-02,-5.00\n2024-01-03,9.00\n").unwrap();
        assert_eq!(table.column("Date"), vec!["2024-01-02", "2024-01-03"]);
        assert!(table.column("Missing").is_empty());
    }

    #[test]
    fn test_unknown_header_cell_is_none() {
        let table = RawTable::parse(b"Date\n2024-01-02\n").unwrap();
        assert_eq!(table.cell(0, "Amount"), None);
    }
}

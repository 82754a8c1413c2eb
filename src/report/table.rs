//! Tabular report payloads.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;

/// One data row, keyed by header.
pub type ReportRow = BTreeMap<String, String>;

/// Parsed report: ordered headers and one map per data line.
///
/// Every row carries a value for every header; fields missing from the end of
/// a line are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    /// Parse CSV text whose first non-blank line holds the headers.
    ///
    /// Quoted fields may contain commas but never span lines. Headers and
    /// values are trimmed and blank lines are skipped; every other line is a
    /// row. Input with fewer than two non-blank lines yields an empty table.
    ///
    /// ```
    /// use adreport::report::ReportTable;
    ///
    /// let table = ReportTable::parse("a,b\n1,\"x,y\"\n").unwrap();
    /// assert_eq!(table.headers, ["a", "b"]);
    /// assert_eq!(table.rows[0]["b"], "x,y");
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let Some(header_line) = lines.next() else {
            return Ok(Self::default());
        };
        let headers: Vec<String> = parse_line(header_line)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for line in lines {
            let record = parse_line(line)?;
            let row = headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header.clone(), record.get(idx).unwrap_or("").to_string()))
                .collect();
            rows.push(row);
        }

        if rows.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at `row` for `header`, if both exist.
    pub fn value(&self, row: usize, header: &str) -> Option<&str> {
        self.rows.get(row)?.get(header).map(String::as_str)
    }

    /// All values of one column, in row order.
    pub fn column<'a>(&'a self, header: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows
            .iter()
            .filter_map(move |row| row.get(header).map(String::as_str))
    }
}

/// Split one line into fields. An unbalanced quote runs to the end of the line.
fn parse_line(line: &str) -> Result<csv::StringRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    Ok(reader.records().next().transpose()?.unwrap_or_default())
}

//! Defect table parser
//!
//! Reads CppCheck CSV exports into [`DefectRecord`]s:
//! - Header validation happens before any row is read
//! - Rows with blank required values or bad line numbers are skipped and logged
//! - Optional `Category`, `Ours`, `Baseline` columns are carried through

use crate::error::{ParseError, RowError};
use crate::types::DefectRecord;
use csv::StringRecord;
use std::io::Read;
use std::path::Path;

/// Header names every defect table must carry
pub const REQUIRED_COLUMNS: [&str; 5] = ["File", "Line", "Severity", "Id", "Summary"];

/// Physical row of the first data record (the header is row 1)
const FIRST_DATA_ROW: usize = 2;

/// Parsed table with the rows that were rejected
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    /// Valid records in input order
    pub records: Vec<DefectRecord>,
    /// Rows that were skipped, in input order
    pub skipped: Vec<RowError>,
}

/// Column positions resolved from the header
#[derive(Debug, Clone, Copy)]
struct Columns {
    file: usize,
    line: usize,
    severity: usize,
    id: usize,
    summary: usize,
    category: Option<usize>,
    ours: Option<usize>,
    baseline: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, ParseError> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| find(name).is_none())
            .map(|name| (*name).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::Schema {
                required: REQUIRED_COLUMNS.iter().map(|s| (*s).to_string()).collect(),
                missing,
            });
        }

        let required = |name: &str| {
            find(name).ok_or_else(|| ParseError::Schema {
                required: REQUIRED_COLUMNS.iter().map(|s| (*s).to_string()).collect(),
                missing: vec![name.to_string()],
            })
        };

        Ok(Self {
            file: required("File")?,
            line: required("Line")?,
            severity: required("Severity")?,
            id: required("Id")?,
            summary: required("Summary")?,
            category: find("Category"),
            ours: find("Ours"),
            baseline: find("Baseline"),
        })
    }
}

/// CppCheck CSV parser
#[derive(Debug, Clone, Copy, Default)]
pub struct DefectParser;

impl DefectParser {
    /// Create new parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse a table from disk
    ///
    /// # Errors
    /// - `ParseError::NotFound` if the file does not exist
    /// - `ParseError::Schema` if a required column is missing
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<Vec<DefectRecord>, ParseError> {
        let path = path.as_ref();
        let table = self.parse_path_detailed(path)?;
        tracing::info!(
            "Successfully parsed {} defects from {}",
            table.records.len(),
            path.display()
        );
        Ok(table.records)
    }

    /// Parse a table from disk, keeping the skipped rows
    pub fn parse_path_detailed(&self, path: impl AsRef<Path>) -> Result<ParsedTable, ParseError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ParseError::NotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_reader_detailed(file)
    }

    /// Parse a table from any reader
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<DefectRecord>, ParseError> {
        let table = self.parse_reader_detailed(reader)?;
        tracing::info!("Successfully parsed {} defects", table.records.len());
        Ok(table.records)
    }

    /// Parse a table from any reader, keeping the skipped rows
    ///
    /// Fails only on header problems; every row-level problem is logged and
    /// recorded in [`ParsedTable::skipped`].
    pub fn parse_reader_detailed<R: Read>(&self, reader: R) -> Result<ParsedTable, ParseError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = Columns::resolve(rdr.headers()?)?;
        let mut table = ParsedTable::default();

        for (idx, result) in rdr.records().enumerate() {
            let row = idx + FIRST_DATA_ROW;
            let parsed = match result {
                Ok(record) => parse_row(row, &record, &columns),
                Err(e) => Err(RowError::Malformed {
                    row,
                    message: e.to_string(),
                }),
            };

            match parsed {
                Ok(defect) => table.records.push(defect),
                Err(err) => {
                    match &err {
                        RowError::MissingFields { .. } => {
                            tracing::warn!("Skipping row {}: Missing required fields", row);
                        }
                        RowError::InvalidLine { value, .. } => {
                            tracing::error!("Invalid line number at row {}: {}", row, value);
                        }
                        RowError::Malformed { message, .. } => {
                            tracing::error!("Error processing row {}: {}", row, message);
                        }
                    }
                    table.skipped.push(err);
                }
            }
        }

        Ok(table)
    }
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).map(str::trim).unwrap_or("")
}

fn optional(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.map(|i| field(record, i))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_row(row: usize, record: &StringRecord, columns: &Columns) -> Result<DefectRecord, RowError> {
    let file = field(record, columns.file);
    let line = field(record, columns.line);
    let severity = field(record, columns.severity);
    let id = field(record, columns.id);
    let summary = field(record, columns.summary);

    let missing: Vec<String> = [
        ("File", file),
        ("Line", line),
        ("Severity", severity),
        ("Id", id),
        ("Summary", summary),
    ]
    .iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| (*name).to_string())
    .collect();
    if !missing.is_empty() {
        return Err(RowError::MissingFields {
            row,
            fields: missing,
        });
    }

    let line_num = parse_line(line).ok_or_else(|| RowError::InvalidLine {
        row,
        value: line.to_string(),
    })?;

    Ok(DefectRecord {
        file: file.to_string(),
        line: line_num,
        severity: severity.to_string(),
        id: id.to_string(),
        summary: summary.to_string(),
        row_number: row,
        category: optional(record, columns.category),
        ours: optional(record, columns.ours),
        baseline: optional(record, columns.baseline),
    })
}

/// Positive line number, or `None`
fn parse_line(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "File,Line,Severity,Id,Category,Ours,Baseline,Summary\n";

    fn parse(body: &str) -> ParsedTable {
        let input = format!("{HEADER}{body}");
        DefectParser::new()
            .parse_reader_detailed(input.as_bytes())
            .unwrap()
    }

    #[test]
    fn parses_valid_rows_in_order() {
        let table = parse(
            "a.c,10,error,nullPointer,bug,bug,,Null deref\n\
             b.c,20,style,unusedVariable,,,,Unused\n",
        );

        assert_eq!(table.records.len(), 2);
        assert!(table.skipped.is_empty());

        let first = &table.records[0];
        assert_eq!(first.file, "a.c");
        assert_eq!(first.line, 10);
        assert_eq!(first.row_number, 2);
        assert_eq!(first.category.as_deref(), Some("bug"));
        assert_eq!(first.ours.as_deref(), Some("bug"));
        assert_eq!(first.baseline, None);

        assert_eq!(table.records[1].row_number, 3);
        assert_eq!(table.records[1].category, None);
    }

    #[test]
    fn trims_values() {
        let table = parse("  a.c , 7 , warning ,  id1 ,,,,  text  \n");
        let d = &table.records[0];
        assert_eq!(d.file, "a.c");
        assert_eq!(d.line, 7);
        assert_eq!(d.severity, "warning");
        assert_eq!(d.summary, "text");
    }

    #[test]
    fn skips_rows_missing_required_values() {
        let table = parse(
            "a.c,10,error,nullPointer,,,,Null deref\n\
             ,11,error,nullPointer,,,,Null deref\n\
             c.c,12,error,nullPointer,,,,   \n",
        );

        assert_eq!(table.records.len(), 1);
        assert_eq!(table.skipped.len(), 2);
        assert!(matches!(
            &table.skipped[0],
            RowError::MissingFields { row: 3, fields } if fields == &vec!["File".to_string()]
        ));
        assert!(matches!(&table.skipped[1], RowError::MissingFields { row: 4, .. }));
    }

    #[test]
    fn skips_bad_line_numbers_and_keeps_going() {
        let table = parse(
            "a.c,0,error,x,,,,s\n\
             a.c,-4,error,x,,,,s\n\
             a.c,abc,error,x,,,,s\n\
             a.c,1.5,error,x,,,,s\n\
             a.c,5,error,x,,,,s\n",
        );

        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].row_number, 6);
        assert_eq!(table.skipped.len(), 4);
        assert!(table
            .skipped
            .iter()
            .all(|e| matches!(e, RowError::InvalidLine { .. })));
    }

    #[test]
    fn short_rows_are_treated_as_missing_fields() {
        let table = parse("a.c,10\n");
        assert!(table.records.is_empty());
        assert!(matches!(&table.skipped[0], RowError::MissingFields { .. }));
    }

    #[test]
    fn missing_column_is_schema_error() {
        let input = "File,Line,Severity,Summary\na.c,1,error,s\n";
        let err = DefectParser::new().parse_reader(input.as_bytes()).unwrap_err();

        match err {
            ParseError::Schema { missing, .. } => assert_eq!(missing, vec!["Id".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn column_names_are_case_sensitive() {
        let input = "file,line,severity,id,summary\na.c,1,error,x,s\n";
        let err = DefectParser::new().parse_reader(input.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Schema { .. }));
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let input = "Summary,Id,Severity,Line,File\ns,x,error,3,a.c\n";
        let records = DefectParser::new().parse_reader(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file, "a.c");
        assert_eq!(records[0].ours, None);
    }

    #[test]
    fn quoted_fields_with_commas() {
        let table = parse("\"C:\\\\x\\\\a.c\",100,error,nullPointer,bug,,,\"Possible null, maybe\"\n");
        assert_eq!(table.records[0].summary, "Possible null, maybe");
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = DefectParser::new()
            .parse_path("/definitely/not/here.csv")
            .unwrap_err();
        assert!(matches!(err, ParseError::NotFound(_)));
    }
}

//! CSV loader with encoding detection and one-shot type inference.
//!
//! Produces a typed [`Table`]. Each column is tagged Numeric, Timestamp
//! or Other while loading; nothing downstream re-inspects cell text.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{LoadError, LoadResult};
use crate::models::{Column, ColumnData, Table};

/// Cell texts read as missing values.
const MISSING_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Naive layouts tried after RFC 3339.
const TIMESTAMP_LAYOUTS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Options for loading a table.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter; `None` detects it from the header line.
    pub delimiter: Option<char>,

    /// Detect the text encoding instead of assuming UTF-8.
    pub detect_encoding: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: Some(','),
            detect_encoding: true,
        }
    }
}

/// Result of loading with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Loaded table
    pub table: Table,
    /// Detected or assumed encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Ties and lines without any candidate resolve to a comma.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Whether a raw cell denotes a missing value.
pub fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_TOKENS.contains(&cell)
}

/// Parse a calendar timestamp.
///
/// Accepts RFC 3339 (normalised to UTC), `YYYY-MM-DD HH:MM:SS[.f]`,
/// the same with a `T` separator, and bare dates.
pub fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.naive_utc());
    }
    for layout in TIMESTAMP_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cell, layout) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Load a CSV file.
///
/// # Example
/// ```ignore
/// let result = parse_csv_file("joints.csv", &LoadOptions::default())?;
/// println!("{} rows, delimiter '{}'", result.table.len(), result.delimiter);
/// ```
pub fn parse_csv_file<P: AsRef<Path>>(path: P, options: &LoadOptions) -> LoadResult<ParseResult> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_bytes(&bytes, options)
}

/// Load CSV bytes.
pub fn parse_bytes(bytes: &[u8], options: &LoadOptions) -> LoadResult<ParseResult> {
    let encoding = if options.detect_encoding {
        detect_encoding(bytes)
    } else {
        "utf-8".to_string()
    };
    let content = decode_content(bytes, &encoding);

    let delimiter = options
        .delimiter
        .unwrap_or_else(|| detect_delimiter(&content));

    let table = parse_str(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Parse CSV text with an explicit delimiter.
///
/// The first record is the header. Blank lines are skipped, every other
/// record must have as many fields as the header.
pub fn parse_str(content: &str, delimiter: char) -> LoadResult<Table> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }
    if !delimiter.is_ascii() {
        return Err(LoadError::InvalidDelimiter(delimiter));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(LoadError::NoHeaders);
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    let mut record = StringRecord::new();

    while reader.read_record(&mut record).map_err(csv_error)? {
        for (column, raw) in cells.iter_mut().zip(record.iter()) {
            column.push((!is_missing(raw)).then(|| raw.to_string()));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column::new(name, infer_column(raw)))
        .collect();

    Ok(Table::from_columns(columns)?)
}

/// Pick the narrowest type every present cell fits: Numeric, then
/// Timestamp, else Other.
///
/// Numbers that do not fit a finite `f64` (`inf`, `Infinity`, `1e500`)
/// count as missing in a numeric column.
fn infer_column(raw: Vec<Option<String>>) -> ColumnData {
    let numeric: Option<Vec<Option<f64>>> = raw
        .iter()
        .map(|cell| match cell {
            Some(s) => s.parse::<f64>().ok().map(|v| v.is_finite().then_some(v)),
            None => Some(None),
        })
        .collect();
    if let Some(values) = numeric {
        return ColumnData::Numeric(values);
    }

    let timestamps: Option<Vec<Option<NaiveDateTime>>> = raw
        .iter()
        .map(|cell| match cell {
            Some(s) => parse_timestamp(s).map(Some),
            None => Some(None),
        })
        .collect();
    if let Some(values) = timestamps {
        return ColumnData::Timestamp(values);
    }

    ColumnData::Other(raw)
}

fn csv_error(err: csv::Error) -> LoadError {
    LoadError::Parse {
        line: err.position().map_or(0, |p| p.line()),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnKind;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("timestamp,joint_1\n0.0,1.5\n0.1,2.5", ',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names(), vec!["timestamp", "joint_1"]);
        assert_eq!(
            table.column("joint_1").unwrap().as_numeric().unwrap(),
            &[Some(1.5), Some(2.5)]
        );
    }

    #[test]
    fn test_type_inference() {
        let csv = "timestamp,joint_1,mode,when\n\
                   0.0,1,idle,2024-01-01 00:00:00\n\
                   0.1,2,run,2024-01-01 00:00:00.100";
        let table = parse_str(csv, ',').unwrap();

        let kinds: Vec<ColumnKind> = table.columns().iter().map(Column::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Numeric,
                ColumnKind::Numeric,
                ColumnKind::Other,
                ColumnKind::Timestamp
            ]
        );
    }

    #[test]
    fn test_missing_values() {
        let csv = "a,b,c\n1,,3\nNaN,2,NA";
        let table = parse_str(csv, ',').unwrap();

        assert_eq!(table.column("a").unwrap().as_numeric().unwrap(), &[Some(1.0), None]);
        assert_eq!(table.column("b").unwrap().as_numeric().unwrap(), &[None, Some(2.0)]);
        assert_eq!(table.column("c").unwrap().as_numeric().unwrap(), &[Some(3.0), None]);
    }

    #[test]
    fn test_non_finite_numbers_are_missing() {
        let csv = "timestamp,q,r\n0,1,inf\n0.05,-inf,Infinity\n0.1,2,1e500";
        let table = parse_str(csv, ',').unwrap();

        let q = table.column("q").unwrap();
        assert_eq!(q.kind(), ColumnKind::Numeric);
        assert_eq!(q.as_numeric().unwrap(), &[Some(1.0), None, Some(2.0)]);
        assert_eq!(table.column("r").unwrap().data().present_count(), 0);
    }

    #[test]
    fn test_all_missing_column_is_numeric() {
        let table = parse_str("a,b\n1,\n2,", ',').unwrap();
        assert_eq!(table.column("b").unwrap().kind(), ColumnKind::Numeric);
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name,value\n\"arm, left\",\"1.5\"";
        let table = parse_str(csv, ',').unwrap();

        assert_eq!(table.column("name").unwrap().data().render(0), "arm, left");
        assert_eq!(table.column("value").unwrap().kind(), ColumnKind::Numeric);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_str("a,b\n1,2\n\n3,4\n", ',').unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_ragged_row_error_has_line() {
        let err = parse_str("a,b\n1,2\n3,4,5", ',').unwrap_err();
        match err {
            LoadError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ','), Err(LoadError::EmptyFile)));
        assert!(matches!(parse_str("  \n", ','), Err(LoadError::EmptyFile)));
    }

    #[test]
    fn test_duplicate_header_error() {
        assert!(matches!(parse_str("a,a\n1,2", ','), Err(LoadError::Schema(_))));
    }

    #[test]
    fn test_header_only() {
        let table = parse_str("timestamp,joint_1\n", ',').unwrap();
        assert!(table.is_empty());
        assert_eq!(table.width(), 2);
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let options = LoadOptions {
            delimiter: None,
            ..LoadOptions::default()
        };
        let result = parse_bytes(b"timestamp;joint_1\n0;1\n1;2", &options).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.table.len(), 2);
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_milli_opt(7, 8, 9, 500)
            .unwrap();
        assert_eq!(parse_timestamp("2024-05-06 07:08:09.5"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-06T07:08:09.500"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-06T09:08:09.5+02:00"), Some(expected));
        assert!(parse_timestamp("2024-05-06").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_latin1_decoding() {
        // "Épaule" in ISO-8859-1
        let bytes: &[u8] = &[0xC9, 0x70, 0x61, 0x75, 0x6C, 0x65];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Épaule");
    }

    #[test]
    fn test_missing_file() {
        let err = parse_csv_file("/definitely/not/here.csv", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}

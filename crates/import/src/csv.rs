use serde::{Deserialize, Serialize};
use sortbook_core::{Amount, DecimalSeparator, Transaction};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Bank exports open with a banner of this many lines before the header.
pub const DEFAULT_HEADER_ROWS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvImportProfile {
    /// Lines to discard before the header record.
    pub header_rows: usize,
    pub delimiter: String,
    pub decimal_separator: DecimalSeparator,
}

impl Default for CsvImportProfile {
    fn default() -> Self {
        Self {
            header_rows: DEFAULT_HEADER_ROWS,
            delimiter: ",".to_string(),
            decimal_separator: DecimalSeparator::Auto,
        }
    }
}

impl CsvImportProfile {
    pub(crate) fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }
}

/// Positions of the columns we read, found by header name. An exact name
/// wins; otherwise the first header whose last word is the name, so
/// `Accounting date` serves as the date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumnMapping {
    pub date_column: usize,
    pub description_column: usize,
    pub amount_column: usize,
    /// Present in some exports; its contents are always discarded.
    pub category_column: Option<usize>,
}

impl CsvColumnMapping {
    pub fn from_headers(headers: &csv::StringRecord) -> Result<Self, ImportError> {
        let find = |name: &str| {
            let last_word = |h: &str| {
                h.split_whitespace()
                    .next_back()
                    .is_some_and(|word| word.eq_ignore_ascii_case(name))
            };
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .or_else(|| headers.iter().position(last_word))
        };
        Ok(Self {
            date_column: find("date").ok_or(ImportError::MissingColumn("Date"))?,
            description_column: find("description")
                .ok_or(ImportError::MissingColumn("Description"))?,
            amount_column: find("amount").ok_or(ImportError::MissingColumn("Amount"))?,
            category_column: find("category"),
        })
    }

    fn parse_record(&self, record: &csv::StringRecord, separator: DecimalSeparator) -> Transaction {
        let field = |col: usize| record.get(col).unwrap_or_default();
        Transaction::new(
            field(self.date_column).trim(),
            field(self.description_column).trim(),
            Amount::parse_with(field(self.amount_column), separator),
        )
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("No header row after skipping {0} banner lines")]
    NoHeader(usize),
}

pub struct CsvImporter;

impl CsvImporter {
    pub fn parse_profile<R: Read>(
        reader: &mut csv::Reader<R>,
        profile: &CsvImportProfile,
    ) -> Result<Vec<Transaction>, ImportError> {
        let headers = reader.headers()?.clone();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ImportError::NoHeader(profile.header_rows));
        }
        let mapping = CsvColumnMapping::from_headers(&headers)?;

        let mut transactions = Vec::new();
        for result in reader.records() {
            let record = result?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            transactions.push(mapping.parse_record(&record, profile.decimal_separator));
        }

        Ok(transactions)
    }

    pub fn detect_columns<R: Read>(
        reader: &mut csv::Reader<R>,
    ) -> Result<Vec<String>, ImportError> {
        Ok(reader.headers()?.iter().map(|s| s.trim().to_string()).collect())
    }
}

fn skip_lines<R: BufRead>(input: &mut R, count: usize) -> Result<(), ImportError> {
    let mut line = Vec::new();
    for _ in 0..count {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            break;
        }
    }
    Ok(())
}

fn open_reader<R: Read>(
    data: R,
    profile: &CsvImportProfile,
) -> Result<csv::Reader<BufReader<R>>, ImportError> {
    let mut input = BufReader::new(data);
    skip_lines(&mut input, profile.header_rows)?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(profile.delimiter_byte())
        .from_reader(input))
}

/// Reads the rows of an export. Every transaction comes back uncategorized.
pub fn import_csv<R: Read>(
    data: R,
    profile: &CsvImportProfile,
) -> Result<Vec<Transaction>, ImportError> {
    let mut reader = open_reader(data, profile)?;
    CsvImporter::parse_profile(&mut reader, profile)
}

pub fn import_file(
    path: &Path,
    profile: &CsvImportProfile,
) -> Result<Vec<Transaction>, ImportError> {
    let file = File::open(path)?;
    import_csv(file, profile)
}

/// Header names as they appear after the banner, for diagnostics.
pub fn detect_columns<R: Read>(
    data: R,
    profile: &CsvImportProfile,
) -> Result<Vec<String>, ImportError> {
    let mut reader = open_reader(data, profile)?;
    CsvImporter::detect_columns(&mut reader)
}

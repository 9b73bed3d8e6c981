use sortbook_core::{Amount, DecimalSeparator, Transaction};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::csv::CsvImportProfile;

pub const EXPORT_HEADERS: [&str; 4] = ["Date", "Description", "Amount", "Category"];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Writes rows in the order given, behind the same number of banner lines the
/// profile skips on import, so an export can be loaded back unchanged.
pub fn export_csv<'a, W, I>(
    mut out: W,
    transactions: I,
    profile: &CsvImportProfile,
) -> Result<usize, ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a Transaction>,
{
    for _ in 0..profile.header_rows {
        out.write_all(b"\n")?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(profile.delimiter_byte())
        .from_writer(out);
    writer.write_record(EXPORT_HEADERS)?;

    let mut written = 0;
    for tx in transactions {
        let amount = format_amount(&tx.amount, profile.decimal_separator);
        writer.write_record([
            tx.date.as_str(),
            tx.description.as_str(),
            amount.as_str(),
            tx.category.as_str(),
        ])?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// A comma profile gets comma decimals back, so the file re-imports as-is.
fn format_amount(amount: &Amount, separator: DecimalSeparator) -> String {
    match (amount, separator) {
        (Amount::Value(money), DecimalSeparator::Comma) => {
            money.as_decimal().to_string().replace('.', ",")
        }
        (amount, _) => amount.to_string(),
    }
}

pub fn export_file<'a, I>(
    path: &Path,
    transactions: I,
    profile: &CsvImportProfile,
) -> Result<usize, ExportError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let file = File::create(path)?;
    export_csv(BufWriter::new(file), transactions, profile)
}

pub mod csv;
pub mod export;

pub use self::csv::{
    detect_columns, import_csv, import_file, CsvColumnMapping, CsvImportProfile, CsvImporter,
    ImportError, DEFAULT_HEADER_ROWS,
};
pub use export::{export_csv, export_file, ExportError, EXPORT_HEADERS};

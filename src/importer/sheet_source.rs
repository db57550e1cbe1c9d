// ==========================================
// Roster import - sheet sources
// ==========================================
// Workbook (.xlsx/.xlsm/.xlsb/.xls/.ods) via calamine
// CSV directory (<dir>/<sheet>.csv) via csv
// In-memory rows for tests and embedding
// ==========================================
// Rows carry spreadsheet row numbers (header = row 1);
// blank rows are dropped.
// ==========================================

use crate::config::{SourceConfig, SourceKind};
use crate::importer::error::{SourceError, SourceResult};
use crate::importer::row::{CellValue, SheetRow};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use csv::ReaderBuilder;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Per-sheet row reader
pub trait SheetSource {
    /// Human-readable location for logs and errors
    fn describe(&self) -> String;

    fn sheet_names(&self) -> SourceResult<Vec<String>>;

    /// Ordered, non-blank data rows of one sheet
    ///
    /// # Errors
    /// - `SheetMissing` when the sheet does not exist
    fn read_sheet(&mut self, name: &str) -> SourceResult<Vec<SheetRow>>;

    fn has_sheet(&self, name: &str) -> SourceResult<bool> {
        Ok(self.sheet_names()?.iter().any(|s| s == name))
    }

    /// Non-empty header cells of one sheet, in sheet order
    ///
    /// Sources without a header line report the columns seen in any row, sorted.
    fn sheet_headers(&mut self, name: &str) -> SourceResult<Vec<String>> {
        let rows = self.read_sheet(name)?;
        let headers: BTreeSet<String> = rows
            .iter()
            .flat_map(|row| row.columns().map(str::to_string))
            .collect();
        Ok(headers.into_iter().collect())
    }
}

/// Open the source described by the configuration
pub fn open_source(config: &SourceConfig) -> SourceResult<Box<dyn SheetSource>> {
    match config.kind {
        SourceKind::Workbook => Ok(Box::new(WorkbookSource::open(&config.path)?)),
        SourceKind::CsvDir => Ok(Box::new(CsvDirectorySource::open(&config.path)?)),
    }
}

// ==========================================
// WorkbookSource
// ==========================================
pub struct WorkbookSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    pub fn open<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            return Err(SourceError::UnsupportedFormat(ext));
        }

        let workbook = open_workbook_auto(path).map_err(|e| SourceError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "workbook opened");

        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl WorkbookSource {
    fn range(&mut self, name: &str) -> SourceResult<calamine::Range<Data>> {
        if !self.has_sheet(name)? {
            return Err(SourceError::SheetMissing {
                sheet: name.to_string(),
            });
        }
        Ok(self.workbook.worksheet_range(name)?)
    }
}

impl SheetSource for WorkbookSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn sheet_names(&self) -> SourceResult<Vec<String>> {
        Ok(self.workbook.sheet_names())
    }

    fn sheet_headers(&mut self, name: &str) -> SourceResult<Vec<String>> {
        let range = self.range(name)?;
        let headers = range
            .rows()
            .next()
            .map(|header| header.iter().map(header_text).collect::<Vec<_>>())
            .unwrap_or_default();
        Ok(headers.into_iter().filter(|h| !h.is_empty()).collect())
    }

    fn read_sheet(&mut self, name: &str) -> SourceResult<Vec<SheetRow>> {
        let range = self.range(name)?;
        // ranges may start below row 1 when the top rows are empty
        let header_row_number = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(header_text).collect(),
            None => return Ok(Vec::new()),
        };

        let mut out = Vec::new();
        for (idx, data_row) in rows.enumerate() {
            let mut row = SheetRow::new(header_row_number + idx + 1);
            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    if !header.is_empty() {
                        row.insert(header.clone(), cell_value(cell));
                    }
                }
            }
            if !row.is_blank() {
                out.push(row);
            }
        }

        debug!(sheet = name, rows = out.len(), "sheet read");
        Ok(out)
    }
}

fn header_text(cell: &Data) -> String {
    cell.to_string().trim().to_string()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    }
}

// ==========================================
// CsvDirectorySource
// ==========================================
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn open<P: AsRef<Path>>(dir: P) -> SourceResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(SourceError::NotFound(dir.to_path_buf()));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }

    /// Reader positioned after the header line, plus the cleaned headers
    fn open_reader(&self, name: &str) -> SourceResult<(csv::Reader<File>, Vec<String>)> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            return Err(SourceError::SheetMissing {
                sheet: name.to_string(),
            });
        }

        let file = File::open(&path).map_err(|e| SourceError::Unreadable {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        Ok((reader, headers))
    }
}

impl SheetSource for CsvDirectorySource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn sheet_names(&self) -> SourceResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| SourceError::Unreadable {
            path: self.dir.clone(),
            message: e.to_string(),
        })?;

        let mut names = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn has_sheet(&self, name: &str) -> SourceResult<bool> {
        Ok(self.sheet_path(name).is_file())
    }

    fn sheet_headers(&mut self, name: &str) -> SourceResult<Vec<String>> {
        let (_, headers) = self.open_reader(name)?;
        Ok(headers.into_iter().filter(|h| !h.is_empty()).collect())
    }

    fn read_sheet(&mut self, name: &str) -> SourceResult<Vec<SheetRow>> {
        let (mut reader, headers) = self.open_reader(name)?;

        let mut out = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            // the csv reader skips empty lines, so take the line from the record itself
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);

            let mut row = SheetRow::new(row_number);
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    if header.is_empty() {
                        continue;
                    }
                    let cell = if value.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(value.to_string())
                    };
                    row.insert(header.clone(), cell);
                }
            }
            if !row.is_blank() {
                out.push(row);
            }
        }

        debug!(sheet = name, rows = out.len(), "csv sheet read");
        Ok(out)
    }
}

// ==========================================
// MemorySource
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: Vec<(String, Vec<SheetRow>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a sheet; blank rows are dropped
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<SheetRow>) -> Self {
        let name = name.into();
        let rows: Vec<SheetRow> = rows.into_iter().filter(|r| !r.is_blank()).collect();
        match self.sheets.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = rows,
            None => self.sheets.push((name, rows)),
        }
        self
    }
}

impl SheetSource for MemorySource {
    fn describe(&self) -> String {
        format!("<memory: {} sheets>", self.sheets.len())
    }

    fn sheet_names(&self) -> SourceResult<Vec<String>> {
        Ok(self.sheets.iter().map(|(n, _)| n.clone()).collect())
    }

    fn read_sheet(&mut self, name: &str) -> SourceResult<Vec<SheetRow>> {
        self.sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| SourceError::SheetMissing {
                sheet: name.to_string(),
            })
    }
}

// ==========================================
// Roster import - importer layer
// ==========================================
// sheet source → typed rows → entity converters → record store
// ==========================================

pub mod code_list;
pub mod converters;
pub mod duplicates;
pub mod error;
pub mod inspect;
pub mod pipeline;
pub mod row;
pub mod sheet_source;

pub use converters::{converter_for, ConversionContext, EntityConverter, RowOutcome};
pub use error::{ImportError, ImportResult, SourceError, SourceResult};
pub use inspect::{inspect_source, SheetInspection, SourceInspection};
pub use pipeline::{execution_order, ImportPipeline};
pub use row::{CellValue, SheetRow};
pub use sheet_source::{open_source, CsvDirectorySource, MemorySource, SheetSource, WorkbookSource};

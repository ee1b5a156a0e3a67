pub mod csv;
pub mod sqlite;

pub use self::csv::{CsvSummary, write_dataset_csv};
pub use self::sqlite::{ColumnDefinition, ForeignKey, SqliteMaterializer, TableDefinition, TableLoad};

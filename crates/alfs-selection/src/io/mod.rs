pub mod results;
pub mod table_reader;

pub use results::{CsvResultSink, ResultSink};
pub use table_reader::TableLayout;

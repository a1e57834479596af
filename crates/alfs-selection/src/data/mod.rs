pub mod dataset;
pub mod labels;

pub use dataset::{DatasetReader, FeatureMatrix, ObservationRow, ObservationTable, TableDataset};
pub use labels::LabelEncoding;

//! Pipeline module - the ingestion, validation and transformation stages

pub mod artifact;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod loader;
pub mod resample;
pub mod schema;
pub mod store;
pub mod target;
pub mod training;
pub mod transform;
pub mod transformation;
pub mod validation;

pub use artifact::*;
pub use config::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, RunContext,
    SplitStrategy,
};
pub use error::{PipelineError, Result, Stage};
pub use ingestion::{test_row_count, train_test_split, DataIngestion};
pub use loader::{column_names, read_table, write_table};
pub use resample::{ResampleError, ResampleReport, SmoteEnn};
pub use schema::{ColumnGroup, ColumnKind, DerivedAge, Schema, SchemaError};
pub use store::{CollectionExporter, Document, DocumentStore, JsonDocumentStore, MemoryStore};
pub use target::{analyze_target_column, encode_target, TargetEncoding, TargetValueMapping};
pub use training::{PipelineOutcome, PipelineSettings, TrainingPipeline};
pub use transform::{FittedPreprocessor, Preprocessor, TransformError, UnknownCategory};
pub use transformation::{DataTransformation, TransformationStats};
pub use validation::{Check, CheckOutcome, DataValidation, Split, ValidationReport};

//! visaprep: data preparation for visa approval models
//!
//! Exports case records from a document store, validates the train/test
//! splits against a column schema, and turns them into resampled numeric
//! arrays plus a persisted preprocessing object.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;

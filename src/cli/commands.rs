//! Subcommand handlers

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use super::args::RunArgs;
use crate::pipeline::{
    ColumnGroup, FittedPreprocessor, JsonDocumentStore, RunContext, Schema, TargetValueMapping,
    TrainingPipeline,
};
use crate::report::PipelineSummary;
use crate::utils::{
    create_spinner, finish_with_failure, finish_with_success, load_numpy_array, print_banner,
    print_completion, print_config, print_failure, print_info, print_step_header,
    print_step_time, print_success,
};

/// `visaprep run`
pub fn run_pipeline(args: &RunArgs) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));

    let store = JsonDocumentStore::connect(&args.store)
        .with_context(|| format!("Failed to open document store at {}", args.store.display()))?;
    let ctx = RunContext::new(&args.artifact_root);
    let settings = args.settings();
    let pipeline = TrainingPipeline::new(ctx, settings, &store)
        .with_context(|| format!("Failed to load schema {}", args.schema.display()))?;

    print_config(
        &args.store.display().to_string(),
        &format!("{}.{}", args.database, args.collection),
        pipeline.schema().target_column(),
        &pipeline.context().artifact_dir,
        args.test_size,
    );

    print_step_header(1, "Data Ingestion");
    let step_start = Instant::now();
    let spinner = create_spinner("Exporting collection and splitting train/test...");
    let ingestion = match pipeline.start_data_ingestion() {
        Ok(artifact) => {
            finish_with_success(&spinner, "Train and test splits written");
            artifact
        }
        Err(e) => {
            finish_with_failure(&spinner, "Ingestion failed");
            return Err(e.into());
        }
    };
    print_info(&format!("Train: {}", ingestion.train_file_path.display()));
    print_info(&format!("Test:  {}", ingestion.test_file_path.display()));
    print_step_time(step_start.elapsed());

    print_step_header(2, "Data Validation");
    let step_start = Instant::now();
    let validation = pipeline.start_data_validation(&ingestion)?;
    if validation.validation_status {
        print_success("All column checks passed");
    } else {
        print_failure(&validation.message);
    }
    print_step_time(step_start.elapsed());

    print_step_header(3, "Data Transformation");
    let step_start = Instant::now();
    let spinner = create_spinner("Fitting preprocessor and resampling training data...");
    let (transformation, stats) = match pipeline.start_data_transformation(&ingestion, &validation) {
        Ok(result) => {
            finish_with_success(&spinner, "Arrays and preprocessor saved");
            result
        }
        Err(e) => {
            finish_with_failure(&spinner, "Transformation failed");
            return Err(e.into());
        }
    };
    print_step_time(step_start.elapsed());

    let outcome = pipeline.finish(ingestion, validation, transformation, stats)?;
    if let Some(path) = &outcome.report_path {
        print_info(&format!("Run report: {}", path.display()));
    }

    PipelineSummary::from_outcome(&outcome, &TargetValueMapping::default()).display();
    print_completion(&pipeline.context().artifact_dir);
    Ok(())
}

/// `visaprep check-schema`
pub fn check_schema(path: &Path) -> Result<()> {
    let schema = Schema::from_yaml_file(path)
        .with_context(|| format!("Schema {} is invalid", path.display()))?;

    print_success(&format!(
        "{} is valid: {} columns, target '{}'",
        path.display(),
        schema.expected_column_count(),
        schema.target_column()
    ));
    for group in ColumnGroup::ALL {
        println!(
            "      {:<18} {}",
            style(group).cyan(),
            schema.group(group).join(", ")
        );
    }
    println!(
        "      {:<18} {}",
        style("drop_columns").cyan(),
        schema.drop_columns().join(", ")
    );
    for derived in schema.derived_columns() {
        println!(
            "      {:<18} {} = reference year - {}",
            style("derived").cyan(),
            derived.name,
            derived.age_of
        );
    }
    Ok(())
}

/// `visaprep inspect`
pub fn inspect(path: &Path) -> Result<()> {
    let is_npy = path.extension().is_some_and(|e| e == "npy");
    if is_npy {
        let array = load_numpy_array(path)
            .with_context(|| format!("Failed to read array {}", path.display()))?;
        println!("shape: ({}, {})", array.nrows(), array.ncols());
        return Ok(());
    }

    let fitted = FittedPreprocessor::load(path)
        .with_context(|| format!("Failed to read preprocessor {}", path.display()))?;
    println!("output features: {}", fitted.n_features_out());
    for transformer in fitted.transformers() {
        println!(
            "  {:<18} {:<24} -> {}",
            transformer.group().to_string(),
            transformer.column(),
            transformer.feature_names().join(", ")
        );
    }
    Ok(())
}

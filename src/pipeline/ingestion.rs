//! Ingestion stage: export, feature store, train/test split

use std::collections::BTreeMap;

use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::artifact::DataIngestionArtifact;
use super::config::{DataIngestionConfig, SplitStrategy};
use super::error::{PipelineError, Result};
use super::loader::write_table;
use super::store::{CollectionExporter, DocumentStore};

pub struct DataIngestion<'a> {
    config: DataIngestionConfig,
    exporter: CollectionExporter<'a>,
}

impl<'a> DataIngestion<'a> {
    pub fn new(
        config: DataIngestionConfig,
        store: &'a dyn DocumentStore,
        database: impl Into<String>,
    ) -> Self {
        Self {
            config,
            exporter: CollectionExporter::new(store, database),
        }
    }

    pub fn config(&self) -> &DataIngestionConfig {
        &self.config
    }

    /// Export the configured collection and snapshot it to the feature store.
    ///
    /// The feature-store file has no header row.
    pub fn export_to_feature_store(&self) -> Result<DataFrame> {
        let mut df = self
            .exporter
            .export_collection(&self.config.collection_name)?;
        tracing::info!(rows = df.height(), columns = df.width(), "shape of exported frame");

        let path = &self.config.feature_store_file_path;
        tracing::info!(path = %path.display(), "saving exported data into feature store");
        write_table(&mut df, path, false)?;
        Ok(df)
    }

    /// Split `df` and write both halves, with header, to their configured paths.
    pub fn split_train_test(&self, df: &DataFrame) -> Result<()> {
        let (mut train, mut test) = train_test_split(
            df,
            self.config.test_size,
            self.config.split_seed,
            &self.config.split_strategy,
        )?;
        tracing::info!(
            train_rows = train.height(),
            test_rows = test.height(),
            "performed train-test split"
        );

        write_table(&mut train, &self.config.training_file_path, true)?;
        write_table(&mut test, &self.config.testing_file_path, true)?;
        tracing::info!("exported train and test files");
        Ok(())
    }

    pub fn run(&self) -> Result<DataIngestionArtifact> {
        tracing::info!(collection = %self.config.collection_name, "entered data ingestion");

        let df = self.export_to_feature_store()?;
        self.split_train_test(&df)?;

        let artifact = DataIngestionArtifact {
            train_file_path: self.config.training_file_path.clone(),
            test_file_path: self.config.testing_file_path.clone(),
        };
        tracing::info!(?artifact, "exited data ingestion");
        Ok(artifact)
    }
}

/// Number of rows held out for testing: `ceil(test_size * n)`.
pub fn test_row_count(n_rows: usize, test_size: f64) -> usize {
    // Guard against products like 0.3 * 10 landing a hair above an integer.
    ((test_size * n_rows as f64) - 1e-9).ceil().max(0.0) as usize
}

/// Seeded random partition of `df` into `(train, test)`.
///
/// Both halves keep the column order of `df`; row order follows the shuffle.
pub fn train_test_split(
    df: &DataFrame,
    test_size: f64,
    seed: u64,
    strategy: &SplitStrategy,
) -> Result<(DataFrame, DataFrame)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::Config(format!(
            "test size must lie strictly between 0 and 1, got {}",
            test_size
        )));
    }

    let n_rows = df.height();
    let n_test = test_row_count(n_rows, test_size);
    if n_test == 0 || n_test >= n_rows {
        return Err(PipelineError::Config(format!(
            "cannot hold out {} of {} rows for testing with test size {}",
            n_test, n_rows, test_size
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let (train_idx, test_idx) = match strategy {
        SplitStrategy::Shuffle => {
            let mut indices: Vec<usize> = (0..n_rows).collect();
            indices.shuffle(&mut rng);
            let train = indices.split_off(n_test);
            (train, indices)
        }
        SplitStrategy::Stratified { column } => {
            let labels = class_labels(df, column)?;
            stratified_indices(&labels, n_test, &mut rng)
        }
    };

    Ok((take_rows(df, &train_idx)?, take_rows(df, &test_idx)?))
}

fn class_labels(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let as_str = df.column(column)?.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Shuffle each class separately and hold out a share of every class.
///
/// Class quotas use the largest-remainder rule so they sum to `n_test`.
fn stratified_indices(
    labels: &[Option<String>],
    n_test: usize,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<usize>) {
    let mut classes: BTreeMap<Option<&str>, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        classes.entry(label.as_deref()).or_default().push(i);
    }

    let n_rows = labels.len() as f64;
    let exact: Vec<f64> = classes
        .values()
        .map(|rows| rows.len() as f64 * n_test as f64 / n_rows)
        .collect();
    let mut quotas: Vec<usize> = exact.iter().map(|q| q.floor() as usize).collect();

    let mut by_remainder: Vec<usize> = (0..quotas.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut missing = n_test - quotas.iter().sum::<usize>();
    for class in by_remainder {
        if missing == 0 {
            break;
        }
        quotas[class] += 1;
        missing -= 1;
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (mut rows, quota) in classes.into_values().zip(quotas) {
        rows.shuffle(rng);
        let rest = rows.split_off(quota.min(rows.len()));
        test.extend(rows);
        train.extend(rest);
    }
    train.shuffle(rng);
    test.shuffle(rng);
    (train, test)
}

fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
    Ok(df.take(&IdxCa::from_vec("idx".into(), idx))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled_frame() -> DataFrame {
        df! {
            "id" => (0..10).map(|i| i as i64).collect::<Vec<_>>(),
            "label" => ["C", "C", "C", "C", "C", "C", "D", "D", "D", "D"],
        }
        .unwrap()
    }

    #[test]
    fn test_test_row_count_rounds_up() {
        assert_eq!(test_row_count(10, 0.2), 2);
        assert_eq!(test_row_count(11, 0.2), 3);
        assert_eq!(test_row_count(10, 0.3), 3);
    }

    #[test]
    fn test_shuffle_split_partitions_rows() {
        let df = labelled_frame();
        let (train, test) = train_test_split(&df, 0.2, 42, &SplitStrategy::Shuffle).unwrap();
        assert_eq!(train.height(), 8);
        assert_eq!(test.height(), 2);

        let mut ids: Vec<i64> = train
            .column("id")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .chain(test.column("id").unwrap().i64().unwrap().into_iter())
            .flatten()
            .collect();
        ids.sort();
        assert_eq!(ids, (0..10).collect::<Vec<i64>>());
    }

    #[test]
    fn test_stratified_split_keeps_every_class_in_test() {
        let df = labelled_frame();
        let strategy = SplitStrategy::Stratified {
            column: "label".to_string(),
        };
        let (train, test) = train_test_split(&df, 0.2, 7, &strategy).unwrap();

        let test_labels = class_labels(&test, "label").unwrap();
        assert_eq!(test_labels.iter().filter(|l| l.as_deref() == Some("C")).count(), 1);
        assert_eq!(test_labels.iter().filter(|l| l.as_deref() == Some("D")).count(), 1);
        assert_eq!(train.height(), 8);
    }

    #[test]
    fn test_invalid_test_size_rejected() {
        let df = labelled_frame();
        assert!(train_test_split(&df, 0.0, 42, &SplitStrategy::Shuffle).is_err());
        assert!(train_test_split(&df, 1.0, 42, &SplitStrategy::Shuffle).is_err());
    }
}

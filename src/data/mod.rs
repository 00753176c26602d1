//! Dataset loading for train/test splits
//!
//! Provides [`LabeledDataset`] (a feature matrix plus encoded class labels)
//! and CSV loading of a `train_data.csv` / `test_data.csv` pair from a data
//! directory. All columns except the label column are parsed as `f64`
//! features. The class table is fit on the training partition; test labels
//! must be a subset of the training label set.

use std::collections::HashMap;
use std::path::Path;

use ndarray::Array2;

use crate::error::{Error, Result};

/// A labeled tabular dataset: fixed-width numeric features plus class labels.
///
/// Labels are stored encoded (`0..n_classes`); the class-name table maps
/// them back to the raw label strings. Immutable after load.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    x: Array2<f64>,
    y: Vec<usize>,
    classes: Vec<String>,
}

impl LabeledDataset {
    /// Build a dataset from parts.
    ///
    /// Fails with `SchemaMismatch` if the label vector length does not match
    /// the feature row count, or if any encoded label is out of range for
    /// the class table.
    pub fn new(x: Array2<f64>, y: Vec<usize>, classes: Vec<String>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(Error::SchemaMismatch(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= classes.len()) {
            return Err(Error::SchemaMismatch(format!(
                "label index {bad} out of range for {} classes",
                classes.len()
            )));
        }
        Ok(Self { x, y, classes })
    }

    /// Feature matrix, one row per example.
    pub fn features(&self) -> &Array2<f64> {
        &self.x
    }

    /// Encoded class labels, aligned with feature rows.
    pub fn labels(&self) -> &[usize] {
        &self.y
    }

    /// Class-name table; index = encoded label.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of examples.
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    /// Feature vector width.
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Number of distinct classes in the class table.
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

/// Aligned train/test partitions sharing one class table.
#[derive(Debug, Clone)]
pub struct DatasetPair {
    pub train: LabeledDataset,
    pub test: LabeledDataset,
}

/// Load `train_data.csv` and `test_data.csv` from a data directory.
///
/// Every column except `label_column` is a feature. Feature headers must be
/// identical (names and order) between the two files. The class table is
/// discovered from the training labels in first-appearance order; a test
/// label absent from training is a `SchemaMismatch`.
pub fn load_dataset(dir: impl AsRef<Path>, label_column: &str) -> Result<DatasetPair> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::DatasetNotFound(dir.to_path_buf()));
    }

    let train_path = dir.join("train_data.csv");
    let test_path = dir.join("test_data.csv");
    if !train_path.exists() {
        return Err(Error::DatasetNotFound(train_path));
    }
    if !test_path.exists() {
        return Err(Error::DatasetNotFound(test_path));
    }

    let (train_features, train_raw) = read_csv(&train_path, label_column)?;
    let (test_features, test_raw) = read_csv(&test_path, label_column)?;

    if train_features.headers != test_features.headers {
        return Err(Error::SchemaMismatch(format!(
            "train/test feature columns differ: {:?} vs {:?}",
            train_features.headers, test_features.headers
        )));
    }

    // Class table from the training partition, first-appearance order.
    let mut classes: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut train_y = Vec::with_capacity(train_raw.len());
    for label in &train_raw {
        let id = *index.entry(label.clone()).or_insert_with(|| {
            classes.push(label.clone());
            classes.len() - 1
        });
        train_y.push(id);
    }

    let mut test_y = Vec::with_capacity(test_raw.len());
    for label in &test_raw {
        let id = index.get(label).copied().ok_or_else(|| {
            Error::SchemaMismatch(format!("test label {label:?} never seen in training"))
        })?;
        test_y.push(id);
    }

    let train = LabeledDataset::new(train_features.into_matrix()?, train_y, classes.clone())?;
    let test = LabeledDataset::new(test_features.into_matrix()?, test_y, classes)?;

    Ok(DatasetPair { train, test })
}

/// Parsed feature columns of one CSV file, prior to matrix assembly.
struct RawFeatures {
    headers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl RawFeatures {
    fn into_matrix(self) -> Result<Array2<f64>> {
        let n_rows = self.rows.len();
        let n_cols = self.headers.len();
        let flat: Vec<f64> = self.rows.into_iter().flatten().collect();
        Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| Error::SchemaMismatch(format!("ragged feature rows: {e}")))
    }
}

fn read_csv(path: &Path, label_column: &str) -> Result<(RawFeatures, Vec<String>)> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let label_idx = headers
        .iter()
        .position(|h| h == label_column)
        .ok_or_else(|| {
            Error::SchemaMismatch(format!(
                "label column {label_column:?} not found in {}",
                path.display()
            ))
        })?;

    let feature_headers: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != label_idx)
        .map(|(_, h)| h.to_string())
        .collect();
    if feature_headers.is_empty() {
        return Err(Error::SchemaMismatch(format!(
            "{} has no feature columns",
            path.display()
        )));
    }

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let mut row = Vec::with_capacity(feature_headers.len());
        for (i, cell) in record.iter().enumerate() {
            if i == label_idx {
                labels.push(cell.to_string());
            } else {
                let value: f64 = cell.trim().parse().map_err(|_| {
                    Error::SchemaMismatch(format!(
                        "non-numeric feature {:?} at {}:{} column {:?}",
                        cell,
                        path.display(),
                        line + 2,
                        headers.get(i).unwrap_or("?")
                    ))
                })?;
                row.push(value);
            }
        }
        if row.len() != feature_headers.len() {
            return Err(Error::SchemaMismatch(format!(
                "row {} of {} has {} feature cells, expected {}",
                line + 2,
                path.display(),
                row.len(),
                feature_headers.len()
            )));
        }
        rows.push(row);
    }

    Ok((
        RawFeatures {
            headers: feature_headers,
            rows,
        },
        labels,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).expect("write csv");
    }

    #[test]
    fn test_load_dataset_basic() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_csv(
            tmp.path(),
            "train_data.csv",
            "f0,f1,sentiment\n1.0,2.0,pos\n3.0,4.0,neg\n5.0,6.0,pos\n",
        );
        write_csv(
            tmp.path(),
            "test_data.csv",
            "f0,f1,sentiment\n7.0,8.0,neg\n",
        );

        let pair = load_dataset(tmp.path(), "sentiment").expect("load");
        assert_eq!(pair.train.n_samples(), 3);
        assert_eq!(pair.train.n_features(), 2);
        assert_eq!(
            pair.train.classes(),
            &["pos".to_string(), "neg".to_string()]
        );
        assert_eq!(pair.train.labels(), &[0, 1, 0]);
        assert_eq!(pair.test.labels(), &[1]);
        assert_eq!(pair.test.features()[[0, 1]], 8.0);
    }

    #[test]
    fn test_label_column_position_independent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_csv(
            tmp.path(),
            "train_data.csv",
            "sentiment,f0,f1\npos,1.0,2.0\nneg,3.0,4.0\n",
        );
        write_csv(tmp.path(), "test_data.csv", "sentiment,f0,f1\npos,5.0,6.0\n");

        let pair = load_dataset(tmp.path(), "sentiment").expect("load");
        assert_eq!(pair.train.features()[[1, 0]], 3.0);
        assert_eq!(pair.test.labels(), &[0]);
    }

    #[test]
    fn test_missing_directory() {
        let err = load_dataset("/nonexistent/data", "sentiment").unwrap_err();
        assert!(matches!(err, Error::DatasetNotFound(_)));
    }

    #[test]
    fn test_missing_test_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_csv(tmp.path(), "train_data.csv", "f0,sentiment\n1.0,pos\n");

        let err = load_dataset(tmp.path(), "sentiment").unwrap_err();
        match err {
            Error::DatasetNotFound(path) => {
                assert!(path.ends_with("test_data.csv"));
            }
            other => panic!("expected DatasetNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_feature_columns_must_match() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_csv(
            tmp.path(),
            "train_data.csv",
            "f0,f1,sentiment\n1.0,2.0,pos\n",
        );
        write_csv(
            tmp.path(),
            "test_data.csv",
            "f0,f2,sentiment\n1.0,2.0,pos\n",
        );

        let err = load_dataset(tmp.path(), "sentiment").unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn test_unseen_test_label_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_csv(
            tmp.path(),
            "train_data.csv",
            "f0,sentiment\n1.0,pos\n2.0,pos\n",
        );
        write_csv(tmp.path(), "test_data.csv", "f0,sentiment\n3.0,neu\n");

        let err = load_dataset(tmp.path(), "sentiment").unwrap_err();
        match err {
            Error::SchemaMismatch(msg) => assert!(msg.contains("neu")),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_feature_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_csv(tmp.path(), "train_data.csv", "f0,sentiment\noops,pos\n");
        write_csv(tmp.path(), "test_data.csv", "f0,sentiment\n1.0,pos\n");

        let err = load_dataset(tmp.path(), "sentiment").unwrap_err();
        match err {
            Error::SchemaMismatch(msg) => assert!(msg.contains("non-numeric")),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_label_column() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write_csv(tmp.path(), "train_data.csv", "f0,f1\n1.0,2.0\n");
        write_csv(tmp.path(), "test_data.csv", "f0,f1\n1.0,2.0\n");

        let err = load_dataset(tmp.path(), "sentiment").unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }
}

use crate::error::{DataError, DataResult};
use liftoff_ml_core::{Labels, Matrix};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Binary landing-success label.
pub const LABEL_COLUMN: &str = "Class";
/// Prefix of the one-hot launch site indicator columns.
pub const SITE_PREFIX: &str = "launch_site__";
/// Numeric feature columns every clean dataset carries.
pub const REQUIRED_FEATURES: [&str; 5] =
    ["year", "has_fairings", "reused_count", "success", "payload_count"];
const BINARY_FEATURES: [&str; 3] = ["has_fairings", "reused_count", "success"];
const COUNT_FEATURES: [&str; 1] = ["payload_count"];

const WRANGLE_HINT: &str = "Run the data wrangling step first to produce it.";

/// Clean feature table: every column except the label, in file order.
#[derive(Debug, Clone)]
pub struct LaunchDataset {
    pub columns: Vec<String>,
    pub features: Matrix,
    pub labels: Labels,
}

impl LaunchDataset {
    pub fn n_samples(&self) -> usize {
        self.features.rows()
    }

    pub fn n_features(&self) -> usize {
        self.features.cols()
    }
}

fn open(path: &Path, hint: &str) -> DataResult<(csv::Reader<File>, Vec<String>)> {
    let missing = |detail: String| DataError::MissingInput {
        path: path.to_path_buf(),
        hint: if detail.is_empty() {
            hint.to_string()
        } else {
            format!("{hint} ({detail})")
        },
    };
    if !path.is_file() {
        return Err(missing(String::new()));
    }
    let mut rdr = csv::Reader::from_path(path).map_err(|e| missing(e.to_string()))?;
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| DataError::schema("*", format!("unreadable header: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut seen = HashSet::new();
    for h in &headers {
        if !seen.insert(h.as_str()) {
            return Err(DataError::schema(h, "duplicate column"));
        }
    }
    Ok((rdr, headers))
}

fn read_rows(rdr: &mut csv::Reader<File>, headers: &[String]) -> DataResult<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 1;
        let record = result.map_err(|e| DataError::schema("*", format!("row {line}: {e}")))?;
        let mut row = Vec::with_capacity(headers.len());
        for (field, name) in record.iter().zip(headers) {
            let value: f64 = field.trim().parse().map_err(|_| {
                DataError::schema(name, format!("row {line}: expected a number, found '{field}'"))
            })?;
            if !value.is_finite() {
                return Err(DataError::schema(name, format!("row {line}: value is not finite")));
            }
            row.push(value);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Every required column is present and nothing outside the known set appears.
fn validate_header(headers: &[String], label_required: bool) -> DataResult<()> {
    let present: HashSet<&str> = headers.iter().map(String::as_str).collect();
    let label = label_required.then_some(LABEL_COLUMN);
    for required in REQUIRED_FEATURES.iter().copied().chain(label) {
        if !present.contains(required) {
            return Err(DataError::schema(required, "required column is missing"));
        }
    }
    for h in headers {
        let known = h == LABEL_COLUMN || REQUIRED_FEATURES.contains(&h.as_str());
        match h.strip_prefix(SITE_PREFIX) {
            Some("") => return Err(DataError::schema(h, "launch site indicator has no site name")),
            Some(_) => {}
            None if known => {}
            None => return Err(DataError::schema(h, "unexpected column")),
        }
    }
    Ok(())
}

/// Binary and count columns hold legal values; at most one launch site per row.
fn validate_values(headers: &[String], rows: &[Vec<f64>]) -> DataResult<()> {
    for (col, name) in headers.iter().enumerate() {
        let binary = name == LABEL_COLUMN
            || BINARY_FEATURES.contains(&name.as_str())
            || name.starts_with(SITE_PREFIX);
        let count = COUNT_FEATURES.contains(&name.as_str());
        for (i, row) in rows.iter().enumerate() {
            let v = row[col];
            if binary && v != 0.0 && v != 1.0 {
                return Err(DataError::schema(
                    name,
                    format!("row {}: expected 0 or 1, found {v}", i + 1),
                ));
            }
            if count && (v < 0.0 || v.fract() != 0.0) {
                return Err(DataError::schema(
                    name,
                    format!("row {}: expected a non-negative integer, found {v}", i + 1),
                ));
            }
        }
    }

    let sites: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.starts_with(SITE_PREFIX))
        .map(|(i, _)| i)
        .collect();
    for (i, row) in rows.iter().enumerate() {
        if sites.iter().map(|&c| row[c]).sum::<f64>() > 1.0 {
            return Err(DataError::schema(
                format!("{SITE_PREFIX}*"),
                format!("row {}: more than one launch site is set", i + 1),
            ));
        }
    }
    Ok(())
}

/// Load the clean launch table and split it into features and label.
///
/// The header is checked before any row is read, so a missing `Class`
/// column fails fast.
pub fn read_dataset(path: &Path) -> DataResult<LaunchDataset> {
    let (mut rdr, headers) = open(path, WRANGLE_HINT)?;
    validate_header(&headers, true)?;
    let rows = read_rows(&mut rdr, &headers)?;
    validate_values(&headers, &rows)?;

    let label_idx = headers
        .iter()
        .position(|h| h == LABEL_COLUMN)
        .ok_or_else(|| DataError::schema(LABEL_COLUMN, "required column is missing"))?;
    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != label_idx)
        .map(|(_, h)| h.clone())
        .collect();

    let mut data = Vec::with_capacity(rows.len() * columns.len());
    let mut labels = Vec::with_capacity(rows.len());
    for row in &rows {
        for (i, &v) in row.iter().enumerate() {
            if i == label_idx {
                labels.push(v as u8);
            } else {
                data.push(v);
            }
        }
    }

    let features = Matrix::new(data, rows.len(), columns.len())
        .map_err(|e| DataError::schema("*", e.to_string()))?;
    let labels = Labels::new(labels).map_err(|e| DataError::schema(LABEL_COLUMN, e.to_string()))?;

    debug!(
        path = %path.display(),
        rows = rows.len(),
        columns = columns.len(),
        "read launch dataset"
    );
    Ok(LaunchDataset {
        columns,
        features,
        labels,
    })
}

/// Load rows to score, arranged in the given feature order.
///
/// A `Class` column, if present, is ignored. Columns the model does not know
/// about, or columns it needs that are absent, are schema errors.
pub fn read_feature_rows(path: &Path, columns: &[String]) -> DataResult<Matrix> {
    let (mut rdr, headers) = open(path, "Point --input at a clean launch table.")?;
    validate_header(&headers, false)?;

    let mut order = Vec::with_capacity(columns.len());
    for col in columns {
        let idx = headers
            .iter()
            .position(|h| h == col)
            .ok_or_else(|| DataError::schema(col, "required by the model but missing"))?;
        order.push(idx);
    }
    if let Some(extra) = headers
        .iter()
        .find(|h| h.as_str() != LABEL_COLUMN && !columns.contains(*h))
    {
        return Err(DataError::schema(extra, "not part of the model's feature schema"));
    }

    let rows = read_rows(&mut rdr, &headers)?;
    validate_values(&headers, &rows)?;

    let data: Vec<f64> = rows
        .iter()
        .flat_map(|row| order.iter().map(move |&i| row[i]))
        .collect();
    Matrix::new(data, rows.len(), columns.len()).map_err(|e| DataError::schema("*", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str =
        "year,has_fairings,reused_count,success,payload_count,Class,launch_site__a,launch_site__b";

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn test_read_dataset() {
        let file = csv_file(&[
            HEADER,
            "2018,1,0,1,2,1,1,0",
            "2019,0,1,1,1,0,0,1",
            "2020,1,1,0,3,1,0,0",
        ]);
        let ds = read_dataset(file.path()).unwrap();

        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_features(), 7);
        assert!(!ds.columns.iter().any(|c| c == LABEL_COLUMN));
        assert_eq!(ds.columns[5], "launch_site__a");
        assert_eq!(ds.labels.as_slice(), &[1, 0, 1]);
        assert_eq!(ds.features.row(1), &[2019.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_missing_file() {
        let err = read_dataset(Path::new("/definitely/not/here.csv")).unwrap_err();
        match err {
            DataError::MissingInput { path, hint } => {
                assert!(path.ends_with("here.csv"));
                assert!(hint.contains("wrangling"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_label_column() {
        let file = csv_file(&[
            "year,has_fairings,reused_count,success,payload_count,launch_site__a",
            "2018,1,0,1,2,1",
        ]);
        match read_dataset(file.path()).unwrap_err() {
            DataError::Schema { column, .. } => assert_eq!(column, LABEL_COLUMN),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_values() {
        let cases = [
            ("2018,2,0,1,2,1,1,0", "has_fairings"),
            ("2018,1,0,1,1.5,1,1,0", "payload_count"),
            ("2018,1,0,1,2,1,1,1", "launch_site__*"),
            ("2018,1,0,1,x,1,1,0", "payload_count"),
            ("2018,1,0,1,2,3,1,0", LABEL_COLUMN),
        ];
        for (row, expected) in cases {
            let file = csv_file(&[HEADER, row]);
            match read_dataset(file.path()).unwrap_err() {
                DataError::Schema { column, .. } => assert_eq!(column, expected, "row {row}"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_unexpected_column() {
        let file = csv_file(&[&format!("{HEADER},mystery"), "2018,1,0,1,2,1,1,0,5"]);
        assert!(matches!(
            read_dataset(file.path()),
            Err(DataError::Schema { column, .. }) if column == "mystery"
        ));
    }

    #[test]
    fn test_read_feature_rows_reorders_and_ignores_label() {
        let file = csv_file(&[
            concat!(
                "launch_site__b,launch_site__a,payload_count,success,",
                "reused_count,has_fairings,year,Class"
            ),
            "1,0,4,1,0,1,2021,0",
        ]);
        let columns: Vec<String> = [
            "year", "has_fairings", "reused_count", "success", "payload_count",
            "launch_site__a", "launch_site__b",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let m = read_feature_rows(file.path(), &columns).unwrap();
        assert_eq!(m.row(0), &[2021.0, 1.0, 0.0, 1.0, 4.0, 0.0, 1.0]);

        let narrow = &columns[..6];
        assert!(matches!(
            read_feature_rows(file.path(), narrow),
            Err(DataError::Schema { column, .. }) if column == "launch_site__b"
        ));
    }
}

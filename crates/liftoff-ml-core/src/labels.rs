use crate::error::{MlError, MlResult};

use serde::{Deserialize, Serialize};

/// The two class values a label may take, in report order.
pub const CLASSES: [u8; 2] = [0, 1];

/// Binary label vector, positionally aligned with the rows of a [`crate::Matrix`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Labels(Vec<u8>);

impl Labels {
    pub fn new(values: Vec<u8>) -> MlResult<Self> {
        if let Some((row, &v)) = values.iter().enumerate().find(|(_, &v)| v > 1) {
            return Err(MlError::InvalidLabel {
                row,
                value: v as f64,
            });
        }
        Ok(Labels(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    /// Row counts per class, indexed by class value.
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for &v in &self.0 {
            counts[v as usize] += 1;
        }
        counts
    }

    /// Row indices carrying the given class, ascending.
    pub fn indices_of(&self, class: u8) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == class)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn select(&self, indices: &[usize]) -> MlResult<Labels> {
        indices
            .iter()
            .map(|&i| {
                self.0.get(i).copied().ok_or(MlError::IndexOutOfBounds {
                    row: i,
                    col: 0,
                    rows: self.0.len(),
                    cols: 1,
                })
            })
            .collect::<MlResult<Vec<u8>>>()
            .map(Labels)
    }
}

impl TryFrom<Vec<u8>> for Labels {
    type Error = MlError;

    fn try_from(values: Vec<u8>) -> MlResult<Self> {
        Labels::new(values)
    }
}

impl From<Labels> for Vec<u8> {
    fn from(labels: Labels) -> Self {
        labels.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_binary() {
        assert!(matches!(
            Labels::new(vec![0, 1, 2]),
            Err(MlError::InvalidLabel { row: 2, .. })
        ));
        assert!(serde_json::from_str::<Labels>("[0, 1, 3]").is_err());
    }

    #[test]
    fn test_counts_and_indices() {
        let y = Labels::new(vec![1, 0, 1, 1, 0]).unwrap();
        assert_eq!(y.class_counts(), [2, 3]);
        assert_eq!(y.indices_of(0), vec![1, 4]);
        assert_eq!(y.select(&[4, 0]).unwrap().as_slice(), &[0, 1]);
        assert!(y.select(&[5]).is_err());
    }
}

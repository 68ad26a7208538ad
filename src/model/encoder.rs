use crate::model::error::DiceError;
use ndarray::{Array2, Axis};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Bound for anything usable as an observation label (die faces, strings, ...).
pub trait Label: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

impl<T> Label for T where T: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

/// One-hot encoder over a fixed, ordered set of known categories.
#[derive(Debug, Clone)]
pub struct CategoryEncoder<T: Label> {
    categories: Vec<T>,
    index: HashMap<T, usize>,
}

impl<T: Label> CategoryEncoder<T> {
    /// Record the ordered set of valid labels. Column `k` of every encoded
    /// matrix corresponds to `categories[k]`.
    pub fn fit(categories: &[T]) -> Result<Self, DiceError> {
        if categories.is_empty() {
            return Err(DiceError::Shape(
                "category set must contain at least one label".into(),
            ));
        }
        let mut index = HashMap::with_capacity(categories.len());
        for (k, label) in categories.iter().enumerate() {
            if index.insert(label.clone(), k).is_some() {
                return Err(DiceError::DuplicateCategory {
                    label: label.to_string(),
                });
            }
        }
        Ok(Self {
            categories: categories.to_vec(),
            index,
        })
    }

    /// Encoder over the current categories followed by `new_labels`.
    /// Callers pass only labels that are not yet known and are distinct.
    pub(crate) fn appended(&self, new_labels: &[T]) -> Self {
        let mut grown = self.clone();
        for label in new_labels {
            grown.index.insert(label.clone(), grown.categories.len());
            grown.categories.push(label.clone());
        }
        grown
    }

    pub fn categories(&self) -> &[T] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn index_of(&self, label: &T) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn contains(&self, label: &T) -> bool {
        self.index.contains_key(label)
    }

    /// Map a batch of N labels to an N x K indicator matrix.
    ///
    /// The whole batch is resolved before the matrix is built, so an unknown
    /// label fails the call without producing a partial encoding.
    pub fn transform(&self, observations: &[T]) -> Result<Array2<u8>, DiceError> {
        let columns = observations
            .iter()
            .enumerate()
            .map(|(i, label)| {
                self.index_of(label)
                    .ok_or_else(|| DiceError::UnknownCategory {
                        label: label.to_string(),
                        index: i,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut encoded = Array2::<u8>::zeros((observations.len(), self.len()));
        for (row, col) in columns.into_iter().enumerate() {
            encoded[(row, col)] = 1;
        }
        Ok(encoded)
    }

    /// Encode then sum each column: the per-category count vector.
    pub fn count(&self, observations: &[T]) -> Result<Vec<u64>, DiceError> {
        let encoded = self.transform(observations)?;
        Ok(encoded
            .map(|&v| u64::from(v))
            .sum_axis(Axis(0))
            .to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faces() -> Vec<u8> {
        (1..=6).collect()
    }

    #[test]
    fn test_transform_categories_is_identity() {
        let encoder = CategoryEncoder::fit(&faces()).unwrap();
        let encoded = encoder.transform(&faces()).unwrap();
        assert_eq!(encoded, Array2::<u8>::eye(6));
    }

    #[test]
    fn test_transform_rejects_unknown_label() {
        let encoder = CategoryEncoder::fit(&faces()).unwrap();
        let err = encoder.transform(&[1, 2, 7]).unwrap_err();
        match err {
            DiceError::UnknownCategory { label, index } => {
                assert_eq!(label, "7");
                assert_eq!(index, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_count_follows_category_order() {
        let encoder = CategoryEncoder::fit(&["b", "a", "c"]).unwrap();
        let counts = encoder.count(&["a", "a", "c", "a"]).unwrap();
        assert_eq!(counts, vec![0, 3, 1]);
    }

    #[test]
    fn test_empty_batch_counts_zero() {
        let encoder = CategoryEncoder::fit(&faces()).unwrap();
        assert_eq!(encoder.transform(&[]).unwrap().shape(), &[0, 6]);
        assert_eq!(encoder.count(&[]).unwrap(), vec![0; 6]);
    }

    #[test]
    fn test_fit_rejects_duplicates_and_empty() {
        assert!(matches!(
            CategoryEncoder::fit(&[1, 2, 1]),
            Err(DiceError::DuplicateCategory { .. })
        ));
        assert!(matches!(
            CategoryEncoder::<u8>::fit(&[]),
            Err(DiceError::Shape(_))
        ));
    }
}

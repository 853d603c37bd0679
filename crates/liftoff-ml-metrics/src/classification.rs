use liftoff_ml_core::error::{MlError, MlResult};
use liftoff_ml_core::labels::CLASSES;
use liftoff_ml_core::Labels;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confusion counts indexed as `[true class][predicted class]`.
pub type ConfusionMatrix = [[usize; 2]; 2];

fn check_aligned(y_true: &Labels, y_pred: &Labels) -> MlResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(MlError::ShapeMismatch {
            expected: vec![y_true.len()],
            got: vec![y_pred.len()],
        });
    }
    if y_true.is_empty() {
        return Err(MlError::Empty);
    }
    Ok(())
}

/// Compute accuracy: fraction of correct predictions.
pub fn accuracy(y_true: &Labels, y_pred: &Labels) -> MlResult<f64> {
    check_aligned(y_true, y_pred)?;
    let correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

pub fn confusion_matrix(y_true: &Labels, y_pred: &Labels) -> MlResult<ConfusionMatrix> {
    check_aligned(y_true, y_pred)?;
    let mut matrix = [[0usize; 2]; 2];
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        matrix[t as usize][p as usize] += 1;
    }
    Ok(matrix)
}

/// Precision for one class; `None` when the class was never predicted.
pub fn precision_class(cm: &ConfusionMatrix, class: u8) -> Option<f64> {
    let c = class as usize;
    let tp = cm[c][c];
    let predicted = cm[0][c] + cm[1][c];
    (predicted > 0).then(|| tp as f64 / predicted as f64)
}

/// Recall for one class; `None` when the class has no support.
pub fn recall_class(cm: &ConfusionMatrix, class: u8) -> Option<f64> {
    let c = class as usize;
    let tp = cm[c][c];
    let support = cm[c][0] + cm[c][1];
    (support > 0).then(|| tp as f64 / support as f64)
}

/// F1 for one class; `None` if precision or recall is undefined.
pub fn f1_class(cm: &ConfusionMatrix, class: u8) -> Option<f64> {
    let p = precision_class(cm, class)?;
    let r = recall_class(cm, class)?;
    Some(if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: u8,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    pub support: usize,
}

/// Per-class precision/recall/F1 plus accuracy and averages.
///
/// A metric that has no defined value (a class absent from the test rows, or
/// never predicted) is `None` and prints as `undefined`; averages are taken
/// over the defined values only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub confusion: ConfusionMatrix,
}

fn macro_mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = values.flatten().collect();
    (!defined.is_empty()).then(|| defined.iter().sum::<f64>() / defined.len() as f64)
}

fn weighted_mean(values: impl Iterator<Item = (Option<f64>, usize)>) -> Option<f64> {
    let (sum, weight) = values
        .filter_map(|(v, w)| v.map(|v| (v * w as f64, w)))
        .fold((0.0, 0usize), |(s, tw), (v, w)| (s + v, tw + w));
    (weight > 0).then(|| sum / weight as f64)
}

impl ClassificationReport {
    pub fn new(y_true: &Labels, y_pred: &Labels) -> MlResult<Self> {
        let cm = confusion_matrix(y_true, y_pred)?;
        let acc = accuracy(y_true, y_pred)?;

        let classes: Vec<ClassMetrics> = CLASSES
            .iter()
            .map(|&class| ClassMetrics {
                class,
                precision: precision_class(&cm, class),
                recall: recall_class(&cm, class),
                f1: f1_class(&cm, class),
                support: cm[class as usize].iter().sum(),
            })
            .collect();

        let total = y_true.len();
        let macro_avg = AverageMetrics {
            precision: macro_mean(classes.iter().map(|c| c.precision)),
            recall: macro_mean(classes.iter().map(|c| c.recall)),
            f1: macro_mean(classes.iter().map(|c| c.f1)),
            support: total,
        };
        let weighted_avg = AverageMetrics {
            precision: weighted_mean(classes.iter().map(|c| (c.precision, c.support))),
            recall: weighted_mean(classes.iter().map(|c| (c.recall, c.support))),
            f1: weighted_mean(classes.iter().map(|c| (c.f1, c.support))),
            support: total,
        };

        Ok(ClassificationReport {
            classes,
            accuracy: acc,
            macro_avg,
            weighted_avg,
            confusion: cm,
        })
    }
}

fn cell(v: Option<f64>) -> String {
    v.map_or_else(|| "undefined".to_string(), |v| format!("{v:.4}"))
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9} {:>9} {:>9} {:>9}",
                c.class,
                cell(c.precision),
                cell(c.recall),
                cell(c.f1),
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9} {:>9}",
            "accuracy",
            "",
            "",
            format!("{:.4}", self.accuracy),
            self.macro_avg.support
        )?;
        for (label, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>9} {:>9} {:>9} {:>9}",
                label,
                cell(avg.precision),
                cell(avg.recall),
                cell(avg.f1),
                avg.support
            )?;
        }
        Ok(())
    }
}

use liftoff_ml_core::error::{MlError, MlResult};
use liftoff_ml_core::labels::CLASSES;
use liftoff_ml_core::Labels;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cmp::Ordering;
use tracing::debug;

pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

/// A class needs one row on each side of the split.
const MIN_ROWS_PER_CLASS: usize = 2;

/// Disjoint train/test row indices covering every row, each sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition rows into training and test sets, preserving class proportions.
///
/// The test set holds `ceil(n * test_fraction)` rows, apportioned across the
/// classes by largest remainder. Each class is shuffled with a `StdRng`
/// seeded from `seed`, so the same labels, fraction and seed always give the
/// same partition.
pub fn stratified_split(labels: &Labels, test_fraction: f64, seed: u64) -> MlResult<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(MlError::InvalidParameter(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let counts = labels.class_counts();
    for class in CLASSES {
        let count = counts[class as usize];
        if count < MIN_ROWS_PER_CLASS {
            return Err(MlError::InsufficientSamples {
                class,
                count,
                required: MIN_ROWS_PER_CLASS,
            });
        }
    }

    let n = labels.len();
    let test_size =
        ((n as f64 * test_fraction).ceil() as usize).clamp(CLASSES.len(), n - CLASSES.len());
    let per_class = allocate_test_counts(&counts, test_size);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - test_size);
    let mut test = Vec::with_capacity(test_size);

    for class in CLASSES {
        let mut indices = labels.indices_of(class);
        indices.shuffle(&mut rng);
        let k = per_class[class as usize];
        test.extend_from_slice(&indices[..k]);
        train.extend_from_slice(&indices[k..]);
    }

    train.sort_unstable();
    test.sort_unstable();

    debug!(
        rows = n,
        train = train.len(),
        test = test.len(),
        test_class_counts = ?per_class,
        "stratified split"
    );

    Ok(Split { train, test })
}

/// Largest-remainder apportionment of `test_size` rows over the classes,
/// keeping at least one row of every class on each side.
fn allocate_test_counts(counts: &[usize; 2], test_size: usize) -> [usize; 2] {
    let n: usize = counts.iter().sum();
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| test_size as f64 * c as f64 / n as f64)
        .collect();

    let mut alloc = [0usize; 2];
    for (a, e) in alloc.iter_mut().zip(&exact) {
        *a = e.floor() as usize;
    }

    let remaining = test_size - alloc.iter().sum::<usize>();
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(Ordering::Equal).then(a.cmp(&b))
    });
    for &c in order.iter().take(remaining) {
        alloc[c] += 1;
    }

    for (c, a) in alloc.iter_mut().enumerate() {
        *a = (*a).clamp(1, counts[c] - 1);
    }

    // Clamping can move the total off target; rebalance through classes with slack.
    let mut total: usize = alloc.iter().sum();
    while total > test_size {
        let pick = (0..alloc.len())
            .filter(|&c| alloc[c] > 1)
            .max_by(|&a, &b| {
                let da = alloc[a] as f64 - exact[a];
                let db = alloc[b] as f64 - exact[b];
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            });
        match pick {
            Some(c) => alloc[c] -= 1,
            None => break,
        }
        total -= 1;
    }
    while total < test_size {
        let pick = (0..alloc.len())
            .filter(|&c| alloc[c] < counts[c] - 1)
            .min_by(|&a, &b| {
                let da = alloc[a] as f64 - exact[a];
                let db = alloc[b] as f64 - exact[b];
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            });
        match pick {
            Some(c) => alloc[c] += 1,
            None => break,
        }
        total += 1;
    }

    alloc
}

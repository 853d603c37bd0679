use liftoff_ml_core::error::{MlError, MlResult};
use liftoff_ml_core::estimator::{validate_predict_input, validate_training_set};
use liftoff_ml_core::{Classifier, Labels, Matrix};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A node of the flattened tree. Children are indices into the node list.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    /// Internal node: rows with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Leaf: class counts of the training rows that reached it.
    Leaf { counts: [usize; 2] },
}

/// Nodes stored in one `Vec`, root first. Flat storage keeps serialization
/// and traversal free of recursion however deep the tree grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, d)) = stack.pop() {
            match &self.nodes[id] {
                TreeNode::Leaf { .. } => max_depth = max_depth.max(d),
                TreeNode::Split { left, right, .. } => {
                    stack.push((*left, d + 1));
                    stack.push((*right, d + 1));
                }
            }
        }
        max_depth
    }

    fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    fn leaf_counts(&self, row: &[f64]) -> [usize; 2] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                TreeNode::Leaf { counts } => return *counts,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[*feature] <= *threshold { *left } else { *right },
            }
        }
    }
}

/// Best split found at one node.
struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Decision Tree Classifier using CART (Gini impurity).
///
/// Features are visited in a seeded random order at every node and the first
/// strictly best split wins, so ties between equally good features are
/// broken reproducibly by `random_state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    /// `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub random_state: u64,
    tree: Option<Tree>,
    n_features: usize,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new(None, 2, 1, 42)
    }
}

fn gini(counts: &[usize; 2]) -> f64 {
    let n = (counts[0] + counts[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / n;
    let p1 = counts[1] as f64 / n;
    1.0 - p0 * p0 - p1 * p1
}

fn class_counts(y: &Labels, indices: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &i in indices {
        counts[y.as_slice()[i] as usize] += 1;
    }
    counts
}

impl DecisionTreeClassifier {
    pub fn new(
        max_depth: Option<usize>,
        min_samples_split: usize,
        min_samples_leaf: usize,
        random_state: u64,
    ) -> Self {
        DecisionTreeClassifier {
            max_depth,
            min_samples_split,
            min_samples_leaf,
            random_state,
            tree: None,
            n_features: 0,
        }
    }

    pub fn depth(&self) -> Option<usize> {
        self.tree.as_ref().map(Tree::depth)
    }

    pub fn n_leaves(&self) -> Option<usize> {
        self.tree.as_ref().map(Tree::n_leaves)
    }

    pub fn fit(&mut self, x: &Matrix, y: &Labels) -> MlResult<()> {
        validate_training_set(x, y)?;
        if self.min_samples_split < 2 || self.min_samples_leaf < 1 {
            return Err(MlError::InvalidParameter(
                "min_samples_split must be >= 2 and min_samples_leaf >= 1".into(),
            ));
        }

        self.tree = Some(self.build_tree(x, y));
        self.n_features = x.cols();
        Ok(())
    }

    /// Grow the tree depth-first, left subtree before right, so the seeded
    /// feature shuffles happen in the same order on every fit.
    fn build_tree(&self, x: &Matrix, y: &Labels) -> Tree {
        let mut rng = StdRng::seed_from_u64(self.random_state);
        let mut nodes = vec![TreeNode::Leaf { counts: [0, 0] }];
        let mut stack: Vec<(usize, Vec<usize>, usize)> = vec![(0, (0..x.rows()).collect(), 0)];

        while let Some((id, indices, depth)) = stack.pop() {
            let counts = class_counts(y, &indices);
            let pure = counts[0] == 0 || counts[1] == 0;
            let depth_reached = self.max_depth.is_some_and(|d| depth >= d);
            if pure || depth_reached || indices.len() < self.min_samples_split {
                nodes[id] = TreeNode::Leaf { counts };
                continue;
            }

            let Some(best) = self.best_split(x, y, &indices, &counts, &mut rng) else {
                nodes[id] = TreeNode::Leaf { counts };
                continue;
            };

            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x.row(i)[best.feature] <= best.threshold);

            let left_id = nodes.len();
            let right_id = left_id + 1;
            nodes.push(TreeNode::Leaf { counts: [0, 0] });
            nodes.push(TreeNode::Leaf { counts: [0, 0] });
            nodes[id] = TreeNode::Split {
                feature: best.feature,
                threshold: best.threshold,
                left: left_id,
                right: right_id,
            };

            stack.push((right_id, right, depth + 1));
            stack.push((left_id, left, depth + 1));
        }

        Tree { nodes }
    }

    fn best_split(
        &self,
        x: &Matrix,
        y: &Labels,
        indices: &[usize],
        parent: &[usize; 2],
        rng: &mut StdRng,
    ) -> Option<Candidate> {
        let n = indices.len();
        let mut features: Vec<usize> = (0..x.cols()).collect();
        features.shuffle(rng);

        let mut best: Option<Candidate> = None;

        for feature in features {
            let mut sorted: Vec<(f64, u8)> = indices
                .iter()
                .map(|&i| (x.row(i)[feature], y.as_slice()[i]))
                .collect();
            sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            let mut left = [0usize; 2];
            for pos in 0..n - 1 {
                left[sorted[pos].1 as usize] += 1;
                let (here, next) = (sorted[pos].0, sorted[pos + 1].0);
                if here >= next {
                    continue;
                }
                let n_left = pos + 1;
                if n_left < self.min_samples_leaf || n - n_left < self.min_samples_leaf {
                    continue;
                }

                let right = [parent[0] - left[0], parent[1] - left[1]];
                let impurity = (n_left as f64 * gini(&left)
                    + (n - n_left) as f64 * gini(&right))
                    / n as f64;

                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = (here + next) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(Candidate {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best
    }

    pub fn predict(&self, x: &Matrix) -> MlResult<Labels> {
        let tree = self.tree.as_ref().ok_or(MlError::NotFitted)?;
        validate_predict_input(x, self.n_features)?;

        let predictions = x
            .iter_rows()
            .map(|row| {
                let counts = tree.leaf_counts(row);
                u8::from(counts[1] > counts[0])
            })
            .collect();
        Labels::new(predictions)
    }
}

impl Classifier for DecisionTreeClassifier {
    fn name(&self) -> &str {
        "decision_tree"
    }

    fn fit(&mut self, x: &Matrix, y: &Labels) -> MlResult<()> {
        DecisionTreeClassifier::fit(self, x, y)
    }

    fn predict(&self, x: &Matrix) -> MlResult<Labels> {
        DecisionTreeClassifier::predict(self, x)
    }
}

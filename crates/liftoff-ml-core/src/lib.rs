pub mod matrix;
pub mod labels;
pub mod linalg;
pub mod estimator;
pub mod error;

pub use matrix::Matrix;
pub use labels::Labels;
pub use estimator::Classifier;
pub use error::{MlError, MlResult};

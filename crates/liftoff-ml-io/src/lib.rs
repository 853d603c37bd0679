pub mod csv_io;
pub mod error;
pub mod model_io;

pub use csv_io::*;
pub use error::{DataError, DataResult};
pub use model_io::*;

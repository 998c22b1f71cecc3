pub mod error;
pub mod partition;

pub use error::FatxError;
pub use partition::{DriveLetter, PartitionWindow};

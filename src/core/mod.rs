pub mod aggregator;
pub mod documents;
pub mod etl;
pub mod ranking;

pub use crate::domain::model::{ExtractedRecords, Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

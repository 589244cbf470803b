pub mod dataset_writer;

pub use dataset_writer::{AnimationDataset, DatasetWriter, PointRecord};

pub mod accumulator;
pub mod consistency_filter;
pub mod pipeline;
pub mod reconciler;
pub mod resampler;

pub use accumulator::Accumulator;
pub use consistency_filter::ConsistencyFilter;
pub use pipeline::{Pipeline, RunSummary};
pub use reconciler::{remap_frames, Reconciler};
pub use resampler::{sample_dates, WeeklyResampler};

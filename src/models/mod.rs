pub mod frame;
pub mod observation;
pub mod period;
pub mod profile;
pub mod series;

pub use frame::{Bounds, Frame, PeriodFrames, Timeline};
pub use observation::{GridPoint, Observation, ObservationBuilder};
pub use period::{PeriodWindow, Periods, CURRENT_LABEL, PRIOR_LABEL};
pub use profile::{default_bands, PestRiskProfile, ProfileSet, Threshold};
pub use series::{group_readings, CumulativeReading, PointSeries, SeriesEntry};

pub mod constants;
pub mod dates;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use dates::parse_date;
pub use filename::{frame_file_name, frame_path, profile_frames_dir};
pub use logging::init_logging;
pub use progress::ProgressReporter;

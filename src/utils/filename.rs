use std::path::{Path, PathBuf};

/// Zero-padded frame file name: `frame_007.png`
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:03}.png", index)
}

/// Directory holding one profile's frames
pub fn profile_frames_dir(frames_root: &Path, profile_id: &str) -> PathBuf {
    frames_root.join(profile_id)
}

pub fn frame_path(frames_root: &Path, profile_id: &str, index: usize) -> PathBuf {
    profile_frames_dir(frames_root, profile_id).join(frame_file_name(index))
}

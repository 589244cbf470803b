use crate::error::{ProcessingError, Result};
use crate::models::{PestRiskProfile, ProfileSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use validator::Validate;

/// Loads pest risk profiles from a `{"pests": [...]}` JSON file.
pub struct ProfileReader;

impl ProfileReader {
    pub fn new() -> Self {
        Self
    }

    /// Read and validate the profile file. Profiles that fail validation are
    /// logged and dropped; an unreadable file or an empty result is
    /// `NoProfiles`.
    pub fn read(&self, path: &Path) -> Result<Vec<PestRiskProfile>> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProcessingError::NoProfiles(format!("cannot read {}: {}", path.display(), e))
        })?;
        self.parse(&content)
    }

    pub fn parse(&self, content: &str) -> Result<Vec<PestRiskProfile>> {
        let set: ProfileSet = serde_json::from_str(content)
            .map_err(|e| ProcessingError::NoProfiles(format!("invalid profile file: {}", e)))?;

        let profiles: Vec<PestRiskProfile> = set
            .pests
            .into_iter()
            .filter(|profile| match profile.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!(profile = %profile.id, error = %e, "Dropping invalid risk profile");
                    false
                }
            })
            .collect();

        if profiles.is_empty() {
            return Err(ProcessingError::NoProfiles(
                "profile file lists no valid pests".to_string(),
            ));
        }

        info!("Loaded {} risk profiles", profiles.len());
        Ok(profiles)
    }
}

impl Default for ProfileReader {
    fn default() -> Self {
        Self::new()
    }
}

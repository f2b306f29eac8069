/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

use crate::error::Result;

/// Run parameters for grid construction and sample placement. Backed by
/// `serde_json`, mirroring the teacher's `Configs`/`settings.json` pattern,
/// but constructible directly since this crate has no standing install
/// directory to read a settings file from automatically.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GrtsConfig {
    /// Shift the grid origin by a random sub-cell offset before refining.
    pub shift_grid: bool,
    /// Starting hierarchical level; `None` means derive it from the sample
    /// size as `ceil(log_4(n)).max(1)`.
    pub start_level: Option<u32>,
    /// Hard ceiling on hierarchical levels a cell may be refined to.
    pub max_level: u32,
    /// Maximum placement attempts per sample point before giving up.
    pub max_try: u32,
    /// Gate informational `println!` output from the refinement loop.
    pub verbose: bool,
}

impl Default for GrtsConfig {
    fn default() -> GrtsConfig {
        GrtsConfig {
            shift_grid: true,
            start_level: None,
            max_level: 30,
            max_try: 25,
            verbose: false,
        }
    }
}

impl GrtsConfig {
    pub fn new() -> GrtsConfig {
        GrtsConfig::default()
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<GrtsConfig> {
        let contents = fs::read_to_string(path)?;
        let configs: GrtsConfig = serde_json::from_str(&contents)?;
        Ok(configs)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_values() {
        let c = GrtsConfig::default();
        assert_eq!(c.max_try, 25);
        assert!(c.start_level.is_none());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut c = GrtsConfig::default();
        c.max_level = 12;
        c.start_level = Some(3);
        c.to_json_file(&path).unwrap();
        let loaded = GrtsConfig::from_json_file(&path).unwrap();
        assert_eq!(c, loaded);
    }
}

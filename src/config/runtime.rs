use super::BridgeConfig;
use std::path::PathBuf;

/// Environment overrides applied on top of the TOML file.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub root: Option<PathBuf>,
    pub world_fixture: Option<PathBuf>,
}

impl RuntimeOverrides {
    /// Build from env vars, leaving unset values untouched.
    pub fn from_env() -> Self {
        let mut overrides = Self::default();

        if let Ok(v) = std::env::var("SST_ROOT") {
            if !v.trim().is_empty() {
                overrides.root = Some(PathBuf::from(v));
            }
        }
        if let Ok(v) = std::env::var("SST_WORLD_FIXTURE") {
            if !v.trim().is_empty() {
                overrides.world_fixture = Some(PathBuf::from(v));
            }
        }

        overrides
    }

    pub fn apply(&self, config: &mut BridgeConfig) {
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
    }
}

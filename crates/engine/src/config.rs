use crate::error::EngineError;

/// Environment variable read by [`EngineConfig::from_env`].
pub const ENV_MAX_UNDO_DEPTH: &str = "EDITLOG_MAX_UNDO_DEPTH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Maximum number of undo batches kept. `None` keeps every batch.
    pub max_undo_depth: Option<usize>,
}

impl EngineConfig {
    pub fn with_max_undo_depth(mut self, depth: usize) -> Self {
        self.max_undo_depth = Some(depth);
        self
    }

    /// Defaults overridden by `EDITLOG_MAX_UNDO_DEPTH` when it is set.
    pub fn from_env() -> Result<Self, EngineError> {
        match std::env::var(ENV_MAX_UNDO_DEPTH) {
            Ok(raw) => Ok(Self {
                max_undo_depth: parse_max_undo_depth(&raw)?,
            }),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(EngineError::InvalidConfig(format!("{ENV_MAX_UNDO_DEPTH}: {e}"))),
        }
    }
}

/// Parse an undo depth. Empty or `unbounded` means no limit. Zero is refused.
pub fn parse_max_undo_depth(raw: &str) -> Result<Option<usize>, EngineError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("unbounded") {
        return Ok(None);
    }
    match raw.parse::<usize>() {
        Ok(0) => Err(EngineError::InvalidConfig(format!(
            "{ENV_MAX_UNDO_DEPTH} must be at least 1"
        ))),
        Ok(depth) => Ok(Some(depth)),
        Err(e) => Err(EngineError::InvalidConfig(format!(
            "{ENV_MAX_UNDO_DEPTH}={raw:?}: {e}"
        ))),
    }
}

use mdt_core::{AllocationError, LoadError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::session::Stage;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Why a session stopped before writing scores. The driver reacts
/// differently to each: nothing is logged for config and load failures, the
/// log is partial after an allocation failure, and an escape flushes the
/// partial log without scores.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session parameters: {0}")]
    Config(#[from] ConfigError),

    #[error("stimulus pool unusable: {0}")]
    Load(#[from] LoadError),

    #[error("trial allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    #[error("session terminated by escape during {stage}")]
    Terminated { stage: Stage },

    #[error("log sink error: {0}")]
    Sink(#[from] std::io::Error),
}

impl SessionError {
    pub fn is_termination(&self) -> bool {
        matches!(self, SessionError::Terminated { .. })
    }
}

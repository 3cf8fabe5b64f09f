use serde::{Deserialize, Serialize};

/// Halves of every study/test cycle.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Study,
    Test,
}

impl Phase {
    pub fn next(&self) -> Option<Self> {
        match self {
            Phase::Study => Some(Phase::Test),
            Phase::Test => None,
        }
    }

    /// Only test responses are tallied.
    pub fn is_scored(&self) -> bool {
        matches!(self, Phase::Test)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Study => "Study",
            Phase::Test => "Test",
        }
    }
}

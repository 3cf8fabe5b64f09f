pub mod error;
pub mod phase;
pub mod score;
pub mod seed;
pub mod stimulus;
pub mod trial;

pub use error::{AllocationError, LoadError};
pub use phase::Phase;
pub use score::{CONDITION_COUNT, Condition, ScoreCell, Scorer};
pub use seed::pair_seed;
pub use stimulus::{Category, NamingRule, StimulusFile};
pub use trial::{KeyPress, TrialRecord};

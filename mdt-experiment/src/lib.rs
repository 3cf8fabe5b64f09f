pub mod config;
pub mod error;
pub mod log;
pub mod object;
pub mod pool;
pub mod presenter;
pub mod session;
pub mod spatial;
pub mod task;
pub mod temporal;

pub use config::{ConfigError, ESCAPE_KEY, SessionConfig, TaskKind, Variant};
pub use error::SessionError;
pub use log::{LogSink, MemorySink, WriterSink};
pub use object::{LeftoverStart, ObjectCondition, ObjectItem, ObjectTask};
pub use pool::{Filesystem, MemoryFilesystem, StdFilesystem, StimulusPool};
pub use presenter::{
    DisplayGeometry, Point, Presentation, Presenter, ResponseWindow, ScriptedPresenter, Side,
};
pub use session::{Session, SessionOutcome, Stage};
pub use spatial::{MoveClass, SpatialItem, SpatialTask};
pub use task::{BlockPlan, Task};
pub use temporal::{DistanceClass, TemporalItem, TemporalTask};

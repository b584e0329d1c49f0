mod actor;
mod engine;

pub use actor::TimerHandle;
pub use engine::{
    TickOutcome, TimerEngine, TimerSession, TimerSnapshot, TimerState,
    DEFAULT_CHECKPOINT_INTERVAL,
};

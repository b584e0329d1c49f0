mod record;
mod state_machine;

pub use record::CompletionRecord;
pub use state_machine::CompletionStateMachine;

//! `tesisview-core` — the analysis session state machine.
//!
//! One [`Workflow`] owns one [`WorkflowState`]. Views read the state and
//! send intents back as method calls; nothing else writes to it.
//!
//! Requests are issued as tickets so the network call can run on another
//! thread. Responses that arrive after a `reset()` (or for a request that is
//! no longer in flight) are dropped.

pub mod error;
pub mod state;
pub mod workflow;

pub use error::WorkflowError;
pub use state::{Failure, Operation, Phase, WorkflowState};
pub use workflow::{Completion, PendingQuery, PendingUpload, Ticket, Workflow};

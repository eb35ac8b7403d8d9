mod agent;
mod context;
mod executor;

pub use agent::GraphAgent;
pub use context::Context;
pub use executor::{DEFAULT_MAX_STEPS, GraphExecutor, NodeInvoker, RunOutcome, RunStatus};

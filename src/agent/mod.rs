//! Agent module - the crew and the session it serves
//!
//! Role-configured agents, their tasks, the collaborator contracts the
//! session loop depends on, and the session state itself.

pub mod crew;
pub mod loop_state;
pub mod output_log;
pub mod role;
pub mod session;
pub mod task;
pub mod units;

pub use crew::Crew;
pub use loop_state::AgentLoopState;
pub use output_log::OutputLog;
pub use role::{CrewAgent, CrewAgentBuilder};
pub use session::{Session, SessionState};
pub use task::TaskSpec;
pub use units::{Advisor, Reporter};

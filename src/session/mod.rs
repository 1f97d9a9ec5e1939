//! Session lifecycle: the pure state machine and the coordinator driving it.

mod coordinator;
mod state;

pub use coordinator::{SessionCoordinator, SessionHandle, SessionHosts, SessionSignals};
pub use state::{transition, LoadGeneration, SessionEvent, SessionPage, SessionState, SideEffect};

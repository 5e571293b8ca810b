//! Client-side state for the TaskFlow UI: the session state machine, route
//! guards, and the task list view. Transport and rendering live in the host;
//! these types consume API results and produce the next state.

pub mod guard;
pub mod session;
pub mod view;

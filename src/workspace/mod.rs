//! Multi-document state container and command reducer.
//!
//! [`AppState`] owns one document and one session per open document and
//! knows which one is current. Every user intent is a [`Command`];
//! [`reduce`] applies one to a state and returns the next state, leaving the
//! input untouched.

mod command;
mod state;

pub use command::{reduce, Command, Outcome, Transition};
pub use state::AppState;

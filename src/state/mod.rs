//! Client-side session state.

pub mod session;

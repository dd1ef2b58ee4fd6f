//! Host capabilities injected into the client.
//!
//! SYSTEM CONTEXT
//! ==============
//! `storage` abstracts the durable key-value store and `navigation`
//! abstracts the browser location. Both are traits so tests and non-browser
//! hosts can substitute their own implementations.

pub mod navigation;
pub mod storage;

//! Network layer.

pub mod listener;

pub use listener::{BoundedListener, LimitedStream};

//! Store layer - the byte region and the gate that guards it.
//!
//! - [`BufferStore`] - Growable zero-filled byte region
//! - [`AccessGate`] - Interruptible mutual exclusion

mod access_gate;
mod buffer_store;

pub use access_gate::AccessGate;
pub use buffer_store::{BufferStore, Growth};

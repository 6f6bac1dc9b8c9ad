//! Object model: type descriptors, instances, handles and dispatch.
//!
//! Types form an explicit ancestor graph. Each type owns a table of slots,
//! and calls made through a [`Handle`](handle::Handle) are resolved against
//! that graph to the most-derived implementation.

pub mod capability;
pub mod descriptor;
pub mod handle;
pub mod instance;
pub mod registry;
pub mod resolve;

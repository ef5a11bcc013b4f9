pub mod handle;
pub mod names;
pub mod publisher;

#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

mod completion;
pub use self::completion::{completion, Completion, CompletionWaiter};

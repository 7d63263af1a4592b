//! Recipe pipeline: validation, persistence and rendering for the recipe
//! service, plus the user relationship layer built on top of it.
//!
//! Every entry point takes a database connection and, where the result
//! depends on who is asking, an explicit [`Viewer`].

pub mod catalog;
pub mod error;
pub mod image;
pub mod markers;
pub mod paging;
pub mod recipe;
pub mod render;
pub mod shopping_list;
pub mod subscriptions;
pub mod users;
pub mod viewer;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{PipelineError, Result};
pub use viewer::Viewer;

//! Application layer: the engine facade, the render pipeline and the
//! storage seam they sit on.

pub mod error;
pub mod page;
pub mod render;
pub mod repos;

pub use error::EngineError;
pub use page::{ContentEngine, ContentEngineBuilder};
pub use repos::{PageStore, RepoError};

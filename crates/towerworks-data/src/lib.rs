pub mod loader;
pub mod schema;

pub use loader::{Content, DataLoadError, load_content};

pub mod sanitize;
pub mod wordpress;

pub use wordpress::WordPressRegistry;

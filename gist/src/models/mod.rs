mod document;
mod upload;

pub use document::*;
pub use upload::*;

mod dispatcher;
mod extraction;

pub mod extractors;

pub use dispatcher::Dispatcher;
pub use extraction::Extraction;
pub use extractors::TextExtractor;

pub mod document;
pub mod token;

pub use document::Document;

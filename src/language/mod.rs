// Types representing specification documents and the two languages embedded
// in them: algorithm steps and grammar notation.

mod algorithm;
mod document;
mod error;
mod grammar;

// Re-export all public symbols
pub use algorithm::*;
pub use document::*;
pub use error::*;
pub use grammar::*;

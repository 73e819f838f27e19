#[macro_use]
mod regex;

pub mod language;
pub mod linting;
pub mod parsing;
pub mod problem;
pub mod rendering;

//! Renderer for colourizing diagnostics on a terminal

use owo_colors::OwoColorize;

use crate::rendering::*;

/// Embellish fragments with ANSI escapes for terminal output.
pub struct Terminal;

impl Render for Terminal {
    fn style(&self, syntax: Syntax, content: &str) -> String {
        match syntax {
            Syntax::Neutral => content.to_string(),
            Syntax::Error => content
                .bright_red()
                .to_string(),
            Syntax::Filename => content.to_string(),
            Syntax::Problem => content
                .bold()
                .to_string(),
            Syntax::Rule => content // grey
                .color(owo_colors::Rgb(0x99, 0x99, 0x99))
                .to_string(),
            Syntax::Gutter => content
                .bright_blue()
                .to_string(),
            Syntax::Excerpt => content.to_string(),
            Syntax::Caret => content
                .bright_red()
                .bold()
                .to_string(),
        }
    }
}

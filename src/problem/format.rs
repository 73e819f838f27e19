use crate::language::{Document, LoadingError};
use crate::problem::{generate_details, Report};
use crate::rendering::{Render, Syntax};

/// Format a report with full details including source code context
pub fn full_report(report: &Report, document: &Document, renderer: &impl Render) -> String {
    let details = generate_details(report.rule, renderer);

    let code = document
        .source(report.source)
        .text
        .lines()
        .nth(
            report
                .line
                .saturating_sub(1),
        )
        .unwrap_or("?");

    let width = 3.max(
        report
            .line
            .to_string()
            .len(),
    );

    let caret = format!(
        "{}{}",
        " ".repeat(
            report
                .column
                .saturating_sub(1)
        ),
        renderer.style(Syntax::Caret, "^")
    );

    format!(
        r#"
{}: {}:{}:{} {} {}

{:width$} {}
{} {} {}
{:width$} {} {}

{}
        "#,
        renderer.style(Syntax::Error, "error"),
        renderer.style(
            Syntax::Filename,
            &report
                .file
                .to_string_lossy()
        ),
        report.line,
        report.column,
        renderer.style(Syntax::Problem, &report.message),
        renderer.style(Syntax::Rule, &format!("[{}]", report.rule)),
        ' ',
        renderer.style(Syntax::Gutter, "|"),
        renderer.style(Syntax::Gutter, &format!("{:>width$}", report.line)),
        renderer.style(Syntax::Gutter, "|"),
        renderer.style(Syntax::Excerpt, code),
        ' ',
        renderer.style(Syntax::Gutter, "|"),
        caret,
        details
    )
    .trim_ascii()
    .to_string()
}

/// Format a report with concise single-line output
pub fn concise_report(report: &Report, renderer: &impl Render) -> String {
    format!(
        "{}: {}:{}:{} {} {}",
        renderer.style(Syntax::Error, "error"),
        renderer.style(
            Syntax::Filename,
            &report
                .file
                .to_string_lossy()
        ),
        report.line,
        report.column,
        renderer.style(Syntax::Problem, &report.message),
        renderer.style(Syntax::Rule, &format!("[{}]", report.rule)),
    )
}

/// Format a LoadingError with concise single-line output
pub fn concise_loading_error(error: &LoadingError, renderer: &impl Render) -> String {
    format!(
        "{}: {}: {}",
        renderer.style(Syntax::Error, "error"),
        renderer.style(
            Syntax::Filename,
            &error
                .filename
                .to_string_lossy()
        ),
        renderer.style(Syntax::Problem, &error.to_string())
    )
}

/// Serialize reports as a JSON array.
pub fn json_reports(reports: &[Report]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(reports)
}

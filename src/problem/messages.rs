use crate::rendering::{Render, Syntax};

/// Generate the longer explanation shown beneath a diagnostic in full
/// output. Rules without anything useful to add return an empty String.
pub fn generate_details(rule: &str, renderer: &dyn Render) -> String {
    match rule {
        "algorithm-line-style" => format!(
            r#"
Each kind of step has a required shape. Steps without substeps end with a
period; steps with substeps end with a colon, except for conditionals and
loops:

    {}
    {}
    {}
    {}
            "#,
            renderer.style(Syntax::Excerpt, "1. If _x_ is *true*, then"),
            renderer.style(Syntax::Excerpt, "1. Else,"),
            renderer.style(Syntax::Excerpt, "1. Repeat, while _k_ < _len_,"),
            renderer.style(Syntax::Excerpt, "1. For each element _e_ of _list_, do"),
        )
        .trim_ascii()
        .to_string(),
        "algorithm-step-numbering" => r#"
Ordered steps are all written as "1." and numbered when the document is
rendered, so that inserting a step doesn't require renumbering its siblings.
        "#
        .trim_ascii()
        .to_string(),
        "algorithm-step-labels" => format!(
            r#"
Labels on steps are referenced from elsewhere in the document and must begin
with "step-", as in {}.
            "#,
            renderer.style(Syntax::Excerpt, r#"[id="step-foo"]"#),
        )
        .trim_ascii()
        .to_string(),
        "unknown-step-attribute" => r#"
The attributes a step may carry are "id", "fence-effects", and "declared".
        "#
        .trim_ascii()
        .to_string(),
        "enum-casing" => format!(
            r#"
Enum values are lowercase words separated by hyphens, for example {}.
            "#,
            renderer.style(Syntax::Excerpt, "~not-a-number~"),
        )
        .trim_ascii()
        .to_string(),
        "for-each-element" => format!(
            r#"
The variable introduced by a "For each" step must be preceded by its type, or
by the word "element" if it has none:

    {}
            "#,
            renderer.style(Syntax::Excerpt, "1. For each String _s_ of _names_, do"),
        )
        .trim_ascii()
        .to_string(),
        "if-else-consistency" => r#"
When an "If" step is immediately followed by an "Else", either both of them
have substeps or neither does.
        "#
        .trim_ascii()
        .to_string(),
        "use-before-def" => r#"
Every variable must be declared (with "Let", as a parameter, as the variable
of a loop, or with a declared="…" annotation on the step) before it is
referenced.
        "#
        .trim_ascii()
        .to_string(),
        "re-declaration" => r#"
A variable may only be declared once at a given level of an algorithm. To
change its value use "Set" instead of "Let".
        "#
        .trim_ascii()
        .to_string(),
        "unused-declaration" | "unused-capture" => r#"
The variable is declared but never referenced afterwards.
        "#
        .trim_ascii()
        .to_string(),
        "bad-ac" => format!(
            r#"
Abstract closures list their parameters and captures explicitly:

    {}
            "#,
            renderer.style(
                Syntax::Excerpt,
                "1. Let _closure_ be a new Abstract Closure with parameters (_x_) that captures _y_ and performs the following steps when called:"
            ),
        )
        .trim_ascii()
        .to_string(),
        "undefined-nonterminal" => r#"
Grammar used with syntax-directed operations and early errors must match a
production given in a grammar definition elsewhere in the document.
Optional symbols and restrictions of the definition may be left out.
        "#
        .trim_ascii()
        .to_string(),
        "NLTH-in-SDO" | "guard-in-SDO" => r#"
Restrictions like [no LineTerminator here] and parameter guards belong in the
grammar definition only, not where the production is referenced.
        "#
        .trim_ascii()
        .to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::rendering::Identity;

    #[test]
    fn details_for_known_rules() {
        let details = generate_details("enum-casing", &Identity);
        assert!(details.contains("~not-a-number~"));

        let details = generate_details("spelling", &Identity);
        assert_eq!(details, "");
    }
}

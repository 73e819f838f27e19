#[cfg(test)]
mod grammar {
    use std::path::Path;

    use speclint::linting::{self, Options};
    use speclint::parsing::{markup, GrammarReader, StepReader};
    use speclint::problem::Report;

    fn lint(content: &str) -> Vec<Report> {
        let document = markup::read(Path::new("test.html"), content.to_string());
        linting::lint(&document, &Options::default(), &StepReader, &GrammarReader)
    }

    fn rules(reports: &[Report]) -> Vec<&str> {
        reports
            .iter()
            .map(|report| report.rule)
            .collect()
    }

    #[test]
    fn early_errors_must_match_a_definition() {
        let reports = lint(
            r#"
<emu-grammar type="definition">Foo : `a`</emu-grammar>
<emu-clause id="sec-foo-early-errors">
  <h1>Static Semantics: Early Errors</h1>
  <emu-grammar>Foo : `a` `b`</emu-grammar>
  <ul>
    <li>It is a Syntax Error if this production is present.</li>
  </ul>
</emu-clause>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["undefined-nonterminal"]);
        assert_eq!((reports[0].line, reports[0].column), (4, 22));
    }

    #[test]
    fn optional_symbols_may_be_omitted() {
        let definition = r#"
<emu-grammar type="definition">
  Foo :
    `a` Bar? `c`

  Bar :
    `b`
</emu-grammar>
        "#
        .trim_ascii();

        for fragment in ["`a` Bar `c`", "`a` `c`"] {
            let content = format!(
                "{}\n<emu-grammar>Foo : {}</emu-grammar>\n<emu-alg>\n  1. Return *true*.\n</emu-alg>",
                definition, fragment
            );
            assert_eq!(lint(&content), vec![]);
        }

        let content = format!(
            "{}\n<emu-grammar>Foo : `a` `d` `c`</emu-grammar>\n<emu-alg>\n  1. Return *true*.\n</emu-alg>",
            definition
        );
        assert_eq!(rules(&lint(&content)), vec!["undefined-nonterminal"]);
    }

    #[test]
    fn unused_parameters_mentioned_by_fragments() {
        let reports = lint(
            r#"
<emu-grammar type="definition">
  Foo[In] :
    `a`
</emu-grammar>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["grammar:unused-parameter"]);
        assert_eq!((reports[0].line, reports[0].column), (2, 7));

        let reports = lint(
            r#"
<emu-grammar type="definition">
  Foo[In] :
    `a`
</emu-grammar>
<emu-grammar>Foo[In] : `a`</emu-grammar>
<emu-alg>
  1. Return *true*.
</emu-alg>
            "#
            .trim_ascii(),
        );
        assert_eq!(reports, vec![]);
    }

    #[test]
    fn malformed_early_errors_stop_everything_else() {
        let reports = lint(
            r#"
<emu-clause id="sec-foo-early-errors">
  <h1>Static Semantics: Early Errors</h1>
  <ul>
    <li>It is a Syntax Error if this production is present.</li>
  </ul>
</emu-clause>
<emu-alg>
  1. Return _undeclared_
</emu-alg>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["early-error-shape"]);
        assert_eq!((reports[0].line, reports[0].column), (3, 3));
    }

    #[test]
    fn malformed_early_errors_discard_other_structure_problems() {
        let reports = lint(
            r#"
<emu-clause id="sec-a">
  <h1>A</h1>
  <emu-alg>1. Return 1.
</emu-clause>
<emu-clause id="sec-b">
  <h1>Static Semantics: Early Errors</h1>
  <ul><li>It is a Syntax Error if this production is present.</li></ul>
</emu-clause>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["early-error-shape"]);
        assert_eq!((reports[0].line, reports[0].column), (7, 3));
    }

    #[test]
    fn missing_close_tag() {
        let reports = lint(
            r#"
<emu-clause id="sec-foo">
  <h1>Foo</h1>
  <emu-grammar type="definition">Foo : `a`
</emu-clause>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["missing-close-tag"]);
        assert_eq!((reports[0].line, reports[0].column), (3, 3));
    }

    #[test]
    fn restrictions_in_fragments() {
        let reports = lint(
            r#"
<emu-grammar type="definition">
  Statement :
    `return` [no LineTerminator here] Expression
</emu-grammar>
<emu-grammar type="definition">
  Expression :
    `x`
</emu-grammar>
<emu-grammar>Statement : `return` [no LineTerminator here] Expression</emu-grammar>
<emu-alg>
  1. Return *true*.
</emu-alg>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["NLTH-in-SDO"]);
    }
}

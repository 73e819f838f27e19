#[cfg(test)]
mod algorithms {
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
    fn single_line_if() {
        let reports = lint(
            r#"
<emu-clause id="sec-example">
  <h1>Example ( _x_ )</h1>
  <emu-alg>
    1. If _x_ is *true*, return *true*.
    1. Return *false*.
  </emu-alg>
</emu-clause>
            "#
            .trim_ascii(),
        );
        assert_eq!(reports, vec![]);

        let reports = lint(
            r#"
<emu-clause id="sec-example">
  <h1>Example ( _x_ )</h1>
  <emu-alg>
    1. If _x_ is *true*, return *true*
    1. Return *false*.
  </emu-alg>
</emu-clause>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["algorithm-line-style"]);
        assert_eq!(reports[0].line, 4);
        assert_eq!(reports[0].column, 39);
    }

    #[test]
    fn redeclaration() {
        let reports = lint(
            r#"
<emu-alg>
  1. Let _x_ be 1.
  1. Let _x_ be 2.
  1. Return _x_.
</emu-alg>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["re-declaration"]);
        assert_eq!((reports[0].line, reports[0].column), (3, 10));
        assert_eq!(reports[0].message, "\"x\" is already declared");
    }

    #[test]
    fn enum_casing() {
        let reports = lint("<emu-alg>\n  1. Return ~Done~.\n</emu-alg>");
        assert_eq!(rules(&reports), vec!["enum-casing"]);
        assert_eq!((reports[0].line, reports[0].column), (2, 13));

        let reports = lint("<emu-alg>\n  1. Return ~done~.\n</emu-alg>");
        assert_eq!(reports, vec![]);
    }

    #[test]
    fn loop_variables_are_scoped_to_their_step() {
        let reports = lint(
            r#"
<emu-alg>
  1. Let _list_ be « ».
  1. For each element _e_ of _list_, do
    1. Perform Foo(_e_).
  1. Return _e_.
</emu-alg>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["use-before-def"]);
        assert_eq!((reports[0].line, reports[0].column), (5, 13));
    }

    #[test]
    fn unused_declaration_at_the_declaring_token() {
        let reports = lint(
            r#"
<emu-alg>
  1. Let _unused_ be 1.
  1. Return *true*.
</emu-alg>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["unused-declaration"]);
        assert_eq!((reports[0].line, reports[0].column), (2, 10));
        assert_eq!(
            reports[0].message,
            "\"unused\" is declared here, but never referred to"
        );
    }

    #[test]
    fn conditionals_with_else() {
        let reports = lint(
            r#"
<emu-clause id="sec-example">
  <h1>Example ( _x_ )</h1>
  <emu-alg>
    1. If _x_ is *true*, then
      1. Return 1.
    1. Else, return 2.
  </emu-alg>
</emu-clause>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["if-else-consistency"]);
        assert_eq!((reports[0].line, reports[0].column), (6, 8));
    }

    #[test]
    fn closures() {
        let reports = lint(
            r#"
<emu-clause id="sec-make-adder">
  <h1>MakeAdder ( _x_ )</h1>
  <emu-alg>
    1. Let _adder_ be a new Abstract Closure with parameters (_y_) that captures _x_ and performs the following steps when called:
      1. Return _x_ + _y_.
    1. Return _adder_.
  </emu-alg>
</emu-clause>
            "#
            .trim_ascii(),
        );
        assert_eq!(reports, vec![]);

        let reports = lint(
            r#"
<emu-clause id="sec-make-adder">
  <h1>MakeAdder ( _x_, _z_ )</h1>
  <emu-alg>
    1. Let _adder_ be a new Abstract Closure with parameters (_y_) that captures _x_ and _z_ and performs the following steps when called:
      1. Return _x_ + _y_.
    1. Return _adder_.
  </emu-alg>
</emu-clause>
            "#
            .trim_ascii(),
        );
        assert_eq!(rules(&reports), vec!["unused-capture"]);
    }

    #[test]
    fn annex_algorithms_are_not_scope_checked() {
        let reports = lint(
            r#"
<emu-annex id="sec-additional-ecmascript-features-for-web-browsers">
  <h1>Additional ECMAScript Features for Web Browsers</h1>
  <emu-alg>
    1. Return _legacy_.
  </emu-alg>
</emu-annex>
            "#
            .trim_ascii(),
        );
        assert_eq!(reports, vec![]);
    }

    #[test]
    fn output_is_sorted() {
        let reports = lint(
            r#"
<emu-clause id="sec-example">
  <h1>Example( _x_ )</h1>
  <emu-alg>
    1. Let _y_ be the behaviour of _x_
    2. Return _z_.
  </emu-alg>
</emu-clause>
            "#
            .trim_ascii(),
        );

        assert_eq!(
            rules(&reports),
            vec![
                "header-format",
                "unused-declaration",
                "spelling",
                "algorithm-line-style",
                "algorithm-step-numbering",
                "use-before-def",
            ]
        );

        let positions: Vec<(usize, usize)> = reports
            .iter()
            .map(|report| (report.line, report.column))
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }
}

//! Checks on the headers of clauses defining operations, which should look
//! like `Name ( _a_ [ , _b_ ] )`.

use crate::language::*;
use crate::linting::collect::Header;
use crate::problem::Problems;

pub(crate) fn check(document: &Document, headers: &[Header], problems: &mut Problems) {
    for header in headers {
        if header.in_annex {
            continue;
        }
        let text = document.text_content_excluding(header.element, "del");
        check_header(document, header.element, &text, problems);
    }
}

fn valid_name(name: &str) -> bool {
    // Runtime Semantics: Foo
    regex!(r"^(?:Runtime|Static) Semantics: [A-Z][A-Za-z0-9/]*$").is_match(name)
        // Number::add
        || regex!(r"^[A-Z][A-Za-z0-9]*::[a-z][A-Za-z0-9]*$").is_match(name)
        // [[GetOwnProperty]]
        || regex!(r"^\[\[[A-Z][A-Za-z0-9]*\]\]$").is_match(name)
        // _NativeError_
        || regex!(r"^_[A-Z][A-Za-z0-9]*_$").is_match(name)
        // Object.fromEntries, ForIn/OfHeadEvaluation, Function.prototype [ @@hasInstance ]
        || regex!(
            r"^[A-Za-z][A-Za-z0-9]*(?:\.[A-Za-z][A-Za-z0-9]*|\.__[a-z][A-Za-z0-9]*__| \[ @@[a-z][a-zA-Z]+ \]|/[A-Za-z][A-Za-z0-9]*)*$"
        )
        .is_match(name)
        // %TypedArray%.prototype.set
        || regex!(
            r"^%[A-Z][A-Za-z0-9]*%(?:\.[A-Za-z][A-Za-z0-9]*|\.__[a-z][A-Za-z0-9]*__| \[ @@[a-z][a-zA-Z]+ \])*$"
        )
        .is_match(name)
}

fn valid_parameters(parameters: &str) -> bool {
    // Foo ( )
    parameters == " "
        // Object ( . . . )
        || parameters == " . . . "
        // String.raw ( _template_, ..._substitutions_ )
        || regex!(r"^ (?:_[A-Za-z0-9]+_, )*\.\.\._[A-Za-z0-9]+_ $").is_match(parameters)
        // Function ( _p1_, _p2_, … , _pn_, _body_ )
        || regex!(r"^ (?:_[A-Za-z0-9]+_, )*… (?:, _[A-Za-z0-9]+_)+ $").is_match(parameters)
        // Example ( _foo_ [ , _bar_ ] ) and Example ( [ _foo_ ] )
        || regex!(r"^ (?:\[ )?_[A-Za-z0-9]+_(?:, _[A-Za-z0-9]+_)*(?: \[ , _[A-Za-z0-9]+_)*(?: \])* $")
            .is_match(parameters)
}

fn check_header(document: &Document, element: NodeId, text: &str, problems: &mut Problems) {
    let leading = text.len()
        - text
            .trim_start()
            .len();
    let contents = text.trim();

    if !contents.ends_with(')') || regex!(r" Operator \( `[^`]+` \)$").is_match(contents) {
        return;
    }
    let open = match contents.find('(') {
        Some(open) => open,
        None => return,
    };

    let report = |problems: &mut Problems, index: usize, message: String| {
        let offset = document
            .text_index_to_offset(element, "del", leading + index)
            .unwrap_or(0);
        problems.at("header-format", message, element, offset);
    };

    let name = &contents[..open];
    let trimmed = name.trim_end();

    if name.len() - trimmed.len() != 1 || !name.ends_with(' ') {
        report(
            problems,
            trimmed.len(),
            "expected header to have a single space before the argument list".to_string(),
        );
    } else if !valid_name(trimmed) {
        report(
            problems,
            0,
            format!(
                "expected operation to have a name like 'Example', 'Runtime Semantics: Foo', 'Example.prop', etc, but found {:?}",
                trimmed
            ),
        );
    }

    let parameters = &contents[open + 1..contents.len() - 1];
    if !valid_parameters(parameters) {
        report(
            problems,
            open + 1,
            "expected parameter list to look like '( _a_ [ , _b_ ] )', '( _foo_, _bar_, ..._baz_ )', '( _foo_, … , _bar_ )', or '( . . . )'"
                .to_string(),
        );
    }
}

#[cfg(test)]
mod check {
    use super::*;
    use crate::parsing::markup;
    use crate::problem::Location;
    use std::path::Path;

    fn run(header: &str) -> Vec<(String, usize)> {
        let content = format!("<h1>{}</h1>", header);
        let document = markup::read(Path::new("test.html"), content);
        let element = (0..document.node_count())
            .map(NodeId)
            .find(|id| document.is(*id, "h1"))
            .unwrap();

        let mut problems = Problems::new();
        check(
            &document,
            &[Header {
                element,
                in_annex: false,
            }],
            &mut problems,
        );

        problems
            .into_diagnostics()
            .into_iter()
            .map(|diagnostic| match diagnostic.location {
                Location::Node { offset, .. } => (diagnostic.message, offset),
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn acceptable_headers() {
        assert!(run("ToNumber ( _argument_ )").is_empty());
        assert!(run("Runtime Semantics: Evaluation ( )").is_empty());
        assert!(run("Number::add ( _x_, _y_ )").is_empty());
        assert!(run("[[GetOwnProperty]] ( _P_ )").is_empty());
        assert!(run("_NativeError_ ( _message_ [ , _options_ ] )").is_empty());
        assert!(run("Object ( . . . )").is_empty());
        assert!(run("String.raw ( _template_, ..._substitutions_ )").is_empty());
        assert!(run("Function ( _p1_, _p2_, … , _pn_, _body_ )").is_empty());
        assert!(run("Array.prototype [ @@iterator ] ( )").is_empty());
        assert!(run("%TypedArray%.prototype.set ( _source_ [ , _offset_ ] )").is_empty());
        assert!(run("Example ( [ _foo_ ] )").is_empty());
    }

    #[test]
    fn headers_without_parameters_are_ignored() {
        assert!(run("Introduction").is_empty());
        assert!(run("The Addition Operator ( `+` )").is_empty());
    }

    #[test]
    fn spacing() {
        let found = run("ToNumber( _argument_ )");
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].0,
            "expected header to have a single space before the argument list"
        );
        assert_eq!(found[0].1, 12);

        let found = run("ToNumber  ( _argument_ )");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn bad_names_and_parameters() {
        let found = run("to number ( _argument_ )");
        assert_eq!(found.len(), 1);
        assert!(found[0]
            .0
            .starts_with("expected operation to have a name"));
        assert_eq!(found[0].1, 4);

        let found = run("ToNumber (_argument_)");
        assert_eq!(found.len(), 1);
        assert!(found[0]
            .0
            .starts_with("expected parameter list"));
        assert_eq!(found[0].1, 14);

        let found = run("to number (argument)");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn deleted_text_is_ignored() {
        assert!(run("ToNumber ( _argument_<del>, _extra_</del> )").is_empty());
    }
}

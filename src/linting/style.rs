//! Checks on the form of individual algorithm steps: how each kind of step
//! begins and ends, and the attributes, labels, and enum values it carries.

use crate::language::*;
use crate::linting::Cache;
use crate::problem::Problems;

const ATTRIBUTES: &[&str] = &["id", "fence-effects", "declared"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Category {
    If,
    Else,
    Repeat,
    ForEach,
    Freeform,
}

/// Classify a step by the text it begins with.
pub(crate) fn classify(first: &str) -> Category {
    if first.starts_with("If ") || first.starts_with("Else if ") {
        Category::If
    } else if regex!(r"^(?:Else|Otherwise)\b").is_match(first) {
        Category::Else
    } else if regex!(r"^Repeat\b").is_match(first) {
        Category::Repeat
    } else if first.starts_with("For each ") {
        Category::ForEach
    } else {
        Category::Freeform
    }
}

fn ends_with_any(text: &str, endings: &[&str]) -> bool {
    endings
        .iter()
        .any(|ending| text.ends_with(ending))
}

pub(crate) fn check(
    list: &StepList<'_>,
    cache: &Cache<'_>,
    element: NodeId,
    base: usize,
    problems: &mut Problems,
) {
    let mut checker = StyleChecker {
        element,
        base,
        problems,
    };
    checker.check_list(list, cache);
}

struct StyleChecker<'a> {
    element: NodeId,
    /// Offset of the algorithm's markup within its source.
    base: usize,
    problems: &'a mut Problems,
}

impl<'a> StyleChecker<'a> {
    fn report(&mut self, rule: &'static str, message: impl Into<String>, offset: usize) {
        self.problems
            .at(rule, message, self.element, self.base + offset);
    }

    fn check_list(&mut self, list: &StepList<'_>, cache: &Cache<'_>) {
        for (i, step) in list
            .steps
            .iter()
            .enumerate()
        {
            self.check_numbering(list.kind, step);
            self.check_attributes(step);

            if let Some(seq) = cache.get(&step.id) {
                if list.kind == ListKind::Ordered {
                    self.check_line(step, seq);
                }
                self.check_enums(seq);
                self.check_for_each(seq);

                if let Some(next) = list
                    .steps
                    .get(i + 1)
                {
                    if let Some(following) = cache.get(&next.id) {
                        self.check_if_else(step, seq, next, following);
                    }
                }
            }

            if let Some(sublist) = &step.sublist {
                self.check_list(sublist, cache);
            }
        }
    }

    fn check_numbering(&mut self, kind: ListKind, step: &Step<'_>) {
        if kind == ListKind::Ordered && step.marker.text != "1." {
            self.report(
                "algorithm-step-numbering",
                format!(
                    "expected step number to be \"1.\" (found {:?})",
                    step.marker.text
                ),
                step.marker.offset,
            );
        }
    }

    fn check_attributes(&mut self, step: &Step<'_>) {
        for attribute in &step.attributes {
            let key = attribute
                .key
                .text;

            if !ATTRIBUTES.contains(&key) {
                self.report(
                    "unknown-step-attribute",
                    format!("unknown step attribute {:?}", key),
                    attribute
                        .key
                        .offset,
                );
                continue;
            }

            if key == "id"
                && !attribute
                    .value
                    .text
                    .starts_with("step-")
            {
                self.report(
                    "algorithm-step-labels",
                    "step labels should start with \"step-\"",
                    attribute
                        .value
                        .offset,
                );
            }
        }
    }

    fn check_line(&mut self, step: &Step<'_>, seq: &Seq<'_>) {
        let content = step.content;
        let start = content.offset;
        let end = content.end();
        let has_substeps = step
            .sublist
            .is_some();

        if seq
            .items
            .is_empty()
        {
            self.report("algorithm-line-style", "empty step", start);
            return;
        }

        // lines ending in <pre> tags carry no terminator
        if let Some(Item::Opaque(last)) = seq
            .items
            .last()
        {
            if last.text == "</pre>" {
                if has_substeps {
                    self.report(
                        "algorithm-line-style",
                        "lines ending in <pre> tags must not have substeps",
                        end,
                    );
                }
                return;
            }
        }

        if content
            .text
            .ends_with("</figure>")
        {
            if let Some(figure) = opening_figure(content.text) {
                let before = content.text[..figure].trim_end();
                if !before.ends_with(':') {
                    self.report(
                        "algorithm-line-style",
                        "expected line with figure to end with \":\"",
                        start + before.len(),
                    );
                }
            }
            return;
        }

        let first = seq.first_text();
        let last = seq.last_text();

        match classify(first) {
            Category::If => {
                if let Some(sublist) = &step.sublist {
                    if sublist.kind == ListKind::Ordered {
                        if let Some(before) = content
                            .text
                            .strip_suffix("; then")
                        {
                            if !before.contains(',') {
                                self.report(
                                    "algorithm-line-style",
                                    "expected \"If\" with substeps to end with \", then\" rather than \"; then\" when there are no other commas",
                                    end,
                                );
                            }
                        } else if !last.ends_with(", then") {
                            self.report(
                                "algorithm-line-style",
                                "expected \"If\" with substeps to end with \", then\"",
                                end,
                            );
                        }
                    } else if !last.ends_with(':') {
                        self.report(
                            "algorithm-line-style",
                            "expected \"If\" with list of substeps to end with \":\"",
                            end,
                        );
                    }
                } else {
                    if !ends_with_any(&last, &[".", ".)", ":"]) {
                        self.report(
                            "algorithm-line-style",
                            "expected \"If\" without substeps to end with \".\" or \":\"",
                            end,
                        );
                    }
                    if let Some(i) = content
                        .text
                        .find(", then ")
                    {
                        self.report(
                            "algorithm-line-style",
                            "single-line \"If\" steps should not have a \"then\"",
                            start + i,
                        );
                    }
                }
            }
            Category::Else => {
                if has_substeps {
                    if first == "Else,"
                        && seq
                            .items
                            .len()
                            == 1
                    {
                        return;
                    }
                    if !last.ends_with(',') {
                        self.report(
                            "algorithm-line-style",
                            "expected \"Else\" with substeps to end with \",\"",
                            end,
                        );
                    }
                } else if !ends_with_any(&last, &[".", ".)", ":"]) {
                    self.report(
                        "algorithm-line-style",
                        "expected \"Else\" without substeps to end with \".\" or \":\"",
                        end,
                    );
                }
            }
            Category::Repeat => {
                if !has_substeps {
                    self.report(
                        "algorithm-line-style",
                        "expected \"Repeat\" to have substeps",
                        start,
                    );
                }
                let bare = first == "Repeat,"
                    && seq
                        .items
                        .len()
                        == 1;
                if !bare
                    && !first.starts_with("Repeat, while ")
                    && !first.starts_with("Repeat, until ")
                {
                    self.report(
                        "algorithm-line-style",
                        "expected \"Repeat\" to start with \"Repeat, while \" or \"Repeat, until \"",
                        start,
                    );
                }
                if !last.ends_with(',') {
                    self.report(
                        "algorithm-line-style",
                        "expected \"Repeat\" to end with \",\"",
                        end,
                    );
                }
            }
            Category::ForEach => {
                if has_substeps {
                    if !last.ends_with(", do") {
                        self.report(
                            "algorithm-line-style",
                            "expected \"For each\" with substeps to end with \", do\"",
                            end,
                        );
                    }
                } else if !ends_with_any(&last, &[".", ".)"]) {
                    self.report(
                        "algorithm-line-style",
                        "expected \"For each\" without substeps to end with \".\"",
                        end,
                    );
                }
            }
            Category::Freeform => {
                if regex!(r"^(?i)note:").is_match(first) && !first.starts_with("NOTE:") {
                    self.report(
                        "algorithm-line-style",
                        "\"NOTE:\" should be fully capitalized",
                        start,
                    );
                }
                if regex!(r"^(?i)assert:").is_match(first) && !first.starts_with("Assert:") {
                    self.report(
                        "algorithm-line-style",
                        "\"Assert:\" should be capitalized",
                        start,
                    );
                }

                if has_substeps {
                    if !last.ends_with(':') {
                        self.report(
                            "algorithm-line-style",
                            "expected freeform line with substeps to end with \":\"",
                            end,
                        );
                    }
                } else if !ends_with_any(&last, &[".", ".)"]) {
                    self.report(
                        "algorithm-line-style",
                        "expected freeform line to end with \".\"",
                        end,
                    );
                }
            }
        }
    }

    fn check_enums(&mut self, seq: &Seq<'_>) {
        let mut found = vec![];
        seq.for_each_item(&mut |item| {
            if let Item::Enum(fragment) = item {
                let name = strip_delimiters(fragment.text);
                if !regex!(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").is_match(name) {
                    found.push(fragment.offset);
                }
            }
        });

        for offset in found {
            self.report(
                "enum-casing",
                "enum values should be lowercase and kebab-cased",
                offset,
            );
        }
    }

    fn check_for_each(&mut self, seq: &Seq<'_>) {
        if let [Item::Text(first), Item::Variable(variable), ..] = &seq.items[..] {
            if first.text == "For each " {
                self.report(
                    "for-each-element",
                    "expected \"For each\" to have a type name or \"element\" before the loop variable",
                    variable.offset,
                );
            }
        }
    }

    fn check_if_else(&mut self, step: &Step<'_>, seq: &Seq<'_>, next: &Step<'_>, following: &Seq<'_>) {
        if classify(seq.first_text()) != Category::If {
            return;
        }
        if !regex!(r"^(?:Else|Otherwise)\b").is_match(following.first_text()) {
            return;
        }

        let ours = step
            .sublist
            .is_some();
        let theirs = next
            .sublist
            .is_some();

        if ours != theirs {
            let message = if ours {
                "expected \"Else\" to have substeps, since the preceding \"If\" does"
            } else {
                "expected \"Else\" not to have substeps, since the preceding \"If\" does not"
            };
            self.report(
                "if-else-consistency",
                message,
                next.content
                    .offset,
            );
        }
    }
}

/// Find where the <figure> closing the end of a step opens, scanning
/// backward over the figure tags and counting depth.
fn opening_figure(content: &str) -> Option<usize> {
    let tags: Vec<(usize, bool)> = regex!(r"<(/?)figure[\s>]")
        .captures_iter(content)
        .filter_map(|cap| {
            let m = cap.get(0)?;
            Some((m.start(), !cap[1].is_empty()))
        })
        .collect();

    let mut depth = 0;
    for (start, closing) in tags
        .into_iter()
        .rev()
    {
        if closing {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return Some(start);
            }
        }
    }

    None
}

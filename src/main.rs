use std::io::IsTerminal;
use std::path::Path;

use clap::value_parser;
use clap::{Arg, ArgAction, Command};
use tracing::{debug, Level};

use speclint::language::Document;
use speclint::linting::{self, Options};
use speclint::parsing::{self, GrammarReader, StepReader};
use speclint::problem::{concise_loading_error, concise_report, full_report, json_reports, Report};
use speclint::rendering::{Identity, Render, Terminal};

#[derive(Eq, Debug, PartialEq)]
enum Output {
    Native,
    Json,
}

fn main() {
    const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

    let matches = Command::new("speclint")
        .version(VERSION)
        .propagate_version(true)
        .about("Static analysis for algorithm and grammar markup in specification documents.")
        .disable_help_subcommand(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print diagnostic logging about what the checkers are doing."),
        )
        .subcommand(
            Command::new("check")
                .about("Check the algorithms, grammar, and prose of the given document")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(["native", "json"])
                        .default_value("native")
                        .action(ArgAction::Set)
                        .help("Which kind of diagnostic output to print."),
                )
                .arg(
                    Arg::new("concise")
                        .long("concise")
                        .action(ArgAction::SetTrue)
                        .help("Print one line per diagnostic rather than a source excerpt with an explanation."),
                )
                .arg(
                    Arg::new("raw-control-chars")
                        .short('R')
                        .long("raw-control-chars")
                        .action(ArgAction::SetTrue)
                        .help("Emit ANSI escape codes for colour even if output is redirected to a pipe or file."),
                )
                .arg(
                    Arg::new("annex")
                        .long("annex")
                        .value_parser(value_parser!(String))
                        .action(ArgAction::Set)
                        .help("The id of the annex whose contents are not checked. Defaults to the web browser compatibility annex."),
                )
                .arg(
                    Arg::new("no-spelling")
                        .long("no-spelling")
                        .action(ArgAction::SetTrue)
                        .help("Skip the spelling and whitespace checks."),
                )
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The document you want to check."),
                ),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match matches.subcommand() {
        Some(("check", submatches)) => {
            let output = match submatches
                .get_one::<String>("output")
                .map(String::as_str)
            {
                Some("json") => Output::Json,
                _ => Output::Native,
            };

            let concise = submatches.get_flag("concise");
            let raw_output = submatches.get_flag("raw-control-chars");

            let mut options = Options::default();
            if let Some(annex) = submatches.get_one::<String>("annex") {
                options.annex = annex.clone();
            }
            options.spelling = !submatches.get_flag("no-spelling");

            let filename = match submatches.get_one::<String>("filename") {
                Some(filename) => filename,
                None => std::process::exit(2),
            };

            if filename == "-" {
                eprintln!("error: reading a document from standard input is not supported");
                std::process::exit(2);
            }
            let filename = Path::new(filename);

            debug!(?output, concise, filename = %filename.display());

            let colour = raw_output
                || std::io::stdout()
                    .is_terminal();

            let document = match parsing::load_document(filename) {
                Ok(document) => document,
                Err(error) => {
                    let message = if std::io::stderr().is_terminal() || raw_output {
                        concise_loading_error(&error, &Terminal)
                    } else {
                        concise_loading_error(&error, &Identity)
                    };
                    eprintln!("{}", message);
                    std::process::exit(2);
                }
            };

            let reports = linting::lint(&document, &options, &StepReader, &GrammarReader);

            match output {
                Output::Json => match json_reports(&reports) {
                    Ok(json) => println!("{}", json),
                    Err(error) => {
                        eprintln!("error: {}", error);
                        std::process::exit(2);
                    }
                },
                Output::Native => {
                    if colour {
                        present(&reports, &document, concise, &Terminal);
                    } else {
                        present(&reports, &document, concise, &Identity);
                    }
                }
            }

            if reports.is_empty() {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Some(_) => {
            println!("No valid subcommand was used")
        }
        None => {
            println!("usage: speclint [COMMAND] ...");
            println!("Try '--help' for more information.");
        }
    }
}

fn present(reports: &[Report], document: &Document, concise: bool, renderer: &impl Render) {
    for report in reports {
        if concise {
            println!("{}", concise_report(report, renderer));
        } else {
            println!("{}\n", full_report(report, document, renderer));
        }
    }
}

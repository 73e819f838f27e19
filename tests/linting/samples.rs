#[cfg(test)]
mod samples {
    use std::fs;
    use std::path::{Path, PathBuf};

    use speclint::linting::{self, Options};
    use speclint::parsing::{self, GrammarReader, StepReader};

    fn documents_in(dir: &Path) -> Vec<PathBuf> {
        assert!(dir.exists(), "{:?} directory missing", dir);

        let entries = fs::read_dir(dir).expect("Failed to read directory");

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.expect("Failed to read directory entry");
            let path = entry.path();

            if path
                .extension()
                .and_then(|s| s.to_str())
                == Some("html")
            {
                files.push(path);
            }
        }

        assert!(!files.is_empty(), "No .html files found in {:?}", dir);
        files.sort();
        files
    }

    #[test]
    fn ensure_samples_lint_clean() {
        let files = documents_in(Path::new("tests/samples/"));

        let mut failures = Vec::new();

        for file in &files {
            let document = parsing::load_document(file)
                .unwrap_or_else(|e| panic!("Failed to load file {:?}: {:?}", file, e));

            let reports = linting::lint(&document, &Options::default(), &StepReader, &GrammarReader);
            if !reports.is_empty() {
                println!("File {:?} produced diagnostics: {:#?}", file, reports);
                failures.push(file.clone());
            }
        }

        if !failures.is_empty() {
            panic!(
                "Sample files should lint clean, but {} files had diagnostics",
                failures.len()
            );
        }
    }

    #[test]
    fn ensure_broken_fail() {
        let files = documents_in(Path::new("tests/broken/"));

        let mut unexpected_successes = Vec::new();

        for file in &files {
            let document = parsing::load_document(file)
                .unwrap_or_else(|e| panic!("Failed to load file {:?}: {:?}", file, e));

            let reports = linting::lint(&document, &Options::default(), &StepReader, &GrammarReader);
            if reports.is_empty() {
                println!("File {:?} unexpectedly linted clean", file);
                unexpected_successes.push(file.clone());
            }
        }

        if !unexpected_successes.is_empty() {
            panic!(
                "Broken files should produce diagnostics, but {} files passed",
                unexpected_successes.len()
            );
        }
    }

    #[test]
    fn imports_are_followed() {
        let document = parsing::load_document(Path::new("tests/samples/imports.html"))
            .expect("Failed to load document with imports");

        assert_eq!(
            document
                .sources()
                .count(),
            2
        );
    }
}

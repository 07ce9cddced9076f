use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};

use crate::interpreter::Interpreter;
use crate::{lexer, parser, semantic};

fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}

// Parse and analysis failures are Err; runtime failures are part of the
// observed output, as the driver reports them.
fn run_pipeline(source: &str) -> Result<String> {
    let tokens = lexer::tokenize(source);
    let program = parser::parse_tokens(tokens)?;
    semantic::analyze(&program)?;
    let run = Interpreter::new().run(&program.statements);
    Ok(run.output.join("\n"))
}

#[test]
fn runs_programs_against_expectations() -> Result<()> {
    let programs_dir = Path::new("tests/programs");
    let mut programs = Vec::new();

    for entry in
        fs::read_dir(programs_dir).with_context(|| format!("Reading {}", programs_dir.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("luma") {
            programs.push(path);
        }
    }

    ensure!(
        !programs.is_empty(),
        "No .luma programs found in {}",
        programs_dir.display()
    );
    programs.sort();

    for path in programs {
        let source =
            fs::read_to_string(&path).with_context(|| format!("Reading {}", path.display()))?;

        let expected_error_path = path.with_extension("err");
        if expected_error_path.exists() {
            let expected_error = fs::read_to_string(&expected_error_path)
                .with_context(|| format!("Reading {}", expected_error_path.display()))?;
            let expected_error = expected_error.trim();

            match run_pipeline(&source) {
                Ok(output) => {
                    panic!(
                        "Expected failure for {}, got output '{output}'",
                        path.display()
                    );
                }
                Err(err) => {
                    let error = err.to_string();
                    ensure!(
                        error.contains(expected_error),
                        "Expected error containing '{expected_error}', got '{error}' for {}",
                        path.display()
                    );
                }
            }
            continue;
        }

        let expected_path = path.with_extension("out");
        let expected = fs::read_to_string(&expected_path)
            .with_context(|| format!("Reading {}", expected_path.display()))?;
        let output =
            run_pipeline(&source).with_context(|| format!("Running {}", path.display()))?;
        assert_eq!(
            normalize_output(&output),
            normalize_output(&expected),
            "Output mismatch for {}",
            path.display()
        );
    }

    Ok(())
}

use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result, bail};

use luma::interpreter::Interpreter;
use luma::{lexer, parser, semantic};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let input_path = args.next();
    if args.next().is_some() {
        bail!("Only one input file is supported");
    }

    let source = if let Some(path) = input_path {
        fs::read_to_string(&path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    let tokens = lexer::tokenize(&source);
    let program = parser::parse_tokens(tokens).context("Parsing program")?;
    semantic::analyze(&program).context("Analyzing program")?;

    let run = Interpreter::new().run(&program.statements);
    for line in &run.output {
        println!("{line}");
    }
    Ok(())
}

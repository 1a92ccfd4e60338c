mod cli;
mod logging;

// Standard Library Imports
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

// External Crate Imports
use clap::Parser;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use monomers::{LibraryLoadError, MonomerLibrary};
use peptide::{Convention, Translator};
use rayon::ThreadPoolBuildError;
use rustyline::{DefaultEditor, error::ReadlineError};
use thiserror::Error;
use tracing::{info, warn};

// Local Module Imports
use cli::{Cli, Mode};

fn main() -> ExitCode {
    let cli = Cli::parse();
    run(&cli).unwrap_or_else(|error| {
        render_error(&error);
        ExitCode::FAILURE
    })
}

fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()).map_err(|source| CliError::Write {
        path: cli.log_file.clone().unwrap_or_default(),
        source,
    })?;

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new().num_threads(threads).build_global()?;
    }

    let library = match &cli.library {
        Some(path) => MonomerLibrary::new(path.display().to_string(), read(path)?)?,
        None => MonomerLibrary::default(),
    };
    info!(monomers = library.len(), "loaded monomer library");

    let convention = if cli.legacy { Convention::Legacy } else { Convention::Canonical };
    let translator = Translator::new(&library).with_convention(convention);

    match &cli.input {
        Some(input) if Path::new(input).is_file() => {
            let text = read(Path::new(input))?;
            translate_lines(&translator, cli.mode, &text, cli.id, cli.output.as_deref())
        }
        Some(input) => match translator.translate(cli.mode.into(), input, cli.id) {
            Ok(translation) => {
                write_output(cli.output.as_deref(), &format!("{translation}\n"))?;
                Ok(ExitCode::SUCCESS)
            }
            Err(error) => {
                render_error(&error);
                Ok(ExitCode::FAILURE)
            }
        },
        None => repl(&translator, cli.mode, cli.id),
    }
}

/// Translates every line of `text`, writing one line of output per line of input. Lines that fail are left blank and
/// reported on stderr.
fn translate_lines(
    translator: &Translator,
    mode: Mode,
    text: &str,
    id: u32,
    output: Option<&Path>,
) -> Result<ExitCode, CliError> {
    let lines: Vec<_> = text.lines().collect();
    let results = translator.translate_batch(mode.into(), &lines, id);

    let mut failed = 0;
    let mut translations = String::new();
    for (number, (line, result)) in (1..).zip(lines.into_iter().zip(results)) {
        match result {
            Ok(translation) => translations.push_str(&translation),
            Err(error) => {
                failed += 1;
                render_error(&LineError {
                    number,
                    line: line.to_owned(),
                    causes: vec![error],
                });
            }
        }
        translations.push('\n');
    }
    write_output(output, &translations)?;

    if failed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(failed, "some lines could not be translated");
        Ok(ExitCode::FAILURE)
    }
}

fn repl(translator: &Translator, mode: Mode, id: u32) -> Result<ExitCode, CliError> {
    let mut rl = DefaultEditor::new()?;
    while let Ok(line) = rl.readline(mode.prompt()) {
        rl.add_history_entry(&line)?;
        match translator.translate(mode.into(), &line, id) {
            Ok(translation) => println!("{translation}"),
            Err(error) => render_error(&error),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_owned(),
        source,
    })
}

fn write_output(output: Option<&Path>, text: &str) -> Result<(), CliError> {
    match output {
        Some(path) => fs::write(path, text).map_err(|source| CliError::Write {
            path: path.to_owned(),
            source,
        }),
        None => io::stdout().write_all(text.as_bytes()).map_err(CliError::Stdout),
    }
}

fn render_error(diagnostic: &dyn Diagnostic) {
    let mut buf = String::new();
    if GraphicalReportHandler::new_themed(GraphicalTheme::unicode())
        .render_report(&mut buf, diagnostic)
        .is_err()
    {
        buf = diagnostic.to_string();
    }
    eprintln!("{buf}");
}

#[derive(Debug, Diagnostic, Error)]
enum CliError {
    #[error("failed to read {path:?}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path:?}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to write to stdout")]
    Stdout(#[source] io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Library(#[from] LibraryLoadError),

    #[error("failed to configure the worker thread pool")]
    Threads(#[from] ThreadPoolBuildError),

    #[error("failed to start the interactive prompt")]
    Prompt(#[from] ReadlineError),
}

#[derive(Debug, Diagnostic, Error)]
#[error("line {number} could not be translated: {line}")]
struct LineError {
    number: usize,
    line: String,
    #[related]
    causes: Vec<peptide::Error>,
}

//! `property-generator` command line tool.
//!
//! ```text
//! property-generator dispatch.c properties.gen keywords.gen \
//!     enum.inc dispatch.inc propstrings.inc propstrings_strings.inc hash_table.inc
//! ```

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::debug;

use propmap_build::{GeneratorConfig, Inputs, Outputs, generate};

/// Property metadata compiler command line arguments.
#[derive(Parser, Debug)]
#[command(name = "property-generator", version)]
#[command(about = "Generate property enum, dispatch, string and perfect hash tables")]
struct Args {
    /// Canonical order source (dispatch table)
    canonical: PathBuf,
    /// Property metadata source
    metadata: PathBuf,
    /// Keyword source
    keywords: PathBuf,
    /// Output: property enum fragment
    enum_out: PathBuf,
    /// Output: dispatch table fragment
    dispatch_out: PathBuf,
    /// Output: string enum fragment
    propstrings_out: PathBuf,
    /// Output: string map fragment
    string_map_out: PathBuf,
    /// Output: perfect hash table fragment
    hash_table_out: PathBuf,

    /// Generator configuration (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(status) => return ExitCode::from(status),
    };

    setup_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", fatal_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// Parse the command line. On error the message goes to stderr and the
/// exit status is returned: 0 for `--help` and `--version`, 1 otherwise.
fn parse_args<I, T>(argv: I) -> Result<Args, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Args::try_parse_from(argv).map_err(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => 1,
        }
    })
}

fn fatal_message(error: &propmap_build::GenerateError) -> String {
    format!("FATAL ERROR: {}", error)
}

fn run(args: &Args) -> Result<(), propmap_build::GenerateError> {
    let config = match &args.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };
    debug!(?config, "configuration");

    let inputs = Inputs::new(&args.canonical, &args.metadata, &args.keywords);
    let outputs = Outputs {
        enum_fragment: args.enum_out.clone(),
        dispatch: args.dispatch_out.clone(),
        propstrings: args.propstrings_out.clone(),
        string_map: args.string_map_out.clone(),
        hash_table: args.hash_table_out.clone(),
    };

    let summary = generate(&inputs, &outputs, &config)?;
    if !summary.warnings.is_empty() {
        debug!("{} warnings", summary.warnings.len());
    }
    Ok(())
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("propmap_build=debug,property_generator=debug")
        } else {
            EnvFilter::new("propmap_build=info,property_generator=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    const BIN: &str = "property-generator";

    fn argv(dir: &Path) -> Vec<OsString> {
        let mut argv = vec![OsString::from(BIN)];
        for name in [
            "dispatch.c",
            "properties.gen",
            "keywords.gen",
            "enum.inc",
            "dispatch.inc",
            "propstrings.inc",
            "propstrings_strings.inc",
            "hash_table.inc",
        ] {
            argv.push(dir.join(name).into());
        }
        argv
    }

    #[test]
    fn takes_three_inputs_then_five_outputs() {
        let args = parse_args([BIN, "a", "b", "c", "1", "2", "3", "4", "5"]).unwrap();
        assert_eq!(args.canonical, PathBuf::from("a"));
        assert_eq!(args.keywords, PathBuf::from("c"));
        assert_eq!(args.enum_out, PathBuf::from("1"));
        assert_eq!(args.hash_table_out, PathBuf::from("5"));
        assert!(args.config.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn wrong_argument_count_fails() {
        let too_few: &[&str] = &[BIN, "a", "b", "c"];
        let too_many: &[&str] = &[BIN, "a", "b", "c", "1", "2", "3", "4", "5", "6"];
        for argv in [too_few, too_many] {
            assert_eq!(parse_args(argv.iter().copied()).unwrap_err(), 1);
        }
    }

    #[test]
    fn help_and_version_succeed() {
        assert_eq!(parse_args([BIN, "--help"]).unwrap_err(), 0);
        assert_eq!(parse_args([BIN, "--version"]).unwrap_err(), 0);
    }

    #[test]
    fn options_are_accepted() {
        let mut argv = argv(Path::new("gen"));
        argv.extend(["-v", "--config", "gen.toml"].map(OsString::from));
        let args = parse_args(argv).unwrap();
        assert!(args.verbose);
        assert_eq!(args.config, Some(PathBuf::from("gen.toml")));
    }

    #[test]
    fn missing_input_is_a_fatal_error() {
        let dir = TempDir::new().unwrap();
        let args = parse_args(argv(dir.path())).unwrap();
        let err = run(&args).unwrap_err();
        let message = fatal_message(&err);
        assert!(
            message.starts_with("FATAL ERROR: cannot read canonical order source"),
            "{}",
            message
        );
        assert!(!dir.path().join("enum.inc").exists());
    }
}

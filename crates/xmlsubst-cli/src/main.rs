#![forbid(unsafe_code)]

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use xmlsubst::{
    MatchPolicy, SectionTagSet, SubstitutionConfig, Substitutor, VariableMap,
    DEFAULT_SECTION_TAGS,
};

#[derive(Debug, Parser)]
#[command(
    name = "xmlsubst",
    version,
    about = "Substitute variables into .config-style XML files"
)]
struct Args {
    /// XML files to rewrite in place, processed in order
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,
    /// Section tag whose subtree may be rewritten (repeatable)
    #[arg(short, long = "tag", value_name = "TAG", default_values_t = DEFAULT_SECTION_TAGS.map(String::from))]
    tags: Vec<String>,
    /// Variable as KEY=VALUE (repeatable, overrides --vars-file)
    #[arg(short = 'D', long = "var", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    vars: Vec<(String, String)>,
    /// JSON object mapping variable names to string values
    #[arg(long, value_name = "PATH")]
    vars_file: Option<PathBuf>,
    /// Import environment variables starting with PREFIX, prefix stripped
    #[arg(long, value_name = "PREFIX")]
    env_prefix: Option<String>,
    /// Only substitute attribute values and text, never attribute names
    #[arg(long)]
    values_only: bool,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(verbose >= 2)
        .without_time()
        .init();
}

/// Substitute every file, returning whether all of them succeeded
fn run(args: &Args) -> Result<bool> {
    let variables = collect_variables(args)?;
    let tags: SectionTagSet = args.tags.iter().cloned().collect();
    let policy = if args.values_only {
        MatchPolicy::ValuesOnly
    } else {
        MatchPolicy::NamesAndValues
    };
    let config = SubstitutionConfig::default().with_match_policy(policy);
    let substitutor = Substitutor::with_config(&tags, &variables, config);

    let tag_list: Vec<&str> = tags.iter().collect();
    debug!(
        variables = variables.len(),
        tags = ?tag_list,
        "starting xml variable substitution"
    );

    let mut failed = 0usize;
    for file in &args.files {
        match substitutor.apply_to_file(file) {
            Ok(report) => info!(
                path = %file.display(),
                substituted = report.total(),
                skipped = report.skipped,
                "processed"
            ),
            Err(err) => {
                failed += 1;
                error!("{:#}", anyhow::Error::new(err));
            }
        }
    }

    if failed > 0 {
        error!("{failed} of {} file(s) failed", args.files.len());
    }
    Ok(failed == 0)
}

/// Environment, then `--vars-file`, then `--var`; later sources win
fn collect_variables(args: &Args) -> Result<VariableMap> {
    let mut variables = VariableMap::new();

    if let Some(prefix) = &args.env_prefix {
        variables.extend(std::env::vars_os().filter_map(|(name, value)| {
            let name = name.into_string().ok()?;
            let key = name.strip_prefix(prefix.as_str()).filter(|key| !key.is_empty())?;
            Some((key.to_string(), value.into_string().ok()?))
        }));
    }

    if let Some(path) = &args.vars_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read variables file {}", path.display()))?;
        let from_file: VariableMap = serde_json::from_str(&text).with_context(|| {
            format!(
                "variables file {} must be a JSON object of strings",
                path.display()
            )
        })?;
        variables.merge(&from_file);
    }

    variables.extend(args.vars.iter().cloned());

    if variables.is_empty() {
        bail!("no variables given; pass --var, --vars-file or --env-prefix");
    }
    Ok(variables)
}

fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("xdt:Transform=DelAttributes"),
            Ok(("xdt:Transform".to_string(), "DelAttributes".to_string()))
        );
        assert_eq!(
            parse_assignment("conn=Server=.;Database=x"),
            Ok(("conn".to_string(), "Server=.;Database=x".to_string()))
        );
        assert_eq!(parse_assignment("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_assignment("=value").is_err());
        assert!(parse_assignment("novalue").is_err());
    }

    #[test]
    fn test_default_tags() {
        let args = Args::parse_from(["xmlsubst", "-D", "a=b", "Web.config"]);
        assert_eq!(args.tags, DEFAULT_SECTION_TAGS.map(String::from).to_vec());
        assert_eq!(args.vars, vec![("a".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_variable_precedence() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        std::io::Write::write_all(&mut file, br#"{"a": "from-file", "b": "from-file"}"#)?;
        let path = file.path().to_string_lossy().into_owned();

        let args = Args::parse_from([
            "xmlsubst",
            "--vars-file",
            path.as_str(),
            "-D",
            "b=from-flag",
            "Web.config",
        ]);
        let variables = collect_variables(&args)?;

        assert_eq!(variables.get("a"), Some("from-file"));
        assert_eq!(variables.get("b"), Some("from-flag"));
        Ok(())
    }

    #[test]
    fn test_no_variables_is_an_error() {
        let args = Args::parse_from(["xmlsubst", "Web.config"]);
        assert!(collect_variables(&args).is_err());
    }
}

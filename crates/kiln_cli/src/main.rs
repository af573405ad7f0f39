//! Kiln CLI: the command-line interface for the kiln asset build tool.
//!
//! `kiln <task>...` runs one or more of the build tasks (`jshint`, `copy`,
//! `build`, `clean`, `clearCache`, `default`) in dependency order. With no
//! task, `default` runs.

#![warn(missing_docs)]

mod lint;
mod session;
mod tasks;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Kiln builds a single-page application's assets.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Front-end asset build tool")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Project directory (holding `kiln.toml` / `package.json`).
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// CDN base URL prefixed to fingerprinted asset names.
    #[arg(long, env = "KILN_CDN")]
    pub cdn: Option<String>,

    /// Lint rule to suppress (e.g., `--allow trailing-whitespace`). Repeatable.
    #[arg(long)]
    pub allow: Vec<String>,

    /// Lint rule to promote to errors (e.g., `--deny eqeqeq`). Repeatable.
    #[arg(long)]
    pub deny: Vec<String>,

    /// Output format for lint findings.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Tasks to run.
    #[arg(value_enum)]
    pub tasks: Vec<TaskName>,
}

/// A task that can be requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum TaskName {
    /// Lint application scripts.
    Jshint,
    /// Copy the entry page into the output directory.
    Copy,
    /// Build, fingerprint and write all assets.
    Build,
    /// Empty the output directory.
    Clean,
    /// Empty the transformation cache.
    #[value(name = "clearCache", alias = "clear-cache")]
    ClearCache,
    /// `jshint`, `copy` and `build`.
    Default,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Lint output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// One JSON object per finding on stdout.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Lint output format.
    pub format: ReportFormat,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };
    init_logging(cli.quiet, cli.verbose, color);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        format: cli.format,
    };
    let overrides = kiln_config::Overrides {
        cdn: cli.cdn,
        deny: cli.deny,
        allow: cli.allow,
    };

    let result = session::Session::open(&cli.project, &overrides, global)
        .and_then(|mut session| tasks::run(&cli.tasks, &mut session));

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr log subscriber. `KILN_LOG` wins over the flags.
fn init_logging(quiet: bool, verbose: bool, color: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("KILN_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_task_parses_empty() {
        let cli = Cli::parse_from(["kiln"]);
        assert!(cli.tasks.is_empty());
        assert_eq!(cli.format, ReportFormat::Text);
        assert_eq!(cli.project, PathBuf::from("."));
    }

    #[test]
    fn parse_several_tasks() {
        let cli = Cli::parse_from(["kiln", "clean", "build", "jshint"]);
        assert_eq!(
            cli.tasks,
            vec![TaskName::Clean, TaskName::Build, TaskName::Jshint]
        );
    }

    #[test]
    fn clear_cache_spellings() {
        for spelling in ["clearCache", "clear-cache"] {
            let cli = Cli::parse_from(["kiln", spelling]);
            assert_eq!(cli.tasks, vec![TaskName::ClearCache]);
        }
    }

    #[test]
    fn parse_cdn_and_lint_flags() {
        let cli = Cli::parse_from([
            "kiln",
            "--cdn",
            "https://cdn.example.com",
            "--allow",
            "trailing-whitespace",
            "--deny",
            "eqeqeq",
            "--format",
            "json",
            "jshint",
        ]);
        assert_eq!(cli.cdn.as_deref(), Some("https://cdn.example.com"));
        assert_eq!(cli.allow, vec!["trailing-whitespace"]);
        assert_eq!(cli.deny, vec!["eqeqeq"]);
        assert_eq!(cli.format, ReportFormat::Json);
        assert_eq!(cli.tasks, vec![TaskName::Jshint]);
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["kiln", "--quiet", "--color", "never", "build"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn unknown_task_is_usage_error() {
        let err = Cli::try_parse_from(["kiln", "deploy"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["kiln", "--quiet", "--verbose"]).is_err());
    }
}

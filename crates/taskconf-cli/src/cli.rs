//! taskconf CLI - inspect and resolve taskconf configuration files
//!
//! Usage:
//!   taskconf resolve application.properties local.yaml --format json
//!   taskconf get application.properties db.url
//!   taskconf expand 'jdbc:postgresql://${DB_HOST:localhost}/todo'
//!   taskconf check application.properties

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indexmap::IndexMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use taskconf_core::interpolation::{self, Placeholders};
use taskconf_core::{EnvLookup, FileSpec, Layered, ProcessEnv, RawConfig, ResolvedConfig};

/// taskconf - Configuration tool for the taskconf to-do manager
#[derive(Parser)]
#[command(name = "taskconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the merged configuration with placeholders resolved
    Resolve {
        /// Configuration file(s), later files override earlier ones
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Show raw values without resolving placeholders
        #[arg(long)]
        raw: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Properties)]
        format: OutputFormat,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show the file each key came from instead of its value
        #[arg(long)]
        sources: bool,

        /// Override a variable for this run (NAME=VALUE)
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// Get a single value from the configuration
    Get {
        /// Configuration file(s)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Key of the value (e.g., db.url)
        key: String,

        /// Print the raw value without resolving placeholders
        #[arg(long)]
        raw: bool,

        /// Value to print if the key is not found
        #[arg(short, long)]
        default: Option<String>,

        /// Override a variable for this run (NAME=VALUE)
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// Resolve placeholders in a piece of text (reads stdin if omitted)
    Expand {
        /// Text to resolve
        text: Option<String>,

        /// Override a variable for this run (NAME=VALUE)
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// Report unterminated placeholders and unset variables without defaults
    Check {
        /// Configuration file(s) to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Override a variable for this run (NAME=VALUE)
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
}

/// Output formats for `resolve`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Properties,
    Json,
    Yaml,
}

/// Variable lookup used by every command: `--set` values over the process environment
pub type CliLookup = Layered<IndexMap<String, String>, ProcessEnv>;

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            files,
            raw,
            format,
            output,
            sources,
            set,
        } => cmd_resolve(&files, raw, format, output, sources, &build_lookup(set)),

        Commands::Get {
            files,
            key,
            raw,
            default,
            set,
        } => cmd_get(&files, &key, raw, default, &build_lookup(set)),

        Commands::Expand { text, set } => cmd_expand(text, &build_lookup(set)),

        Commands::Check { files, set } => cmd_check(&files, &build_lookup(set)),
    }
}

/// Parse a `NAME=VALUE` argument
pub fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", arg)),
    }
}

/// Build the lookup for a run from `--set` overrides
pub fn build_lookup(overrides: Vec<(String, String)>) -> CliLookup {
    Layered::new(overrides.into_iter().collect(), ProcessEnv)
}

fn load_config(files: &[PathBuf]) -> Result<RawConfig, String> {
    if files.is_empty() {
        return Err("No configuration files specified".to_string());
    }

    log::debug!("loading {} configuration file(s)", files.len());
    let specs: Vec<FileSpec> = files.iter().map(FileSpec::required).collect();
    RawConfig::load_merged_with_specs(&specs)
        .map_err(|e| format!("Failed to load configuration: {}", e))
}

/// Render a configuration in the requested format
pub fn render(config: &ResolvedConfig, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Properties => config.to_properties().map_err(|e| e.to_string()),
        OutputFormat::Json => config.to_json().map(|s| s + "\n").map_err(|e| e.to_string()),
        OutputFormat::Yaml => config.to_yaml().map_err(|e| e.to_string()),
    }
}

fn write_output(content: &str, output: Option<PathBuf>) -> ExitCode {
    if let Some(output_path) = output {
        if let Err(e) = std::fs::write(&output_path, content) {
            eprintln!("{}: {}", "Error writing file".red(), e);
            return ExitCode::from(2);
        }
        eprintln!("{} Wrote to {}", "✓".green(), output_path.display());
    } else {
        print!("{}", content);
    }
    ExitCode::SUCCESS
}

fn cmd_resolve(
    files: &[PathBuf],
    raw: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
    sources: bool,
    lookup: &CliLookup,
) -> ExitCode {
    let config = match load_config(files) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    // --sources: key -> file instead of values
    if sources {
        let content: String = config
            .keys()
            .map(|k| format!("{}: {}\n", k, config.source_of(k).unwrap_or("-")))
            .collect();
        return write_output(&content, output);
    }

    let resolved = if raw {
        // Unresolved output: show raw placeholders
        ResolvedConfig::new(config.as_map().clone())
    } else {
        config.resolve(lookup)
    };

    match render(&resolved, format) {
        Ok(content) => write_output(&content, output),
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_get(
    files: &[PathBuf],
    key: &str,
    raw: bool,
    default: Option<String>,
    lookup: &CliLookup,
) -> ExitCode {
    let config = match load_config(files) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let value = match config.get(key) {
        Some(value) if raw => Some(value.to_string()),
        Some(value) => Some(interpolation::resolve(value, lookup)),
        None => default,
    };

    match value {
        Some(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("{}: Key '{}' not found", "Error".red(), key);
            ExitCode::from(1)
        }
    }
}

fn cmd_expand(text: Option<String>, lookup: &CliLookup) -> ExitCode {
    match text {
        Some(text) => println!("{}", interpolation::resolve(&text, lookup)),
        None => {
            let mut input = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut input) {
                eprintln!("{}: {}", "Error reading stdin".red(), e);
                return ExitCode::from(2);
            }
            print!("{}", interpolation::resolve(&input, lookup));
        }
    }
    ExitCode::SUCCESS
}

/// A problem found by `check` in one configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// `${` with no closing `}`; the text is kept as written
    Unterminated { key: String, offset: usize },
    /// `${NAME}` with `NAME` unset and no default; kept as written
    Unset { key: String, name: String },
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finding::Unterminated { key, offset } => write!(
                f,
                "{}: unterminated placeholder at offset {} is kept as written",
                key, offset
            ),
            Finding::Unset { key, name } => write!(
                f,
                "{}: '{}' is not set and has no default",
                key, name
            ),
        }
    }
}

/// Inspect every value of a configuration for placeholder problems
pub fn check_config<L: EnvLookup>(config: &RawConfig, lookup: &L) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (key, value) in config.iter() {
        for placeholder in Placeholders::new(value) {
            if !placeholder.has_default() && lookup.lookup(placeholder.name).is_none() {
                findings.push(Finding::Unset {
                    key: key.to_string(),
                    name: placeholder.name.to_string(),
                });
            }
        }
        if let Some(offset) = interpolation::find_unterminated(value) {
            findings.push(Finding::Unterminated {
                key: key.to_string(),
                offset,
            });
        }
    }

    findings
}

fn check_file(file: &Path, lookup: &CliLookup) -> bool {
    let config = match RawConfig::load(file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}: {}", "✗".red(), file.display(), e);
            return false;
        }
    };

    let findings = check_config(&config, lookup);
    if findings.is_empty() {
        println!(
            "{} {}: {} keys, all placeholders resolve",
            "✓".green(),
            file.display(),
            config.len()
        );
        return true;
    }

    eprintln!("{} {}:", "✗".red(), file.display());
    for finding in &findings {
        eprintln!("  {}", finding);
    }
    false
}

fn cmd_check(files: &[PathBuf], lookup: &CliLookup) -> ExitCode {
    let mut all_valid = true;

    for file in files {
        all_valid &= check_file(file, lookup);
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

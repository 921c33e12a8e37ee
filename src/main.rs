use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::exit;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use certviewer::config::{Config, ConfigError};
use certviewer::report::{self, OutputFormat};
use certviewer::{InspectError, Inspection, Inspector, OpenSslConnector, Target};

const PROMPT: &str = "Enter domain name (e.g., example.com): ";

#[derive(Parser, Debug)]
#[command(
    name = "certviewer",
    version,
    about = "Inspect the certificate a TLS server presents",
    disable_version_flag = true
)]
struct Cli {
    /// Server to inspect: host, host:port or https://host[:port]/path
    target: Option<String>,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Prompt for a domain name on stdin
    #[arg(short, long, conflicts_with = "target")]
    interactive: bool,

    /// Output format: text, json or summary
    #[arg(short, long)]
    output: Option<OutputFormat>,

    /// Append the presented chain to the text report
    #[arg(long)]
    chain: bool,

    /// Connect, read and write timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Accept any certificate during the handshake. Without it, expired or
    /// untrusted certificates fail with an SSL error instead of being reported
    #[arg(long, conflicts_with = "ca_file")]
    insecure: bool,

    /// Trust the PEM bundle at PATH instead of the system store
    #[arg(long, value_name = "PATH")]
    ca_file: Option<PathBuf>,

    /// Let a wildcard cover exactly one leftmost label
    #[arg(long)]
    strict_wildcards: bool,

    /// Exit code used when the certificate is invalid for the host
    #[arg(long, value_name = "N")]
    exit_code: Option<i32>,

    /// Configuration file (defaults to ./certviewer.toml when present)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Enable debug logging on stderr
    #[arg(long)]
    verbose: bool,
}

/// Where a failure is reported decides how it is worded.
#[derive(Clone, Copy)]
enum Mode {
    Command,
    Interactive,
}

impl Mode {
    fn report(self, err: &InspectError) {
        match self {
            Mode::Command => eprintln!("Error: {}", err),
            Mode::Interactive => eprintln!("{}: {}", err.category().prefix(), err),
        }
    }
}

fn main() {
    exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
        }
    };

    init_logging(cli.verbose);

    if cli.generate_config {
        println!("{}", Config::example_toml());
        return 0;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return 1;
        }
    };

    let mode = if cli.interactive {
        Mode::Interactive
    } else {
        Mode::Command
    };

    let target = match mode {
        Mode::Interactive => prompt_target(),
        Mode::Command => match cli.target.as_deref() {
            Some(input) => config
                .default_port()
                .map_err(InspectError::from)
                .and_then(|port| Target::parse(input, port)),
            None => {
                let _ = Cli::command().print_help();
                return 0;
            }
        },
    };
    let target = match target {
        Ok(target) => target,
        Err(err) => {
            mode.report(&err);
            return 1;
        }
    };

    let rendered = inspect(&config, &target).and_then(|inspection| {
        report::render(&inspection, config.output_format(), config.show_chain())
            .map(|rendered| (inspection, rendered))
    });
    match rendered {
        Ok((inspection, rendered)) => {
            println!("{}", rendered.trim_end());
            if inspection.validation.is_valid() {
                0
            } else {
                config.exit_code()
            }
        }
        Err(err) => {
            mode.report(&err);
            1
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let file_config = Config::discover(cli.config.as_deref())?;
    let cli_config = Config::from_cli_args(
        cli.output,
        cli.timeout,
        cli.exit_code,
        cli.chain,
        cli.strict_wildcards,
        cli.insecure,
        cli.ca_file.clone(),
    );

    let config = Config::defaults().merge_with(file_config).merge_with(cli_config);
    debug!(?config, "resolved configuration");
    Ok(config)
}

fn prompt_target() -> Result<Target, InspectError> {
    print!("{}", PROMPT);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Target::from_prompt(&line)
}

fn inspect(config: &Config, target: &Target) -> Result<Inspection, InspectError> {
    let trust = config.trust_config()?;
    let timeout = config.timeout()?;

    let inspector = Inspector::new(OpenSslConnector::new(trust, timeout))
        .with_wildcard_policy(config.wildcard_policy());
    inspector.inspect(target)
}

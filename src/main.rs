use std::io::{self, Read};

use clap::{Parser as ClapParser, Subcommand};
use keyset_query::cli::{self, CheckOptions, CheckResult, CliError};
use keyset_query::config::{Config, LogLevel};
use keyset_query::logging::init_logging;
use keyset_query::output::{to_json, to_json_pretty};

#[derive(ClapParser)]
#[command(name = "keyset")]
#[command(about = "keyset - evaluate set-algebra queries such as '(A - B) | (C & D)'")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a query and evaluate it against a JSON dataset
    Check {
        /// The query to evaluate
        query: String,

        /// JSON dataset (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Evaluate over unsigned 32-bit integer sets
        #[arg(long)]
        uint32: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't evaluate
        #[arg(long)]
        syntax_only: bool,
    },

    /// List the identifiers a query references
    Keys {
        /// The query to inspect
        query: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config.apply_overrides(cli.log_level),
        Err(e) => {
            init_logging(&Config::default());
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Commands::Check {
            query,
            input,
            uint32,
            pretty,
            syntax_only,
        } => run_check(query, input, uint32, pretty, syntax_only, &config),
        Commands::Keys { query } => cli::execute_keys(&query).map(|keys| {
            for key in keys {
                println!("{}", key);
            }
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(
    query: String,
    input: Option<String>,
    uint32: bool,
    pretty: bool,
    syntax_only: bool,
    config: &Config,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        query,
        input,
        uint32,
        syntax_only,
    };

    match cli::execute_check(&options, config)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(output) => {
            let json = if pretty {
                to_json_pretty(&output)
            } else {
                to_json(&output)
            };
            println!("{}", json);
        }
    }
    Ok(())
}

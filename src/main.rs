use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::debug;

use formflow::config::{self, AppConfig};
use formflow::errors::CliError;
use formflow::script::{load_definition, load_script, run_script};
use formflow::RhaiEvaluator;

/// Motor de form flows reanudables.
#[derive(Parser)]
#[command(name = "formflow", version, about = "Run and inspect form flow definitions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script of user actions over a definition and print the result as JSON
    Run {
        /// Path to the definition JSON file
        definition: PathBuf,
        /// Path to the script JSON file
        #[arg(long)]
        script: PathBuf,
        /// Comma-separated key fields for merging arrays (overrides FORMFLOW_MERGE_KEYS)
        #[arg(long)]
        merge_keys: Option<String>,
        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a definition and print its identity and hash
    Validate {
        /// Path to the definition JSON file
        definition: PathBuf,
    },
}

fn main() {
    config::init_dotenv();
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = execute(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Run { definition,
                        script,
                        merge_keys,
                        pretty } => {
            let config = match merge_keys {
                Some(raw) => AppConfig::with_merge_keys(&raw)?,
                None => AppConfig::from_env()?,
            };
            debug!("merge keys: {:?}", config.merge_keys);
            let definition = load_definition(&definition)?;
            let script = load_script(&script)?;
            let report = run_script(definition, &script, RhaiEvaluator::new(), config.merger())?;
            let out = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{out}");
        }
        Commands::Validate { definition } => {
            let definition = load_definition(&definition)?;
            println!("{} steps={} start={} hash={}",
                     definition.id(),
                     definition.len(),
                     definition.start_step(),
                     definition.definition_hash());
        }
    }
    Ok(())
}

//! modvalues CLI - dry-run Helm values from module OpenAPI schemas

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;

use commands::ModuleArgs;

#[derive(Parser)]
#[command(name = "modvalues")]
#[command(author = "modvalues Contributors")]
#[command(version)]
#[command(about = "Generate dry-run Helm values from module OpenAPI schemas", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the values generated for a module, digests included
    Values {
        #[command(flatten)]
        args: ModuleArgs,
    },

    /// Print the full render context (Chart, Capabilities, Release, Values)
    Context {
        #[command(flatten)]
        args: ModuleArgs,
    },
}

/// Log to stderr; `RUST_LOG` wins over `--debug`
fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { "modvalues=debug,modvalues_core=debug" } else { "warn" })
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    let result = match &cli.command {
        Commands::Values { args } => commands::values::run(args),
        Commands::Context { args } => commands::context::run(args),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

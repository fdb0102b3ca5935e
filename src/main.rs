//! PV quotation entry point: CLI wiring and config-driven engine construction.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use pv_quote::QuoteError;
use pv_quote::config::{ConfigError, ProjectConfig};
use pv_quote::error::InputError;
use pv_quote::io::export::{export_cashflow_csv, export_json, export_monthly_csv};
use pv_quote::quote::{QuoteEngine, sensitivity_analysis, size_comparison};

/// Parsed CLI arguments.
#[derive(Parser)]
#[command(name = "pv-quote")]
#[command(version, about = "Solar PV quotation engine")]
#[command(
    long_about = "Sizes a PV system, selects inverters and projects cash flows, NPV, IRR,\n\
    payback and LCOE for a project described in TOML or by a built-in preset.\n\
    \nExamples:\n  \
    pv-quote                                      # medellin_residential preset\n  \
    pv-quote --preset barranquilla_commercial --sensitivity\n  \
    pv-quote --scenario project.toml --cashflow-out years.csv"
)]
struct Cli {
    /// Load the project from a TOML file
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    scenario: Option<PathBuf>,

    /// Use a built-in preset
    #[arg(
        long,
        value_name = "NAME",
        help = "Built-in preset (medellin_residential, bogota_battery, barranquilla_commercial)"
    )]
    preset: Option<String>,

    /// Print the horizon x financing sensitivity table
    #[arg(long)]
    sensitivity: bool,

    /// Print the 80/100/120% system-size comparison
    #[arg(long)]
    size_comparison: bool,

    /// Export the year-by-year table to CSV
    #[arg(long, value_name = "PATH")]
    cashflow_out: Option<PathBuf>,

    /// Export the monthly generation table to CSV
    #[arg(long, value_name = "PATH")]
    monthly_out: Option<PathBuf>,

    /// Export the full result record to JSON
    #[arg(long, value_name = "PATH")]
    json_out: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Start the REST API server after the quote is computed
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

fn load_config(cli: &Cli) -> Result<ProjectConfig, ConfigError> {
    // --scenario takes priority, then --preset, then the residential reference
    if let Some(path) = &cli.scenario {
        ProjectConfig::from_toml_file(path)
    } else if let Some(name) = &cli.preset {
        ProjectConfig::from_preset(name)
    } else {
        Ok(ProjectConfig::medellin_residential())
    }
}

fn run(cli: &Cli) -> pv_quote::Result<()> {
    let project = load_config(cli)?;
    let errors = project.validate();
    if !errors.is_empty() {
        let violations = errors
            .into_iter()
            .map(|e| InputError::new(e.field, e.message))
            .collect();
        return Err(QuoteError::InvalidInput(violations));
    }

    let inputs = project.to_inputs()?;
    let engine = if project.carbon.enabled {
        QuoteEngine::with_carbon(Arc::new(project.carbon.calculator()))
    } else {
        QuoteEngine::new()
    };

    let result = engine.quote(&inputs)?;
    println!("{result}");

    let sensitivity = cli.sensitivity.then(|| sensitivity_analysis(&engine, &inputs));
    if let Some(table) = &sensitivity {
        println!("\n{table}");
    }
    if cli.size_comparison {
        let table = size_comparison(&engine, &inputs);
        println!("\n{table}");
    }

    if let Some(path) = &cli.cashflow_out {
        export_cashflow_csv(&result, path)?;
        eprintln!("cash flow table written to {}", path.display());
    }
    if let Some(path) = &cli.monthly_out {
        export_monthly_csv(&result, path)?;
        eprintln!("monthly table written to {}", path.display());
    }
    if let Some(path) = &cli.json_out {
        export_json(&result, path)?;
        eprintln!("result record written to {}", path.display());
    }
    info!(total_cost = result.total_cost, "quote complete");

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;

        let sensitivity =
            sensitivity.unwrap_or_else(|| sensitivity_analysis(&engine, &inputs));
        let state = Arc::new(pv_quote::api::AppState {
            inputs,
            result,
            sensitivity,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(pv_quote::api::serve(state, addr))?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    pv_quote::logging::init(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

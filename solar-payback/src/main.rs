use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use solar_payback::general::csv_io::{load_series_csv, write_ledger_csv};
use solar_payback::general::electricity_demand::generate_scaled_load_curve;
use solar_payback::general::finance::amortize;
use solar_payback::simple::config::ScenarioConfig;
use solar_payback::simple::economics::project;
use solar_payback::simple::plot::{
    plot_cash_flow, plot_monthly_consumption, plot_yearly_energy, print_projection_summary,
};
use solar_payback::simple::sweep::{
    ScenarioOutcome, evaluate_scenarios, format_summary_table, household_adoption,
    load_year_inputs, run_scenario_sweep,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "solar-payback")]
#[command(author, version, about = "Payback projection for residential solar installations")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare price modes, years and household adoption from the configured data sources
    Sweep {
        /// TOML scenario configuration, built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for cash flow and energy plots
        #[arg(long)]
        plot_dir: Option<PathBuf>,
    },

    /// Total repayment of an annuity loan
    Amortize {
        #[arg(long)]
        principal: f64,

        /// Annual interest rate, e.g. 0.05
        #[arg(long)]
        rate: f64,

        #[arg(long)]
        years: u32,
    },

    /// Project a single installation from `timestamp,value` CSV series
    Project {
        #[arg(long)]
        production: PathBuf,

        #[arg(long)]
        spot_price: PathBuf,

        #[arg(long)]
        consumption: PathBuf,

        /// TOML scenario configuration providing economics and financing
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Investment cost in NOK, defaults to the total loan payment of the configuration
        #[arg(long)]
        investment_cost: Option<f64>,

        /// Scale the consumption profile to the configured monthly household consumption
        #[arg(long)]
        scale_to_household: bool,

        /// Write the yearly ledger to this CSV file
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Directory for cash flow and energy plots
        #[arg(long)]
        plot_dir: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ScenarioConfig> {
    match path {
        Some(path) => ScenarioConfig::from_toml_file(path),
        None => Ok(ScenarioConfig::default()),
    }
}

fn plot_projection(
    plot_dir: &Path,
    name: &str,
    title: &str,
    summary: &pv_model::ProjectionSummary,
    investment_cost: f64,
) -> Result<()> {
    plot_cash_flow(
        summary,
        investment_cost,
        title,
        &plot_dir.join(format!("{name}_cash_flow.png")),
    )
    .map_err(|e| anyhow!("Failed to plot cash flow: {e}"))?;
    plot_yearly_energy(summary, &plot_dir.join(format!("{name}_energy.png")))
        .map_err(|e| anyhow!("Failed to plot yearly energy: {e}"))?;
    Ok(())
}

fn file_stem(outcome: &ScenarioOutcome) -> String {
    outcome
        .label()
        .replace(" / ", "_")
        .replace(' ', "_")
        .replace('.', "")
}

fn run_sweep(config_path: Option<&Path>, plot_dir: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    let Some(plot_dir) = plot_dir else {
        let outcomes = run_scenario_sweep(&config)?;
        println!("\n{}", format_summary_table(&outcomes));
        return Ok(());
    };

    config.validate()?;
    std::fs::create_dir_all(plot_dir)
        .with_context(|| format!("Failed to create plot directory: {}", plot_dir.display()))?;

    let (inputs, consumption) = load_year_inputs(&config)?;
    let adoption = household_adoption(&config, &consumption)?;
    if let Some(adoption) = &adoption {
        plot_monthly_consumption(
            &adoption.actual,
            &adoption.average,
            &plot_dir.join("monthly_consumption.png"),
        )
        .map_err(|e| anyhow!("Failed to plot monthly consumption: {e}"))?;
    }

    let outcomes = evaluate_scenarios(&config, &inputs, adoption.as_ref().map(|a| &a.factors))?;
    println!("\n{}", format_summary_table(&outcomes));

    for outcome in outcomes.values() {
        plot_projection(
            plot_dir,
            &file_stem(outcome),
            &outcome.label(),
            &outcome.summary,
            outcome.loan.total_payment,
        )?;
    }
    info!(path = %plot_dir.display(), "plots written");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_project(
    production: &Path,
    spot_price: &Path,
    consumption: &Path,
    config_path: Option<&Path>,
    investment_cost: Option<f64>,
    scale_to_household: bool,
    ledger: Option<&Path>,
    plot_dir: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;

    let production = load_series_csv(production)?;
    let spot_price = load_series_csv(spot_price)?;
    let mut consumption = load_series_csv(consumption)?;

    if scale_to_household {
        let monthly = config
            .actual_monthly_consumption
            .as_ref()
            .context("Scaling to the household needs actual_monthly_consumption in the configuration")?;
        consumption = generate_scaled_load_curve(monthly, &consumption)?;
    }

    let investment_cost = match investment_cost {
        Some(cost) => cost,
        None => {
            amortize(
                config.investment_amount,
                config.loan_annual_rate,
                config.loan_years,
            )?
            .total_payment
        }
    };
    let params = config.economics.with_investment_cost(investment_cost);

    let summary = project(&production, &spot_price, &consumption, &params)?;
    print_projection_summary(&summary, investment_cost);

    if let Some(ledger) = ledger {
        write_ledger_csv(&summary, ledger)?;
        info!(path = %ledger.display(), "ledger written");
    }

    if let Some(plot_dir) = plot_dir {
        std::fs::create_dir_all(plot_dir).with_context(|| {
            format!("Failed to create plot directory: {}", plot_dir.display())
        })?;
        plot_projection(plot_dir, "projection", "Cumulative cash flow", &summary, investment_cost)?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Sweep { config, plot_dir } => run_sweep(config.as_deref(), plot_dir.as_deref()),
        Commands::Amortize {
            principal,
            rate,
            years,
        } => {
            let loan = amortize(principal, rate, years)?;
            println!("Monthly payment: {:.2} NOK", loan.monthly_payment);
            println!("Total payment:   {:.2} NOK", loan.total_payment);
            println!("Total interest:  {:.2} NOK", loan.total_interest);
            Ok(())
        }
        Commands::Project {
            production,
            spot_price,
            consumption,
            config,
            investment_cost,
            scale_to_household,
            ledger,
            plot_dir,
        } => run_project(
            &production,
            &spot_price,
            &consumption,
            config.as_deref(),
            investment_cost,
            scale_to_household,
            ledger.as_deref(),
            plot_dir.as_deref(),
        ),
    }
}

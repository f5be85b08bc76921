use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

use fincast::core::{
    CalculatorConfig, CoreError, HouseholdSnapshot, PlanType, ProjectionConfig, Scenario,
    VehicleParams, analyze, calculate_wealth_velocity, compare_vehicles, run_all_scenarios,
    run_projection,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("server error: {0}")]
    Server(std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "fincast", version, about = "Household projections and wealth analytics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "FINCAST_HOST", default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, env = "FINCAST_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Project a household snapshot year by year.
    Project {
        file: PathBuf,
        #[arg(long, default_value_t = Scenario::Predicted)]
        scenario: Scenario,
        #[arg(long)]
        retirement_age: Option<u32>,
        /// Run predicted, best and worst together.
        #[arg(long)]
        all: bool,
        /// Calendar year of the first record.
        #[arg(long)]
        start_year: Option<i32>,
    },
    /// Compare best/average/worst outcomes for one or more vehicles.
    Vehicles {
        #[arg(long = "plan-type", required = true)]
        plan_types: Vec<String>,
        #[arg(long)]
        current_age: u32,
        #[arg(long, default_value_t = 0.0)]
        monthly_contribution: f64,
        #[arg(long, default_value_t = 0)]
        years_to_contribute: u32,
        #[arg(long, default_value_t = 65)]
        income_start_age: u32,
        #[arg(long, default_value_t = 85)]
        income_end_age: u32,
        #[arg(long, default_value_t = 0.0)]
        current_value: f64,
        #[arg(long, default_value_t = 0.25)]
        tax_rate: f64,
        #[arg(long, default_value_t = 0.03)]
        inflation_rate: f64,
    },
    /// Score a snapshot and list insights.
    Analyze { file: PathBuf },
    /// Stage a snapshot and compute its wealth velocity.
    Velocity { file: PathBuf },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fincast=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve { host, port } => fincast::api::run_http_server(SocketAddr::new(host, port))
            .await
            .map_err(CliError::Server),
        Command::Project {
            file,
            scenario,
            retirement_age,
            all,
            start_year,
        } => {
            let mut snapshot: HouseholdSnapshot = read_json(&file)?;
            if retirement_age.is_some() {
                snapshot.retirement_age = retirement_age;
            }
            let config = ProjectionConfig {
                start_year,
                ..ProjectionConfig::default()
            };
            if all {
                print_json(&run_all_scenarios(&snapshot, &config)?)
            } else {
                print_json(&run_projection(&snapshot, scenario, &config)?)
            }
        }
        Command::Vehicles {
            plan_types,
            current_age,
            monthly_contribution,
            years_to_contribute,
            income_start_age,
            income_end_age,
            current_value,
            tax_rate,
            inflation_rate,
        } => {
            let params = VehicleParams {
                current_age,
                monthly_contribution,
                years_to_contribute,
                income_start_age,
                income_end_age,
                current_value,
            };
            let config = CalculatorConfig {
                tax_rate,
                inflation_rate,
            };
            let plan_types = plan_types
                .iter()
                .map(|name| name.parse())
                .collect::<Result<Vec<PlanType>, CoreError>>()?;
            print_json(&compare_vehicles(&plan_types, &params, &config)?)
        }
        Command::Analyze { file } => {
            let snapshot: HouseholdSnapshot = read_json(&file)?;
            print_json(&analyze(&snapshot)?)
        }
        Command::Velocity { file } => {
            let snapshot: HouseholdSnapshot = read_json(&file)?;
            print_json(&calculate_wealth_velocity(&snapshot)?)
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn project_accepts_scenario_aliases() {
        let cli = Cli::try_parse_from([
            "fincast",
            "project",
            "household.json",
            "--scenario",
            "pessimistic",
            "--all",
        ])
        .unwrap();
        match cli.command {
            Command::Project { scenario, all, .. } => {
                assert_eq!(scenario, Scenario::Worst);
                assert!(all);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn vehicles_collects_repeated_plan_types() {
        let cli = Cli::try_parse_from([
            "fincast",
            "vehicles",
            "--plan-type",
            "Roth IRA",
            "--plan-type",
            "HSA",
            "--current-age",
            "30",
        ])
        .unwrap();
        match cli.command {
            Command::Vehicles {
                plan_types,
                income_start_age,
                ..
            } => {
                assert_eq!(plan_types, vec!["Roth IRA", "HSA"]);
                assert_eq!(income_start_age, 65);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn missing_snapshot_file_is_a_read_error() {
        let err = read_json::<HouseholdSnapshot>(Path::new("/nonexistent/household.json"))
            .unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
    }
}

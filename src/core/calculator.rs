use serde::{Deserialize, Serialize};

use super::assumptions::{VehicleAssumption, vehicle_assumption, vehicle_assumptions};
use super::error::CoreResult;
use super::money::{ratio, round_cents};
use super::types::PlanType;
use super::validate::{validate_calculator_config, validate_vehicle_params};

const WORST_CASE_RETURN_FLOOR: f64 = 0.01;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    pub tax_rate: f64,
    pub inflation_rate: f64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            tax_rate: 0.25,
            inflation_rate: 0.03,
        }
    }
}

/// Contribution and distribution schedule for a single vehicle.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleParams {
    pub current_age: u32,
    pub monthly_contribution: f64,
    pub years_to_contribute: u32,
    pub income_start_age: u32,
    pub income_end_age: u32,
    #[serde(default)]
    pub current_value: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub total_contributed: f64,
    pub cash_value: f64,
    pub annual_income_before_tax: f64,
    pub annual_income_after_tax: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VehicleProjection {
    pub plan_type: PlanType,
    pub best_case: ScenarioOutcome,
    pub average_case: ScenarioOutcome,
    pub worst_case: ScenarioOutcome,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VehicleSummary {
    pub plan_type: PlanType,
    #[serde(flatten)]
    pub assumption: VehicleAssumption,
}

pub fn assumption_table() -> Vec<VehicleSummary> {
    vehicle_assumptions()
        .map(|(plan_type, assumption)| VehicleSummary {
            plan_type,
            assumption: *assumption,
        })
        .collect()
}

/// Parses a plan type name and projects it; unknown names fail with
/// `CoreError::UnknownVehicle`.
pub fn project_vehicle_named(
    plan_type: &str,
    params: &VehicleParams,
    config: &CalculatorConfig,
) -> CoreResult<VehicleProjection> {
    project_vehicle(plan_type.parse()?, params, config)
}

pub fn project_vehicle(
    plan_type: PlanType,
    params: &VehicleParams,
    config: &CalculatorConfig,
) -> CoreResult<VehicleProjection> {
    validate_vehicle_params(params)?;
    validate_calculator_config(config)?;
    let assumption = vehicle_assumption(plan_type)?;
    let best_rate = assumption.avg_return + assumption.volatility;
    let average_rate = assumption.avg_return;
    let worst_rate = (assumption.avg_return - assumption.volatility).max(WORST_CASE_RETURN_FLOOR);

    let projection = VehicleProjection {
        plan_type,
        best_case: simulate_vehicle(params, assumption, best_rate, config),
        average_case: simulate_vehicle(params, assumption, average_rate, config),
        worst_case: simulate_vehicle(params, assumption, worst_rate, config),
    };
    tracing::debug!(
        plan_type = %plan_type,
        average_cash_value = projection.average_case.cash_value,
        "projected vehicle"
    );
    Ok(projection)
}

pub fn compare_vehicles(
    plan_types: &[PlanType],
    params: &VehicleParams,
    config: &CalculatorConfig,
) -> CoreResult<Vec<VehicleProjection>> {
    plan_types
        .iter()
        .map(|plan_type| project_vehicle(*plan_type, params, config))
        .collect()
}

fn simulate_vehicle(
    params: &VehicleParams,
    assumption: &VehicleAssumption,
    rate_of_return: f64,
    config: &CalculatorConfig,
) -> ScenarioOutcome {
    let growth = 1.0 + rate_of_return - assumption.policy_cost - config.inflation_rate;
    let annual_contribution = params.monthly_contribution * 12.0;

    let mut balance = params.current_value;
    let mut total_contributed = 0.0;
    for _ in 0..params.years_to_contribute {
        total_contributed += annual_contribution;
        balance += annual_contribution;
        balance *= growth;
    }

    let years_until_income = i64::from(params.income_start_age) - i64::from(params.current_age);
    let growth_years = (years_until_income - i64::from(params.years_to_contribute)).max(0);
    for _ in 0..growth_years {
        balance *= growth;
    }

    let years_of_income = i64::from(params.income_end_age) - i64::from(params.income_start_age);
    let annual_income_before_tax = if years_of_income > 0 {
        ratio(balance, years_of_income as f64)
    } else {
        0.0
    };
    let annual_income_after_tax = if assumption.tax_advantage {
        annual_income_before_tax
    } else {
        annual_income_before_tax * (1.0 - config.tax_rate)
    };

    ScenarioOutcome {
        total_contributed: round_cents(total_contributed),
        cash_value: round_cents(balance),
        annual_income_before_tax: round_cents(annual_income_before_tax),
        annual_income_after_tax: round_cents(annual_income_after_tax),
    }
}

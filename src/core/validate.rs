use std::collections::HashSet;

use super::assumptions::plan_policy;
use super::calculator::{CalculatorConfig, VehicleParams};
use super::error::{CoreError, CoreResult};
use super::types::{HouseholdSnapshot, PlanInput};

pub const MIN_AGE: u32 = 18;
pub const MAX_AGE: u32 = 120;
pub const MAX_YEARS_TO_CONTRIBUTE: u32 = 100;

fn non_negative(field: &str, value: f64) -> CoreResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::invalid(field, "must be a finite value >= 0"));
    }
    Ok(())
}

fn age_in_range(field: &str, age: u32) -> CoreResult<()> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(CoreError::invalid(
            field,
            format!("must be between {MIN_AGE} and {MAX_AGE}"),
        ));
    }
    Ok(())
}

pub fn validate_snapshot(snapshot: &HouseholdSnapshot) -> CoreResult<()> {
    age_in_range("age", snapshot.age)?;
    non_negative("monthly_income", snapshot.monthly_income)?;
    non_negative("side_income", snapshot.side_income)?;
    non_negative("monthly_expenses", snapshot.monthly_expenses)?;
    non_negative("savings", snapshot.savings)?;
    non_negative("investments", snapshot.investments)?;
    non_negative("debt", snapshot.debt)?;
    if let Some(rate) = snapshot.debt_interest_rate {
        non_negative("debt_interest_rate", rate)?;
    }

    if let Some(retirement_age) = snapshot.retirement_age {
        age_in_range("retirement_age", retirement_age)?;
        if retirement_age < snapshot.age {
            return Err(CoreError::invalid("retirement_age", "must be >= age"));
        }
    }

    let mut seen = HashSet::new();
    for plan in &snapshot.plans {
        validate_plan(plan)?;
        if plan_policy(plan.plan_type).single_instance && !seen.insert(plan.plan_type) {
            return Err(CoreError::invalid(
                "plans",
                format!("{} plan already exists", plan.plan_type),
            ));
        }
    }
    Ok(())
}

pub fn validate_plan(plan: &PlanInput) -> CoreResult<()> {
    non_negative("cash_value", plan.cash_value)?;
    non_negative("monthly_contribution", plan.monthly_contribution)?;
    if plan.years_to_contribute > MAX_YEARS_TO_CONTRIBUTE {
        return Err(CoreError::invalid(
            "years_to_contribute",
            format!("must be between 0 and {MAX_YEARS_TO_CONTRIBUTE}"),
        ));
    }
    for (field, age) in [
        ("user_current_age", plan.user_current_age),
        ("income_start_age", plan.income_start_age),
        ("income_end_age", plan.income_end_age),
    ] {
        if let Some(age) = age {
            age_in_range(field, age)?;
        }
    }
    for (field, value) in [
        ("income_rate", plan.income_rate),
        ("employer_match_percentage", plan.employer_match_percentage),
        ("employer_match_cap", plan.employer_match_cap),
        ("user_annual_salary", plan.user_annual_salary),
    ] {
        if let Some(value) = value {
            non_negative(field, value)?;
        }
    }
    Ok(())
}

pub fn validate_vehicle_params(params: &VehicleParams) -> CoreResult<()> {
    age_in_range("current_age", params.current_age)?;
    age_in_range("income_start_age", params.income_start_age)?;
    age_in_range("income_end_age", params.income_end_age)?;
    if params.years_to_contribute > MAX_YEARS_TO_CONTRIBUTE {
        return Err(CoreError::invalid(
            "years_to_contribute",
            format!("must be between 0 and {MAX_YEARS_TO_CONTRIBUTE}"),
        ));
    }
    non_negative("monthly_contribution", params.monthly_contribution)?;
    non_negative("current_value", params.current_value)
}

pub fn validate_calculator_config(config: &CalculatorConfig) -> CoreResult<()> {
    if !(0.0..=1.0).contains(&config.tax_rate) {
        return Err(CoreError::invalid("tax_rate", "must be between 0 and 1"));
    }
    if !config.inflation_rate.is_finite() || config.inflation_rate.abs() > 1.0 {
        return Err(CoreError::invalid("inflation_rate", "must be between -1 and 1"));
    }
    Ok(())
}

//! Static lookup tables: per-vehicle return assumptions, per-scenario rate
//! sets and the plan policy rules the projection waterfall consults.

use serde::Serialize;

use super::error::{CoreError, CoreResult};
use super::types::{PlanType, Scenario};

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct VehicleAssumption {
    pub avg_return: f64,
    pub policy_cost: f64,
    pub volatility: f64,
    pub tax_advantage: bool,
}

const fn vehicle(
    avg_return: f64,
    policy_cost: f64,
    volatility: f64,
    tax_advantage: bool,
) -> VehicleAssumption {
    VehicleAssumption {
        avg_return,
        policy_cost,
        volatility,
        tax_advantage,
    }
}

static VEHICLE_ASSUMPTIONS: [(PlanType, VehicleAssumption); 12] = [
    (PlanType::MaxFundedIul, vehicle(0.065, 0.015, 0.02, true)),
    (PlanType::WholeLife, vehicle(0.045, 0.02, 0.0, true)),
    (PlanType::RothIra, vehicle(0.08, 0.0, 0.15, true)),
    (PlanType::Traditional401k, vehicle(0.08, 0.0, 0.15, false)),
    (PlanType::Roth401k, vehicle(0.08, 0.0, 0.15, true)),
    (PlanType::Solo401k, vehicle(0.08, 0.0, 0.15, false)),
    (PlanType::Hsa, vehicle(0.06, 0.0, 0.10, true)),
    (PlanType::Plan529, vehicle(0.07, 0.0, 0.12, true)),
    (PlanType::RealEstate, vehicle(0.09, 0.03, 0.10, false)),
    (PlanType::PrivateEquity, vehicle(0.12, 0.02, 0.25, false)),
    (PlanType::CdsSavings, vehicle(0.025, 0.0, 0.0, false)),
    (PlanType::NonQualAnnuity, vehicle(0.04, 0.015, 0.0, false)),
];

pub fn vehicle_assumption(plan_type: PlanType) -> CoreResult<&'static VehicleAssumption> {
    VEHICLE_ASSUMPTIONS
        .iter()
        .find(|(key, _)| *key == plan_type)
        .map(|(_, assumption)| assumption)
        .ok_or_else(|| CoreError::UnknownVehicle(plan_type.as_str().to_string()))
}

pub fn vehicle_assumptions() -> impl Iterator<Item = (PlanType, &'static VehicleAssumption)> {
    VEHICLE_ASSUMPTIONS
        .iter()
        .map(|(plan_type, assumption)| (*plan_type, assumption))
}

/// Household-level rates for one scenario.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScenarioRates {
    pub market_return: f64,
    pub income_growth: f64,
    pub expense_growth: f64,
}

pub fn scenario_rates(scenario: Scenario) -> ScenarioRates {
    match scenario {
        Scenario::Predicted => ScenarioRates {
            market_return: 0.07,
            income_growth: 0.03,
            expense_growth: 0.03,
        },
        Scenario::Best => ScenarioRates {
            market_return: 0.10,
            income_growth: 0.05,
            expense_growth: 0.02,
        },
        Scenario::Worst => ScenarioRates {
            market_return: 0.03,
            income_growth: 0.01,
            expense_growth: 0.04,
        },
    }
}

const FALLBACK_PLAN_RETURN: f64 = 0.05;

/// (predicted, best, worst)
static PLAN_RETURNS: [(PlanType, [f64; 3]); 12] = [
    (PlanType::MaxFundedIul, [0.065, 0.085, 0.03]),
    (PlanType::WholeLife, [0.045, 0.055, 0.025]),
    (PlanType::RothIra, [0.08, 0.12, 0.02]),
    (PlanType::Traditional401k, [0.08, 0.12, 0.02]),
    (PlanType::Roth401k, [0.08, 0.12, 0.02]),
    (PlanType::Solo401k, [0.08, 0.12, 0.02]),
    (PlanType::Hsa, [0.06, 0.09, 0.02]),
    (PlanType::Plan529, [0.07, 0.10, 0.03]),
    (PlanType::RealEstate, [0.09, 0.15, 0.04]),
    (PlanType::PrivateEquity, [0.12, 0.18, 0.05]),
    (PlanType::CdsSavings, [0.025, 0.04, 0.015]),
    (PlanType::NonQualAnnuity, [0.04, 0.06, 0.02]),
];

pub fn plan_return(plan_type: PlanType, scenario: Scenario) -> f64 {
    let column = match scenario {
        Scenario::Predicted => 0,
        Scenario::Best => 1,
        Scenario::Worst => 2,
    };
    PLAN_RETURNS
        .iter()
        .find(|(key, _)| *key == plan_type)
        .map(|(_, rates)| rates[column])
        .unwrap_or(FALLBACK_PLAN_RETURN)
}

/// Business rules attached to a plan type.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlanPolicy {
    pub employer_match_eligible: bool,
    /// A household may hold at most one plan of this type.
    pub single_instance: bool,
    /// Annual policy fee deducted from plan growth.
    pub insurance_fee: f64,
    pub retirement_vehicle: bool,
}

const INSURANCE_FEE: f64 = 0.015;

pub fn plan_policy(plan_type: PlanType) -> PlanPolicy {
    let base = PlanPolicy {
        employer_match_eligible: false,
        single_instance: false,
        insurance_fee: 0.0,
        retirement_vehicle: false,
    };
    match plan_type {
        PlanType::Traditional401k | PlanType::Roth401k | PlanType::Solo401k => PlanPolicy {
            employer_match_eligible: true,
            single_instance: true,
            retirement_vehicle: true,
            ..base
        },
        PlanType::RothIra => PlanPolicy {
            single_instance: true,
            retirement_vehicle: true,
            ..base
        },
        PlanType::Hsa => PlanPolicy {
            single_instance: true,
            ..base
        },
        PlanType::MaxFundedIul | PlanType::WholeLife => PlanPolicy {
            insurance_fee: INSURANCE_FEE,
            retirement_vehicle: true,
            ..base
        },
        PlanType::NonQualAnnuity => PlanPolicy {
            insurance_fee: INSURANCE_FEE,
            ..base
        },
        PlanType::Plan529
        | PlanType::RealEstate
        | PlanType::PrivateEquity
        | PlanType::CdsSavings
        | PlanType::Other => base,
    }
}

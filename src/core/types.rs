use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::CoreError;

/// Deserializes through `FromStr`, so wire names are matched without regard to case.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PlanType {
    #[serde(rename = "Max-Funded IUL")]
    MaxFundedIul,
    #[serde(rename = "Whole Life (IBC)")]
    WholeLife,
    #[serde(rename = "Roth IRA")]
    RothIra,
    #[serde(rename = "Traditional 401k")]
    Traditional401k,
    #[serde(rename = "Roth 401k")]
    Roth401k,
    #[serde(rename = "Solo 401k")]
    Solo401k,
    #[serde(rename = "HSA")]
    Hsa,
    #[serde(rename = "529 Plan")]
    Plan529,
    #[serde(rename = "Real Estate")]
    RealEstate,
    #[serde(rename = "Private Equity")]
    PrivateEquity,
    #[serde(rename = "CDs / Savings")]
    CdsSavings,
    #[serde(rename = "Non-Qual Annuity")]
    NonQualAnnuity,
    Other,
}

impl PlanType {
    pub const ALL: [PlanType; 13] = [
        PlanType::MaxFundedIul,
        PlanType::WholeLife,
        PlanType::RothIra,
        PlanType::Traditional401k,
        PlanType::Roth401k,
        PlanType::Solo401k,
        PlanType::Hsa,
        PlanType::Plan529,
        PlanType::RealEstate,
        PlanType::PrivateEquity,
        PlanType::CdsSavings,
        PlanType::NonQualAnnuity,
        PlanType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlanType::MaxFundedIul => "Max-Funded IUL",
            PlanType::WholeLife => "Whole Life (IBC)",
            PlanType::RothIra => "Roth IRA",
            PlanType::Traditional401k => "Traditional 401k",
            PlanType::Roth401k => "Roth 401k",
            PlanType::Solo401k => "Solo 401k",
            PlanType::Hsa => "HSA",
            PlanType::Plan529 => "529 Plan",
            PlanType::RealEstate => "Real Estate",
            PlanType::PrivateEquity => "Private Equity",
            PlanType::CdsSavings => "CDs / Savings",
            PlanType::NonQualAnnuity => "Non-Qual Annuity",
            PlanType::Other => "Other",
        }
    }

    /// Keyword match used by the diversification score.
    pub fn is_retirement_account(self) -> bool {
        let name = self.as_str();
        name.contains("401k") || name.contains("IRA")
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        PlanType::ALL
            .into_iter()
            .find(|plan_type| plan_type.as_str().eq_ignore_ascii_case(trimmed))
            .or(match trimmed {
                "Whole Life" => Some(PlanType::WholeLife),
                "CDs" => Some(PlanType::CdsSavings),
                _ => None,
            })
            .ok_or_else(|| CoreError::UnknownVehicle(trimmed.to_string()))
    }
}

impl TryFrom<String> for PlanType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    #[default]
    Predicted,
    Best,
    Worst,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Predicted, Scenario::Best, Scenario::Worst];

    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::Predicted => "predicted",
            Scenario::Best => "best",
            Scenario::Worst => "worst",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "predicted" | "average" | "expected" => Ok(Scenario::Predicted),
            "best" | "optimistic" => Ok(Scenario::Best),
            "worst" | "pessimistic" => Ok(Scenario::Worst),
            other => Err(CoreError::invalid(
                "scenario",
                format!("unknown scenario '{other}', expected predicted, best or worst"),
            )),
        }
    }
}

/// A named savings, insurance or retirement vehicle held by a household.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    pub plan_type: PlanType,
    #[serde(default)]
    pub cash_value: f64,
    #[serde(default)]
    pub monthly_contribution: f64,
    #[serde(default)]
    pub years_to_contribute: u32,
    #[serde(default)]
    pub user_current_age: Option<u32>,
    /// Explicit annual income stream paid by the plan in retirement.
    #[serde(default)]
    pub income_rate: Option<f64>,
    #[serde(default)]
    pub income_start_age: Option<u32>,
    #[serde(default)]
    pub income_end_age: Option<u32>,
    #[serde(default)]
    pub employer_match_enabled: Option<bool>,
    #[serde(default)]
    pub employer_match_percentage: Option<f64>,
    #[serde(default)]
    pub employer_match_cap: Option<f64>,
    #[serde(default)]
    pub user_annual_salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PlanInput {
    pub fn new(plan_type: PlanType) -> Self {
        Self {
            plan_type,
            cash_value: 0.0,
            monthly_contribution: 0.0,
            years_to_contribute: 0,
            user_current_age: None,
            income_rate: None,
            income_start_age: None,
            income_end_age: None,
            employer_match_enabled: None,
            employer_match_percentage: None,
            employer_match_cap: None,
            user_annual_salary: None,
            notes: None,
        }
    }

    pub fn annual_contribution(&self) -> f64 {
        self.monthly_contribution * 12.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdSnapshot {
    pub age: u32,
    #[serde(default)]
    pub monthly_income: f64,
    #[serde(default)]
    pub side_income: f64,
    #[serde(default)]
    pub monthly_expenses: f64,
    #[serde(default)]
    pub savings: f64,
    #[serde(default)]
    pub investments: f64,
    #[serde(default)]
    pub debt: f64,
    #[serde(default)]
    pub debt_interest_rate: Option<f64>,
    #[serde(default)]
    pub plans: Vec<PlanInput>,
    #[serde(default)]
    pub retirement_age: Option<u32>,
}

impl HouseholdSnapshot {
    pub fn total_monthly_income(&self) -> f64 {
        self.monthly_income + self.side_income
    }

    pub fn monthly_plan_contributions(&self) -> f64 {
        self.plans.iter().map(|p| p.monthly_contribution).sum()
    }

    pub fn plan_cash_values(&self) -> f64 {
        self.plans.iter().map(|p| p.cash_value).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanValue {
    pub plan_type: PlanType,
    pub cash_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionYearRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub age: u32,
    pub annual_income: f64,
    pub annual_expenses: f64,
    pub annual_surplus: f64,
    pub debt_payment: f64,
    pub savings: f64,
    pub investments: f64,
    pub plan_contributions: f64,
    pub employer_match: f64,
    pub plan_cash_values: f64,
    pub plan_details: Vec<PlanValue>,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,
    pub debt_remaining: f64,
    pub emergency_fund_funded: bool,
    pub emergency_fund_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionSummary {
    pub starting_net_worth: f64,
    pub ending_net_worth: f64,
    pub net_worth_growth: f64,
    pub debt_free_year: Option<i32>,
    pub debt_free_age: Option<u32>,
    pub total_employee_contributions: f64,
    pub total_employer_match: f64,
    pub total_debt_paid: f64,
    pub final_savings: f64,
    pub final_investments: f64,
    pub final_plan_values: f64,
    pub projected_annual_retirement_income: f64,
    pub projected_monthly_retirement_income: f64,
    pub income_replacement_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub scenario: Scenario,
    pub projections: Vec<ProjectionYearRecord>,
    pub summary: ProjectionSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSet {
    pub predicted: Projection,
    pub best: Projection,
    pub worst: Projection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_types_deserialize_like_they_parse() {
        let plans: Vec<PlanInput> = serde_json::from_value(serde_json::json!([
            { "plan_type": "roth ira" },
            { "plan_type": "Whole Life" },
            { "plan_type": "CDs" },
            { "plan_type": "Traditional 401k" }
        ]))
        .unwrap();
        let types: Vec<PlanType> = plans.iter().map(|plan| plan.plan_type).collect();
        assert_eq!(
            types,
            vec![
                PlanType::RothIra,
                PlanType::WholeLife,
                PlanType::CdsSavings,
                PlanType::Traditional401k
            ]
        );
        assert_eq!("ROTH IRA".parse::<PlanType>(), Ok(PlanType::RothIra));
    }

    #[test]
    fn unknown_plan_types_fail_to_deserialize() {
        let err = serde_json::from_value::<PlanType>(serde_json::json!("Crypto Moonshot"))
            .unwrap_err();
        assert!(err.to_string().contains("unknown vehicle type: Crypto Moonshot"));
    }

    #[test]
    fn plan_types_serialize_as_display_names() {
        assert_eq!(
            serde_json::to_value(PlanType::WholeLife).unwrap(),
            serde_json::json!("Whole Life (IBC)")
        );
        assert_eq!(serde_json::to_value(PlanType::Plan529).unwrap(), "529 Plan");
    }
}

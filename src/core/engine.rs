use serde::{Deserialize, Serialize};

use super::assumptions::{ScenarioRates, plan_policy, plan_return, scenario_rates};
use super::error::CoreResult;
use super::money::{ratio, round_cents, round_to};
use super::types::{
    HouseholdSnapshot, PlanInput, PlanValue, Projection, ProjectionSummary, ProjectionYearRecord,
    Scenario, ScenarioSet,
};
use super::validate::validate_snapshot;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub default_retirement_age: u32,
    pub savings_account_rate: f64,
    pub default_debt_interest_rate: f64,
    pub emergency_fund_months: f64,
    pub safe_withdrawal_rate: f64,
    /// Calendar year of the first projected record, if known.
    pub start_year: Option<i32>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            default_retirement_age: 65,
            savings_account_rate: 0.005,
            default_debt_interest_rate: 0.18,
            emergency_fund_months: 6.0,
            safe_withdrawal_rate: 0.04,
            start_year: None,
        }
    }
}

impl ProjectionConfig {
    fn emergency_fund_target(&self, annual_expenses: f64) -> f64 {
        annual_expenses / 12.0 * self.emergency_fund_months
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ContributionFlow {
    employee: f64,
    employer: f64,
}

/// Balances carried from one simulated year to the next.
#[derive(Debug)]
struct Household {
    savings: f64,
    investments: f64,
    debt: f64,
    annual_income: f64,
    annual_expenses: f64,
    plan_values: Vec<f64>,
}

pub fn run_projection(
    snapshot: &HouseholdSnapshot,
    scenario: Scenario,
    config: &ProjectionConfig,
) -> CoreResult<Projection> {
    validate_snapshot(snapshot)?;

    let current_age = snapshot.age;
    let retirement_age = snapshot
        .retirement_age
        .unwrap_or(config.default_retirement_age)
        .max(current_age);
    let rates = scenario_rates(scenario);
    let debt_interest_rate = snapshot
        .debt_interest_rate
        .unwrap_or(config.default_debt_interest_rate);

    let mut household = Household {
        savings: snapshot.savings,
        investments: snapshot.investments,
        debt: snapshot.debt,
        annual_income: snapshot.total_monthly_income() * 12.0,
        annual_expenses: snapshot.monthly_expenses * 12.0,
        plan_values: snapshot.plans.iter().map(|p| p.cash_value).collect(),
    };
    let mut emergency_fund_target = config.emergency_fund_target(household.annual_expenses);
    let mut prior_flows: Vec<ContributionFlow> = Vec::new();

    let years = (retirement_age - current_age) as usize + 1;
    let mut records = Vec::with_capacity(years);

    for offset in 0..years {
        let age = current_age + offset as u32;

        let flows: Vec<ContributionFlow> = snapshot
            .plans
            .iter()
            .map(|plan| plan_contribution(plan, current_age, age))
            .collect();
        let plan_contributions: f64 = flows.iter().map(|f| f.employee).sum();
        let employer_match: f64 = flows.iter().map(|f| f.employer).sum();

        let annual_income = household.annual_income;
        let annual_expenses = household.annual_expenses;
        let annual_surplus = annual_income - annual_expenses - plan_contributions;

        let debt_payment = apply_waterfall(
            &mut household,
            annual_surplus,
            emergency_fund_target,
            debt_interest_rate,
            &rates,
            config,
        );

        // The first projected year reports starting cash values.
        if offset > 0 {
            grow_plan_values(
                &mut household.plan_values,
                &snapshot.plans,
                &prior_flows,
                scenario,
            );
        }
        prior_flows = flows;

        let plan_cash_values: f64 = household.plan_values.iter().sum();
        let total_assets =
            round_cents(household.savings + household.investments + plan_cash_values);
        let total_liabilities = round_cents(household.debt);
        let funded = household.savings >= emergency_fund_target;

        records.push(ProjectionYearRecord {
            year: config.start_year.map(|y| y + offset as i32),
            age,
            annual_income: round_cents(annual_income),
            annual_expenses: round_cents(annual_expenses),
            annual_surplus: round_cents(annual_surplus),
            debt_payment: round_cents(debt_payment),
            savings: round_cents(household.savings),
            investments: round_cents(household.investments),
            plan_contributions: round_cents(plan_contributions),
            employer_match: round_cents(employer_match),
            plan_cash_values: round_cents(plan_cash_values),
            plan_details: snapshot
                .plans
                .iter()
                .zip(&household.plan_values)
                .map(|(plan, value)| PlanValue {
                    plan_type: plan.plan_type,
                    cash_value: round_cents(*value),
                })
                .collect(),
            total_assets,
            total_liabilities,
            net_worth: round_cents(total_assets - total_liabilities),
            debt_remaining: total_liabilities,
            emergency_fund_funded: funded,
            emergency_fund_status: emergency_fund_status(
                funded,
                household.savings,
                emergency_fund_target,
            ),
        });

        household.annual_income *= 1.0 + rates.income_growth;
        household.annual_expenses *= 1.0 + rates.expense_growth;
        emergency_fund_target = config.emergency_fund_target(household.annual_expenses);
    }

    let summary = summarize(&records, snapshot, config);
    tracing::debug!(
        scenario = %scenario,
        years = records.len(),
        ending_net_worth = summary.ending_net_worth,
        "projection complete"
    );

    Ok(Projection {
        scenario,
        projections: records,
        summary,
    })
}

pub fn run_all_scenarios(
    snapshot: &HouseholdSnapshot,
    config: &ProjectionConfig,
) -> CoreResult<ScenarioSet> {
    Ok(ScenarioSet {
        predicted: run_projection(snapshot, Scenario::Predicted, config)?,
        best: run_projection(snapshot, Scenario::Best, config)?,
        worst: run_projection(snapshot, Scenario::Worst, config)?,
    })
}

/// Employee and employer money going into `plan` in the year the household is `age`.
fn plan_contribution(plan: &PlanInput, household_age: u32, age: u32) -> ContributionFlow {
    let plan_age = plan.user_current_age.unwrap_or(household_age);
    let years_since_start = i64::from(age) - i64::from(plan_age);
    if years_since_start >= i64::from(plan.years_to_contribute) {
        return ContributionFlow::default();
    }

    let employee = plan.annual_contribution();
    ContributionFlow {
        employee,
        employer: employer_match(plan, employee),
    }
}

fn employer_match(plan: &PlanInput, annual_contribution: f64) -> f64 {
    if !plan.employer_match_enabled.unwrap_or(false)
        || !plan_policy(plan.plan_type).employer_match_eligible
    {
        return 0.0;
    }
    let salary = plan.user_annual_salary.unwrap_or(0.0);
    if salary <= 0.0 {
        return 0.0;
    }
    let contribution_rate = annual_contribution / salary;
    let matched_rate = contribution_rate.min(plan.employer_match_cap.unwrap_or(0.0));
    salary * matched_rate * plan.employer_match_percentage.unwrap_or(0.0)
}

/// Runs one year of cash through debt service, shortfall cover, the
/// emergency fund and investments. Returns the debt payment made.
fn apply_waterfall(
    household: &mut Household,
    mut surplus: f64,
    emergency_fund_target: f64,
    debt_interest_rate: f64,
    rates: &ScenarioRates,
    config: &ProjectionConfig,
) -> f64 {
    let mut debt_payment = 0.0;
    if household.debt > 0.0 {
        household.debt *= 1.0 + debt_interest_rate;

        let excess_savings = (household.savings - emergency_fund_target).max(0.0);
        let available = surplus.max(0.0) + excess_savings;
        debt_payment = household.debt.min(available);

        let from_surplus = debt_payment.min(surplus.max(0.0));
        let from_savings = debt_payment - from_surplus;
        surplus -= from_surplus;
        household.savings -= from_savings;
        household.debt -= debt_payment;
    }

    if surplus < 0.0 {
        cover_shortfall(household, -surplus);
        surplus = 0.0;
    }

    if household.savings < emergency_fund_target && surplus > 0.0 {
        let needed = emergency_fund_target - household.savings;
        let contribution = surplus.min(needed);
        household.savings += contribution;
        surplus -= contribution;
    } else {
        household.savings *= 1.0 + config.savings_account_rate;
    }

    if household.investments > 0.0 {
        household.investments *= 1.0 + rates.market_return;
    }

    if surplus > 0.0 {
        if household.debt <= 0.0 && household.savings >= emergency_fund_target {
            household.investments += surplus;
        } else {
            household.savings += surplus;
        }
    }

    debt_payment
}

/// Draws a cash deficit from savings, then investments, and carries the rest as debt.
fn cover_shortfall(household: &mut Household, deficit: f64) {
    let from_savings = deficit.min(household.savings.max(0.0));
    household.savings -= from_savings;
    let remaining = deficit - from_savings;

    let from_investments = remaining.min(household.investments.max(0.0));
    household.investments -= from_investments;

    household.debt += remaining - from_investments;
}

fn grow_plan_values(
    values: &mut [f64],
    plans: &[PlanInput],
    prior_flows: &[ContributionFlow],
    scenario: Scenario,
) {
    for ((value, plan), flow) in values.iter_mut().zip(plans).zip(prior_flows) {
        *value += flow.employee + flow.employer;
        let growth =
            plan_return(plan.plan_type, scenario) - plan_policy(plan.plan_type).insurance_fee;
        *value *= 1.0 + growth;
    }
}

fn emergency_fund_status(funded: bool, savings: f64, target: f64) -> String {
    if funded || target <= 0.0 {
        "Fully Funded".to_string()
    } else {
        format!("{:.0}% Funded", ratio(savings, target) * 100.0)
    }
}

fn summarize(
    records: &[ProjectionYearRecord],
    snapshot: &HouseholdSnapshot,
    config: &ProjectionConfig,
) -> ProjectionSummary {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return ProjectionSummary {
            starting_net_worth: 0.0,
            ending_net_worth: 0.0,
            net_worth_growth: 0.0,
            debt_free_year: None,
            debt_free_age: None,
            total_employee_contributions: 0.0,
            total_employer_match: 0.0,
            total_debt_paid: 0.0,
            final_savings: 0.0,
            final_investments: 0.0,
            final_plan_values: 0.0,
            projected_annual_retirement_income: 0.0,
            projected_monthly_retirement_income: 0.0,
            income_replacement_rate: 0.0,
        };
    };

    let debt_free = records.iter().find(|r| r.debt_remaining == 0.0);

    let plan_income_streams: f64 = snapshot
        .plans
        .iter()
        .filter_map(|p| p.income_rate)
        .filter(|rate| *rate > 0.0)
        .sum();
    let retirement_income = last.investments * config.safe_withdrawal_rate
        + last.plan_cash_values * config.safe_withdrawal_rate
        + plan_income_streams;

    ProjectionSummary {
        starting_net_worth: first.net_worth,
        ending_net_worth: last.net_worth,
        net_worth_growth: round_cents(last.net_worth - first.net_worth),
        debt_free_year: debt_free.and_then(|r| r.year),
        debt_free_age: debt_free.map(|r| r.age),
        total_employee_contributions: round_cents(
            records.iter().map(|r| r.plan_contributions).sum(),
        ),
        total_employer_match: round_cents(records.iter().map(|r| r.employer_match).sum()),
        total_debt_paid: round_cents(records.iter().map(|r| r.debt_payment).sum()),
        final_savings: last.savings,
        final_investments: last.investments,
        final_plan_values: last.plan_cash_values,
        projected_annual_retirement_income: round_cents(retirement_income),
        projected_monthly_retirement_income: round_cents(retirement_income / 12.0),
        income_replacement_rate: round_to(ratio(retirement_income, last.annual_income) * 100.0, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CoreError;
    use crate::core::types::PlanType;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_snapshot() -> HouseholdSnapshot {
        HouseholdSnapshot {
            age: 30,
            monthly_income: 6_000.0,
            side_income: 500.0,
            monthly_expenses: 4_000.0,
            savings: 10_000.0,
            investments: 20_000.0,
            debt: 8_000.0,
            debt_interest_rate: Some(0.18),
            plans: Vec::new(),
            retirement_age: Some(65),
        }
    }

    fn zero_growth_config() -> ProjectionConfig {
        ProjectionConfig {
            savings_account_rate: 0.0,
            ..ProjectionConfig::default()
        }
    }

    fn roth_401k_with_match() -> PlanInput {
        PlanInput {
            cash_value: 10_000.0,
            monthly_contribution: 500.0,
            years_to_contribute: 10,
            user_current_age: Some(30),
            employer_match_enabled: Some(true),
            employer_match_percentage: Some(0.5),
            employer_match_cap: Some(0.06),
            user_annual_salary: Some(80_000.0),
            ..PlanInput::new(PlanType::Roth401k)
        }
    }

    #[test]
    fn produces_one_record_per_year_through_retirement_inclusive() {
        let projection =
            run_projection(&sample_snapshot(), Scenario::Predicted, &ProjectionConfig::default())
                .unwrap();
        assert_eq!(projection.scenario, Scenario::Predicted);
        assert_eq!(projection.projections.len(), 36);
        assert_eq!(projection.projections[0].age, 30);
        assert_eq!(projection.projections[35].age, 65);
    }

    #[test]
    fn retirement_age_defaults_from_config() {
        let mut snapshot = sample_snapshot();
        snapshot.retirement_age = None;
        let config = ProjectionConfig {
            default_retirement_age: 40,
            ..ProjectionConfig::default()
        };
        let projection = run_projection(&snapshot, Scenario::Best, &config).unwrap();
        assert_eq!(projection.projections.len(), 11);
        assert_eq!(projection.projections.last().unwrap().age, 40);
    }

    #[test]
    fn retirement_at_current_age_yields_a_single_year() {
        let mut snapshot = sample_snapshot();
        snapshot.retirement_age = Some(30);
        let projection =
            run_projection(&snapshot, Scenario::Worst, &ProjectionConfig::default()).unwrap();
        assert_eq!(projection.projections.len(), 1);
    }

    #[test]
    fn invalid_snapshots_produce_no_projection() {
        let mut snapshot = sample_snapshot();
        snapshot.retirement_age = Some(25);
        let err = run_projection(&snapshot, Scenario::Predicted, &ProjectionConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidInput { ref field, .. } if field == "retirement_age"
        ));
    }

    #[test]
    fn first_year_waterfall_matches_hand_computation() {
        // Income 78,000, expenses 48,000 -> surplus 30,000; target 24,000.
        let snapshot = sample_snapshot();
        let config = zero_growth_config();
        let projection = run_projection(&snapshot, Scenario::Predicted, &config).unwrap();
        let first = &projection.projections[0];

        assert_approx(first.annual_income, 78_000.0);
        assert_approx(first.annual_expenses, 48_000.0);
        assert_approx(first.annual_surplus, 30_000.0);
        // Debt accrues to 9,440 and is paid from surplus.
        assert_approx(first.debt_payment, 9_440.0);
        assert_approx(first.debt_remaining, 0.0);
        // Remaining 20,560 fills the 14,000 emergency fund gap, 6,560 goes to investments.
        assert_approx(first.savings, 24_000.0);
        assert_approx(first.investments, 20_000.0 * 1.07 + 6_560.0);
        assert!(first.emergency_fund_funded);
        assert_eq!(first.emergency_fund_status, "Fully Funded");
        assert_approx(first.net_worth, first.total_assets - first.total_liabilities);
    }

    #[test]
    fn excess_savings_pay_down_debt_without_creating_money() {
        let snapshot = HouseholdSnapshot {
            age: 40,
            monthly_income: 3_000.0,
            side_income: 0.0,
            monthly_expenses: 3_000.0,
            savings: 50_000.0,
            investments: 0.0,
            debt: 10_000.0,
            debt_interest_rate: Some(0.0),
            plans: Vec::new(),
            retirement_age: Some(40),
        };
        let projection =
            run_projection(&snapshot, Scenario::Predicted, &zero_growth_config()).unwrap();
        let first = &projection.projections[0];
        assert_approx(first.debt_payment, 10_000.0);
        assert_approx(first.debt_remaining, 0.0);
        assert_approx(first.savings, 40_000.0);
        assert_approx(first.net_worth, 40_000.0);
    }

    #[test]
    fn savings_at_target_are_not_spent_on_debt() {
        let snapshot = HouseholdSnapshot {
            age: 40,
            monthly_income: 3_000.0,
            side_income: 0.0,
            monthly_expenses: 2_500.0,
            savings: 15_000.0,
            investments: 0.0,
            debt: 20_000.0,
            debt_interest_rate: Some(0.10),
            plans: Vec::new(),
            retirement_age: Some(40),
        };
        let projection =
            run_projection(&snapshot, Scenario::Predicted, &zero_growth_config()).unwrap();
        let first = &projection.projections[0];
        // 22,000 after interest, 6,000 surplus applied, savings untouched.
        assert_approx(first.debt_payment, 6_000.0);
        assert_approx(first.debt_remaining, 16_000.0);
        assert_approx(first.savings, 15_000.0);
    }

    #[test]
    fn surplus_is_invested_once_debt_free_and_fund_is_full() {
        let snapshot = HouseholdSnapshot {
            age: 40,
            monthly_income: 5_000.0,
            side_income: 0.0,
            monthly_expenses: 1_000.0,
            savings: 6_000.0,
            investments: 0.0,
            debt: 0.0,
            debt_interest_rate: None,
            plans: Vec::new(),
            retirement_age: Some(40),
        };
        let projection =
            run_projection(&snapshot, Scenario::Predicted, &zero_growth_config()).unwrap();
        let first = &projection.projections[0];
        // Fund already at 6,000 target; 48,000 surplus goes to investments.
        assert_approx(first.savings, 6_000.0);
        assert_approx(first.investments, 48_000.0);
    }

    #[test]
    fn deficits_draw_savings_then_investments_then_debt() {
        let snapshot = HouseholdSnapshot {
            age: 50,
            monthly_income: 1_000.0,
            side_income: 0.0,
            monthly_expenses: 2_000.0,
            savings: 5_000.0,
            investments: 4_000.0,
            debt: 0.0,
            debt_interest_rate: Some(0.0),
            plans: Vec::new(),
            retirement_age: Some(50),
        };
        let projection =
            run_projection(&snapshot, Scenario::Predicted, &zero_growth_config()).unwrap();
        let first = &projection.projections[0];
        assert_approx(first.annual_surplus, -12_000.0);
        assert_approx(first.savings, 0.0);
        assert_approx(first.investments, 0.0);
        assert_approx(first.debt_remaining, 3_000.0);
        assert_approx(first.net_worth, -3_000.0);
        assert_eq!(first.emergency_fund_status, "0% Funded");
    }

    #[test]
    fn employer_match_and_contribution_window() {
        let mut snapshot = sample_snapshot();
        snapshot.debt = 0.0;
        snapshot.plans = vec![roth_401k_with_match()];
        let projection =
            run_projection(&snapshot, Scenario::Predicted, &ProjectionConfig::default()).unwrap();

        // 6,000 / 80,000 = 7.5% capped at 6%, matched at 50% -> 2,400.
        let first = &projection.projections[0];
        assert_approx(first.plan_contributions, 6_000.0);
        assert_approx(first.employer_match, 2_400.0);
        assert_approx(first.plan_cash_values, 10_000.0);

        let second = &projection.projections[1];
        assert_approx(second.plan_cash_values, round_cents((10_000.0 + 8_400.0) * 1.08));
        assert_eq!(second.plan_details.len(), 1);
        assert_eq!(second.plan_details[0].plan_type, PlanType::Roth401k);

        let eleventh = &projection.projections[10];
        assert_eq!(eleventh.age, 40);
        assert_approx(eleventh.plan_contributions, 0.0);
        assert_approx(eleventh.employer_match, 0.0);

        assert_approx(projection.summary.total_employee_contributions, 60_000.0);
        assert_approx(projection.summary.total_employer_match, 24_000.0);
    }

    #[test]
    fn match_requires_eligible_type_and_salary() {
        let mut ira = roth_401k_with_match();
        ira.plan_type = PlanType::RothIra;
        assert_eq!(plan_contribution(&ira, 30, 30).employer, 0.0);

        let mut no_salary = roth_401k_with_match();
        no_salary.user_annual_salary = Some(0.0);
        assert_eq!(plan_contribution(&no_salary, 30, 30).employer, 0.0);

        let mut disabled = roth_401k_with_match();
        disabled.employer_match_enabled = None;
        assert_eq!(plan_contribution(&disabled, 30, 30).employer, 0.0);
    }

    #[test]
    fn contribution_window_counts_from_plan_start_age() {
        let mut plan = PlanInput::new(PlanType::Hsa);
        plan.monthly_contribution = 100.0;
        plan.years_to_contribute = 5;
        plan.user_current_age = Some(28);
        assert_approx(plan_contribution(&plan, 30, 32).employee, 1_200.0);
        assert_approx(plan_contribution(&plan, 30, 33).employee, 0.0);

        plan.user_current_age = None;
        assert_approx(plan_contribution(&plan, 30, 34).employee, 1_200.0);
        assert_approx(plan_contribution(&plan, 30, 35).employee, 0.0);
    }

    #[test]
    fn insurance_products_pay_policy_fees() {
        let mut snapshot = sample_snapshot();
        let mut iul = PlanInput::new(PlanType::MaxFundedIul);
        iul.cash_value = 100_000.0;
        snapshot.plans = vec![iul];
        snapshot.retirement_age = Some(31);
        let projection =
            run_projection(&snapshot, Scenario::Predicted, &ProjectionConfig::default()).unwrap();
        assert_approx(
            projection.projections[1].plan_cash_values,
            round_cents(100_000.0 * (1.0 + 0.065 - 0.015)),
        );
    }

    #[test]
    fn scenarios_use_their_growth_tables() {
        let snapshot = sample_snapshot();
        let set = run_all_scenarios(&snapshot, &ProjectionConfig::default()).unwrap();
        assert_approx(set.best.projections[1].annual_income, 78_000.0 * 1.05);
        assert_approx(set.worst.projections[1].annual_expenses, 48_000.0 * 1.04);
        assert_approx(set.predicted.projections[1].annual_income, 78_000.0 * 1.03);
        assert!(set.best.summary.ending_net_worth > set.predicted.summary.ending_net_worth);
        assert!(set.predicted.summary.ending_net_worth > set.worst.summary.ending_net_worth);
    }

    #[test]
    fn summary_reports_debt_free_year_and_retirement_income() {
        let mut snapshot = sample_snapshot();
        let mut annuity = PlanInput::new(PlanType::NonQualAnnuity);
        annuity.income_rate = Some(6_000.0);
        snapshot.plans = vec![annuity];
        let config = ProjectionConfig {
            start_year: Some(2026),
            ..ProjectionConfig::default()
        };
        let projection = run_projection(&snapshot, Scenario::Predicted, &config).unwrap();
        let summary = &projection.summary;
        let last = projection.projections.last().unwrap();

        assert_eq!(projection.projections[0].year, Some(2026));
        assert_eq!(last.year, Some(2061));
        assert_eq!(summary.debt_free_age, Some(30));
        assert_eq!(summary.debt_free_year, Some(2026));
        assert_approx(summary.total_debt_paid, 9_440.0);

        let expected_income = last.investments * 0.04 + last.plan_cash_values * 0.04 + 6_000.0;
        assert_approx_tol(summary.projected_annual_retirement_income, expected_income, 0.01);
        assert_approx_tol(
            summary.projected_monthly_retirement_income,
            expected_income / 12.0,
            0.01,
        );
        assert_approx_tol(
            summary.income_replacement_rate,
            expected_income / last.annual_income * 100.0,
            0.06,
        );
        assert_approx(
            summary.net_worth_growth,
            round_cents(summary.ending_net_worth - summary.starting_net_worth),
        );
    }

    #[test]
    fn zero_income_reports_zero_replacement_rate() {
        let snapshot = HouseholdSnapshot {
            age: 60,
            monthly_income: 0.0,
            side_income: 0.0,
            monthly_expenses: 0.0,
            savings: 1_000.0,
            investments: 50_000.0,
            debt: 0.0,
            debt_interest_rate: None,
            plans: Vec::new(),
            retirement_age: Some(65),
        };
        let projection =
            run_projection(&snapshot, Scenario::Predicted, &ProjectionConfig::default()).unwrap();
        assert_eq!(projection.summary.income_replacement_rate, 0.0);
        assert!(projection.summary.projected_annual_retirement_income > 0.0);
        assert!(projection.projections.iter().all(|r| r.emergency_fund_funded));
    }

    #[test]
    fn projection_serializes_with_snake_case_keys() {
        let projection =
            run_projection(&sample_snapshot(), Scenario::Best, &ProjectionConfig::default())
                .unwrap();
        let json = serde_json::to_string(&projection).unwrap();
        assert!(json.contains("\"scenario\":\"best\""));
        assert!(json.contains("\"debt_remaining\""));
        assert!(json.contains("\"income_replacement_rate\""));
        assert!(!json.contains("\"year\""));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_debt_never_negative_and_net_worth_is_continuous(
            age in 18u32..70,
            span in 0u32..40,
            income in 0u32..20_000,
            side in 0u32..3_000,
            expenses in 0u32..15_000,
            savings in 0u32..200_000,
            investments in 0u32..500_000,
            debt in 0u32..150_000,
            debt_rate_bp in 0u32..3_000,
            contribution in 0u32..2_000,
            plan_cash in 0u32..100_000,
            scenario_index in 0usize..3,
        ) {
            let mut plan = PlanInput::new(PlanType::Traditional401k);
            plan.cash_value = plan_cash as f64;
            plan.monthly_contribution = contribution as f64;
            plan.years_to_contribute = span / 2;
            plan.employer_match_enabled = Some(true);
            plan.employer_match_percentage = Some(1.0);
            plan.employer_match_cap = Some(0.04);
            plan.user_annual_salary = Some(income as f64 * 12.0);

            let snapshot = HouseholdSnapshot {
                age,
                monthly_income: income as f64,
                side_income: side as f64,
                monthly_expenses: expenses as f64,
                savings: savings as f64,
                investments: investments as f64,
                debt: debt as f64,
                debt_interest_rate: Some(debt_rate_bp as f64 / 10_000.0),
                plans: vec![plan, PlanInput::new(PlanType::RealEstate)],
                retirement_age: Some((age + span).min(120)),
            };
            let scenario = Scenario::ALL[scenario_index];
            let projection =
                run_projection(&snapshot, scenario, &ProjectionConfig::default()).unwrap();

            prop_assert_eq!(
                projection.projections.len() as u32,
                snapshot.retirement_age.unwrap() - age + 1
            );
            for record in &projection.projections {
                prop_assert!(record.debt_remaining >= 0.0);
                prop_assert!(record.savings >= 0.0);
                prop_assert!(record.investments >= 0.0);
                prop_assert!(record.net_worth.is_finite());
                prop_assert_eq!(
                    record.net_worth,
                    round_cents(record.total_assets - record.total_liabilities)
                );
                prop_assert!(
                    (record.net_worth - (record.total_assets - record.total_liabilities)).abs()
                        <= 0.005
                );
            }
            prop_assert!(projection.summary.income_replacement_rate.is_finite());
        }
    }
}

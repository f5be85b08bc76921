//! Wealth velocity: stages a household and estimates how fast its net worth
//! is compounding, in percent per year.

use serde::Serialize;

use super::error::CoreResult;
use super::money::{format_dollars, ratio, round_cents, round_to};
use super::types::HouseholdSnapshot;
use super::validate::validate_snapshot;

pub const INFLATION_PCT: f64 = 3.0;
pub const DEBT_PAYOFF_APR: f64 = 0.15;
pub const ACCELERATION_THRESHOLD: f64 = 50_000.0;
const CASH_RETURN: f64 = 0.04;
const MODERATE_EQUITY_RETURN: f64 = 0.075;
const FOUNDATION_FLOOR_BASE: f64 = 10_000.0;
const FOUNDATION_CLAMP_BELOW: f64 = 5_000.0;
const FOUNDATION_VELOCITY_CAP: f64 = 50.0;
const ACCELERATION_VELOCITY_CAP: f64 = 30.0;
const MILESTONES: [f64; 3] = [10_000.0, 25_000.0, 50_000.0];
const PROJECTION_YEARS: [i32; 4] = [1, 3, 5, 10];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DebtPayoff,
    Foundation,
    Acceleration,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::DebtPayoff => "Debt Payoff Mode",
            Stage::Foundation => "Foundation Building",
            Stage::Acceleration => "Wealth Acceleration",
        }
    }
}

/// The slice of a household snapshot the velocity engine reads.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VelocityInputs {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings: f64,
    pub investments: f64,
    pub debt: f64,
    pub monthly_contributions: f64,
}

impl VelocityInputs {
    pub fn from_snapshot(snapshot: &HouseholdSnapshot) -> Self {
        Self {
            monthly_income: snapshot.total_monthly_income(),
            monthly_expenses: snapshot.monthly_expenses,
            savings: snapshot.savings,
            investments: snapshot.investments,
            debt: snapshot.debt,
            monthly_contributions: snapshot.monthly_plan_contributions(),
        }
    }

    pub fn total_assets(&self) -> f64 {
        self.savings + self.investments
    }

    pub fn net_worth(&self) -> f64 {
        self.total_assets() - self.debt
    }

    pub fn savings_rate(&self) -> f64 {
        ratio(self.monthly_contributions, self.monthly_income)
    }

    fn monthly_surplus(&self) -> f64 {
        self.monthly_income - self.monthly_expenses - self.monthly_contributions
    }
}

pub fn classify(inputs: &VelocityInputs) -> Stage {
    let net_worth = inputs.net_worth();
    let heavy_debt = inputs.debt > inputs.monthly_expenses * 3.0 && inputs.debt > 5_000.0;
    if net_worth < 0.0 || heavy_debt {
        Stage::DebtPayoff
    } else if net_worth < ACCELERATION_THRESHOLD {
        Stage::Foundation
    } else {
        Stage::Acceleration
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Milestone {
    pub target: f64,
    pub reached: bool,
    pub remaining: f64,
    pub months_to_reach: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageDetail {
    DebtPayoff {
        monthly_surplus: f64,
        assumed_apr: f64,
        months_to_debt_free: Option<f64>,
        total_interest: Option<f64>,
    },
    Foundation {
        total_assets: f64,
        allocation_ratio: f64,
        blended_return: f64,
        annual_dollar_growth: f64,
        monthly_dollar_growth: f64,
        velocity_base: f64,
        milestones: Vec<Milestone>,
        #[serde(skip_serializing_if = "Option::is_none")]
        velocity_warning: Option<String>,
    },
    Acceleration {
        allocation_tier: &'static str,
        investment_ratio: f64,
        blended_return: f64,
        expected_return: f64,
        annual_contributions: f64,
        velocity_capped: bool,
    },
}

impl StageDetail {
    pub fn stage(&self) -> Stage {
        match self {
            StageDetail::DebtPayoff { .. } => Stage::DebtPayoff,
            StageDetail::Foundation { .. } => Stage::Foundation,
            StageDetail::Acceleration { .. } => Stage::Acceleration,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Benchmark {
    pub category: &'static str,
    pub description: &'static str,
    pub color: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Acceleration {
    pub status: &'static str,
    pub change: f64,
    pub trend: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WealthProjections {
    pub one_year: f64,
    pub three_years: f64,
    pub five_years: f64,
    pub ten_years: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VelocityMetrics {
    pub monthly_wealth_gain: f64,
    pub annual_wealth_gain: f64,
    pub years_to_double: Option<f64>,
    pub velocity_vs_inflation: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VelocityReport {
    pub stage_label: &'static str,
    pub net_worth: f64,
    pub velocity: f64,
    pub real_velocity: f64,
    pub trend: &'static str,
    pub momentum: &'static str,
    pub savings_rate: f64,
    pub income_velocity_ratio: f64,
    pub percentile: u32,
    pub benchmark: Benchmark,
    pub acceleration: Acceleration,
    pub projections: WealthProjections,
    pub metrics: VelocityMetrics,
    pub recommendations: Vec<String>,
    pub stage_specific_message: String,
    #[serde(flatten)]
    pub details: StageDetail,
}

impl VelocityReport {
    pub fn stage(&self) -> Stage {
        self.details.stage()
    }
}

/// Per-stage numbers the shared report fields are derived from.
struct StageOutput {
    velocity: f64,
    annual_wealth_gain: f64,
    projection_rate: f64,
    annual_new_money: f64,
    recommendations: Vec<String>,
    message: String,
    details: StageDetail,
}

pub fn calculate_wealth_velocity(snapshot: &HouseholdSnapshot) -> CoreResult<VelocityReport> {
    validate_snapshot(snapshot)?;
    Ok(velocity_report(&VelocityInputs::from_snapshot(snapshot)))
}

pub fn velocity_report(inputs: &VelocityInputs) -> VelocityReport {
    let stage = classify(inputs);
    let output = match stage {
        Stage::DebtPayoff => debt_payoff(inputs),
        Stage::Foundation => foundation(inputs),
        Stage::Acceleration => acceleration(inputs),
    };
    let velocity = round_to(output.velocity, 2);
    let net_worth = inputs.net_worth();
    tracing::debug!(stage = stage.label(), velocity, "wealth velocity computed");

    VelocityReport {
        stage_label: stage.label(),
        net_worth: round_cents(net_worth),
        velocity,
        real_velocity: round_to(velocity - INFLATION_PCT, 2),
        trend: trend(velocity),
        momentum: momentum(inputs.savings_rate()),
        savings_rate: round_to(inputs.savings_rate(), 4),
        income_velocity_ratio: round_to(
            ratio(output.annual_wealth_gain, inputs.monthly_income * 12.0) * 100.0,
            2,
        ),
        percentile: percentile(velocity),
        benchmark: benchmark(velocity),
        acceleration: Acceleration {
            status: "unknown",
            change: 0.0,
            trend: "insufficient data",
        },
        projections: project(net_worth, output.projection_rate, output.annual_new_money),
        metrics: VelocityMetrics {
            monthly_wealth_gain: round_cents(output.annual_wealth_gain / 12.0),
            annual_wealth_gain: round_cents(output.annual_wealth_gain),
            years_to_double: (velocity > 0.0).then(|| round_to(72.0 / velocity, 1)),
            velocity_vs_inflation: round_to(velocity - INFLATION_PCT, 2),
        },
        recommendations: output.recommendations,
        stage_specific_message: output.message,
        details: output.details,
    }
}

/// Months to retire `debt` at `payment`/month under monthly rate `rate`,
/// or `None` when the payment never outpaces interest.
pub fn months_to_payoff(debt: f64, payment: f64, rate: f64) -> Option<f64> {
    if debt <= 0.0 {
        return Some(0.0);
    }
    if payment <= 0.0 {
        return None;
    }
    if rate == 0.0 {
        return Some(debt / payment);
    }
    let interest = rate * debt;
    if payment <= interest {
        return None;
    }
    let months = -(1.0 - interest / payment).ln() / rate.ln_1p();
    months.is_finite().then_some(months)
}

fn debt_payoff(inputs: &VelocityInputs) -> StageOutput {
    let surplus = inputs.monthly_surplus();
    let months = months_to_payoff(inputs.debt, surplus, DEBT_PAYOFF_APR / 12.0);
    let total_interest = months.map(|m| round_cents((m * surplus - inputs.debt).max(0.0)));

    let mut recommendations = vec![
        "Direct every spare dollar to the highest-interest balance first".to_string(),
        "Keep a $1,000 starter emergency fund so new charges do not add to the balance"
            .to_string(),
        "Hold new investing to whatever captures an employer match until the debt is gone"
            .to_string(),
    ];
    let message = match months {
        Some(months) => format!(
            "At {}/month you are on track to be debt-free in about {:.0} months.",
            format_dollars(surplus),
            months.ceil()
        ),
        None => {
            recommendations.insert(
                0,
                "Cut expenses or add income: your surplus does not cover the interest".to_string(),
            );
            format!(
                "Your monthly surplus of {} does not keep pace with interest on {} of debt.",
                format_dollars(surplus),
                format_dollars(inputs.debt)
            )
        }
    };

    StageOutput {
        velocity: 0.0,
        annual_wealth_gain: 0.0,
        projection_rate: 0.0,
        annual_new_money: (surplus * 12.0).max(0.0),
        recommendations,
        message,
        details: StageDetail::DebtPayoff {
            monthly_surplus: round_cents(surplus),
            assumed_apr: DEBT_PAYOFF_APR,
            months_to_debt_free: months.map(|m| round_to(m, 1)),
            total_interest,
        },
    }
}

fn foundation(inputs: &VelocityInputs) -> StageOutput {
    let net_worth = inputs.net_worth();
    let total_assets = inputs.total_assets();
    let allocation = ratio(inputs.investments, total_assets);
    let blended_return = allocation * MODERATE_EQUITY_RETURN + (1.0 - allocation) * CASH_RETURN;
    let annual_growth = total_assets * blended_return + inputs.monthly_contributions * 12.0;
    let monthly_growth = annual_growth / 12.0;

    // Tiny balances would otherwise report runaway percentages.
    let clamped = net_worth > 0.0 && net_worth < FOUNDATION_CLAMP_BELOW;
    let base = if clamped { FOUNDATION_FLOOR_BASE } else { net_worth };

    let raw_velocity = if inputs.monthly_income <= 0.0 || net_worth <= 0.0 {
        0.0
    } else {
        ratio(annual_growth, base) * 100.0
    };
    let capped = raw_velocity > FOUNDATION_VELOCITY_CAP;
    let velocity = raw_velocity.min(FOUNDATION_VELOCITY_CAP);

    let mut warnings = Vec::new();
    if clamped {
        warnings.push(format!(
            "Velocity is measured against a {} base while net worth is under {}.",
            format_dollars(FOUNDATION_FLOOR_BASE),
            format_dollars(FOUNDATION_CLAMP_BELOW)
        ));
    }
    if capped {
        warnings.push(format!(
            "Velocity is capped at {FOUNDATION_VELOCITY_CAP:.0}% until net worth grows."
        ));
    }

    let milestones: Vec<Milestone> = MILESTONES
        .iter()
        .map(|&target| {
            let reached = net_worth >= target;
            let remaining = (target - net_worth).max(0.0);
            let months_to_reach = if reached {
                Some(0.0)
            } else if monthly_growth > 0.0 {
                Some(round_to(remaining / monthly_growth, 1))
            } else {
                None
            };
            Milestone {
                target,
                reached,
                remaining: round_cents(remaining),
                months_to_reach,
            }
        })
        .collect();

    let mut recommendations = vec![
        "Build savings to a full six months of expenses".to_string(),
        "Automate plan contributions so new money arrives every month".to_string(),
    ];
    if allocation < 0.5 {
        recommendations.push(
            "Move cash beyond the emergency fund into diversified index funds".to_string(),
        );
    }
    let next = milestones.iter().find(|m| !m.reached);
    if let Some(next) = next {
        recommendations.push(format!(
            "Next milestone: {} ({} to go)",
            format_dollars(next.target),
            format_dollars(next.remaining)
        ));
    }
    let message = format!(
        "You are laying the foundation: {} of net worth on the way to {}.",
        format_dollars(net_worth),
        format_dollars(ACCELERATION_THRESHOLD)
    );

    StageOutput {
        velocity,
        annual_wealth_gain: if velocity > 0.0 { base * velocity / 100.0 } else { 0.0 },
        projection_rate: blended_return,
        annual_new_money: inputs.monthly_contributions * 12.0,
        recommendations,
        message,
        details: StageDetail::Foundation {
            total_assets: round_cents(total_assets),
            allocation_ratio: round_to(allocation, 4),
            blended_return: round_to(blended_return, 4),
            annual_dollar_growth: round_cents(annual_growth),
            monthly_dollar_growth: round_cents(monthly_growth),
            velocity_base: round_cents(base),
            milestones,
            velocity_warning: (!warnings.is_empty()).then(|| warnings.join(" ")),
        },
    }
}

fn acceleration(inputs: &VelocityInputs) -> StageOutput {
    let net_worth = inputs.net_worth();
    let total_assets = inputs.total_assets();
    let investment_ratio = ratio(inputs.investments, total_assets);
    let (tier, rate) = if investment_ratio >= 0.8 {
        ("aggressive", 0.095)
    } else if investment_ratio >= 0.5 {
        ("moderate", 0.075)
    } else {
        ("conservative", 0.055)
    };
    let expected_return = total_assets * rate;
    let annual_contributions = inputs.monthly_contributions * 12.0;

    let raw_velocity = if inputs.monthly_income <= 0.0 {
        0.0
    } else {
        ratio(expected_return + annual_contributions, net_worth) * 100.0
    };
    let capped = raw_velocity > ACCELERATION_VELOCITY_CAP;
    let velocity = raw_velocity.min(ACCELERATION_VELOCITY_CAP);

    let mut recommendations = match tier {
        "conservative" => vec![
            "Shift idle cash toward a diversified equity allocation".to_string(),
        ],
        "moderate" => vec!["Review whether your allocation matches your time horizon".to_string()],
        _ => vec!["Rebalance at least annually to keep risk in check".to_string()],
    };
    recommendations.push("Max out tax-advantaged accounts before taxable investing".to_string());
    recommendations.push("Keep raising contributions as income grows".to_string());

    StageOutput {
        velocity,
        annual_wealth_gain: net_worth * velocity / 100.0,
        projection_rate: rate,
        annual_new_money: annual_contributions,
        recommendations,
        message: format!(
            "Your {} of net worth is compounding at about {:.1}% a year.",
            format_dollars(net_worth),
            velocity
        ),
        details: StageDetail::Acceleration {
            allocation_tier: tier,
            investment_ratio: round_to(investment_ratio, 4),
            blended_return: rate,
            expected_return: round_cents(expected_return),
            annual_contributions: round_cents(annual_contributions),
            velocity_capped: capped,
        },
    }
}

pub fn momentum(savings_rate: f64) -> &'static str {
    if savings_rate >= 0.40 {
        "explosive"
    } else if savings_rate >= 0.25 {
        "strong"
    } else if savings_rate >= 0.15 {
        "moderate"
    } else if savings_rate >= 0.05 {
        "weak"
    } else {
        "stagnant"
    }
}

fn trend(velocity: f64) -> &'static str {
    if velocity > 0.0 {
        "up"
    } else if velocity < 0.0 {
        "down"
    } else {
        "flat"
    }
}

pub fn percentile(velocity: f64) -> u32 {
    if velocity >= 15.0 {
        95
    } else if velocity >= 12.0 {
        90
    } else if velocity >= 8.0 {
        75
    } else if velocity >= 5.0 {
        60
    } else if velocity >= 3.0 {
        50
    } else if velocity >= 0.0 {
        40
    } else {
        25
    }
}

pub fn benchmark(velocity: f64) -> Benchmark {
    let (category, description, color) = if velocity >= 15.0 {
        ("Elite", "Top 5% of wealth builders", "#10B981")
    } else if velocity >= 12.0 {
        ("Excellent", "Top 10% of wealth builders", "#10B981")
    } else if velocity >= 8.0 {
        ("Strong", "Top 25% of wealth builders", "#00D4FF")
    } else if velocity >= 5.0 {
        ("Good", "Above median performance", "#F59E0B")
    } else if velocity >= 3.0 {
        ("Fair", "At/below median", "#F59E0B")
    } else {
        ("Needs Improvement", "Wealth stagnating", "#EF4444")
    };
    Benchmark {
        category,
        description,
        color,
    }
}

/// Future value of `net_worth` plus `annual` new money, compounded at `rate`.
fn future_value(net_worth: f64, rate: f64, annual: f64, years: i32) -> f64 {
    if rate == 0.0 {
        return net_worth + annual * f64::from(years);
    }
    let growth = (1.0 + rate).powi(years);
    net_worth * growth + annual * (growth - 1.0) / rate
}

fn project(net_worth: f64, rate: f64, annual: f64) -> WealthProjections {
    let [one, three, five, ten] =
        PROJECTION_YEARS.map(|years| round_cents(future_value(net_worth, rate, annual, years)));
    WealthProjections {
        one_year: one,
        three_years: three,
        five_years: five,
        ten_years: ten,
    }
}

//! Health scoring and rule-based insight generation over a household snapshot.
//!
//! Every check reads the same [`CoreMetrics`]; none depends on another, so
//! any combination of strengths, vulnerabilities and alerts may fire.

use std::collections::HashSet;

use serde::Serialize;

use super::assumptions::plan_policy;
use super::error::CoreResult;
use super::money::{format_dollars, format_percent, ratio};
use super::types::HouseholdSnapshot;
use super::validate::validate_snapshot;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoreMetrics {
    pub monthly_income: f64,
    pub side_income: f64,
    pub total_monthly_income: f64,
    pub monthly_expenses: f64,
    pub plan_contributions: f64,
    pub monthly_surplus: f64,
    pub annual_surplus: f64,
    pub savings: f64,
    pub investments: f64,
    pub plan_values: f64,
    pub total_assets: f64,
    pub debt: f64,
    pub net_worth: f64,
    pub savings_rate: f64,
    pub debt_to_income: f64,
    pub months_expenses_covered: f64,
    pub income_diversification: f64,
    pub plan_count: usize,
    pub distinct_plan_types: usize,
    pub has_retirement_account: bool,
    pub has_retirement_vehicle: bool,
}

impl CoreMetrics {
    pub fn from_snapshot(snapshot: &HouseholdSnapshot) -> Self {
        let total_monthly_income = snapshot.total_monthly_income();
        let plan_contributions = snapshot.monthly_plan_contributions();
        let plan_values = snapshot.plan_cash_values();
        let total_assets = snapshot.savings + snapshot.investments + plan_values;
        let monthly_surplus = total_monthly_income - snapshot.monthly_expenses - plan_contributions;

        let distinct_plan_types = snapshot
            .plans
            .iter()
            .map(|p| p.plan_type)
            .collect::<HashSet<_>>()
            .len();

        Self {
            monthly_income: snapshot.monthly_income,
            side_income: snapshot.side_income,
            total_monthly_income,
            monthly_expenses: snapshot.monthly_expenses,
            plan_contributions,
            monthly_surplus,
            annual_surplus: monthly_surplus * 12.0,
            savings: snapshot.savings,
            investments: snapshot.investments,
            plan_values,
            total_assets,
            debt: snapshot.debt,
            net_worth: total_assets - snapshot.debt,
            savings_rate: ratio(plan_contributions, total_monthly_income),
            debt_to_income: ratio(snapshot.debt, total_monthly_income * 12.0),
            months_expenses_covered: ratio(snapshot.savings, snapshot.monthly_expenses),
            income_diversification: ratio(snapshot.side_income, total_monthly_income),
            plan_count: snapshot.plans.len(),
            distinct_plan_types,
            has_retirement_account: snapshot
                .plans
                .iter()
                .any(|p| p.plan_type.is_retirement_account()),
            has_retirement_vehicle: snapshot
                .plans
                .iter()
                .any(|p| plan_policy(p.plan_type).retirement_vehicle),
        }
    }

    fn emergency_fund_target(&self) -> f64 {
        self.monthly_expenses * 6.0
    }

    /// A household with no expenses has nothing to cover and is never short.
    fn emergency_fund_below(&self, months: f64) -> bool {
        self.emergency_fund_target() > 0.0 && self.months_expenses_covered < months
    }

    fn months_to_cover(&self, amount: f64) -> Option<f64> {
        (self.monthly_surplus > 0.0).then(|| amount / self.monthly_surplus)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryScore {
    pub score: u32,
    pub max: u32,
    pub status: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthBreakdown {
    pub liquidity: CategoryScore,
    pub debt_management: CategoryScore,
    pub savings_rate: CategoryScore,
    pub diversification: CategoryScore,
    pub income_stability: CategoryScore,
}

impl HealthBreakdown {
    fn categories(&self) -> [&CategoryScore; 5] {
        [
            &self.liquidity,
            &self.debt_management,
            &self.savings_rate,
            &self.diversification,
            &self.income_stability,
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthScore {
    pub score: u32,
    pub rating: &'static str,
    pub breakdown: HealthBreakdown,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Strength {
    pub title: &'static str,
    pub description: String,
    pub icon: &'static str,
    pub category: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Vulnerability {
    pub title: &'static str,
    pub severity: Severity,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_to_fix: Option<f64>,
    pub icon: &'static str,
    pub category: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
    pub message: String,
    pub action: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImmediateAction {
    pub priority: u32,
    pub title: &'static str,
    pub description: String,
    pub action_steps: Vec<String>,
    pub timeline: String,
    pub impact: String,
    pub category: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tactic {
    pub title: &'static str,
    pub description: String,
    pub action_steps: Vec<String>,
    pub timeline: &'static str,
    pub potential_impact: String,
    pub category: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Strategy {
    pub title: &'static str,
    pub description: &'static str,
    pub action_steps: Vec<String>,
    pub timeline: String,
    pub category: &'static str,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct AgeBenchmark {
    pub median_net_worth: f64,
    pub median_income: f64,
    pub median_savings_rate: f64,
    pub top_10_savings_rate: f64,
}

static AGE_BENCHMARKS: [(&str, AgeBenchmark); 3] = [
    (
        "25-34",
        AgeBenchmark {
            median_net_worth: 14_000.0,
            median_income: 65_000.0,
            median_savings_rate: 0.05,
            top_10_savings_rate: 0.20,
        },
    ),
    (
        "35-44",
        AgeBenchmark {
            median_net_worth: 91_000.0,
            median_income: 80_000.0,
            median_savings_rate: 0.08,
            top_10_savings_rate: 0.25,
        },
    ),
    (
        "45-54",
        AgeBenchmark {
            median_net_worth: 168_000.0,
            median_income: 85_000.0,
            median_savings_rate: 0.12,
            top_10_savings_rate: 0.30,
        },
    ),
];

/// Age bracket label and its national medians.
pub fn age_benchmark(age: u32) -> (&'static str, &'static AgeBenchmark) {
    let index = if age < 35 {
        0
    } else if age < 45 {
        1
    } else {
        2
    };
    let (label, benchmark) = &AGE_BENCHMARKS[index];
    (*label, benchmark)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NetWorthBenchmark {
    pub user: f64,
    pub median: f64,
    pub percentile: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SavingsRateBenchmark {
    pub user: f64,
    pub median: f64,
    pub top_10: f64,
    pub percentile: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Benchmarks {
    pub age_group: &'static str,
    pub net_worth: NetWorthBenchmark,
    pub savings_rate: SavingsRateBenchmark,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub health_score: HealthScore,
    pub metrics: CoreMetrics,
    pub strengths: Vec<Strength>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub immediate_actions: Vec<ImmediateAction>,
    pub short_term_tactics: Vec<Tactic>,
    pub long_term_strategy: Vec<Strategy>,
    pub alerts: Vec<Alert>,
    pub benchmarks: Benchmarks,
}

pub fn analyze(snapshot: &HouseholdSnapshot) -> CoreResult<AnalysisResult> {
    validate_snapshot(snapshot)?;
    let metrics = CoreMetrics::from_snapshot(snapshot);
    let health_score = health_score(&metrics);
    tracing::debug!(
        score = health_score.score,
        rating = health_score.rating,
        "financial health scored"
    );

    Ok(AnalysisResult {
        strengths: strengths(&metrics, snapshot.age),
        vulnerabilities: vulnerabilities(&metrics, snapshot.age),
        immediate_actions: immediate_actions(&metrics, snapshot),
        short_term_tactics: short_term_tactics(&metrics),
        long_term_strategy: long_term_strategy(snapshot.age),
        alerts: alerts(&metrics),
        benchmarks: benchmarks(&metrics, snapshot.age),
        health_score,
        metrics,
    })
}

fn status(score: u32, bands: &[(u32, &'static str)], fallback: &'static str) -> &'static str {
    bands
        .iter()
        .find(|(min, _)| score >= *min)
        .map(|(_, label)| *label)
        .unwrap_or(fallback)
}

fn category(
    score: u32,
    max: u32,
    bands: &[(u32, &'static str)],
    fallback: &'static str,
) -> CategoryScore {
    CategoryScore {
        score,
        max,
        status: status(score, bands, fallback),
    }
}

pub fn health_score(metrics: &CoreMetrics) -> HealthScore {
    let months = metrics.months_expenses_covered;
    let liquidity = if months >= 6.0 {
        20
    } else if months >= 3.0 {
        15
    } else if months >= 1.0 {
        10
    } else {
        5
    };

    let dti = metrics.debt_to_income;
    let debt = if dti == 0.0 {
        25
    } else if dti < 0.10 {
        22
    } else if dti < 0.20 {
        18
    } else if dti <= 0.36 {
        15
    } else {
        8
    };

    let rate = metrics.savings_rate;
    let savings = if rate >= 0.40 {
        20
    } else if rate >= 0.30 {
        18
    } else if rate >= 0.20 {
        15
    } else if rate >= 0.10 {
        10
    } else {
        5
    };

    let mut diversification = 0;
    if metrics.investments > 0.0 {
        diversification += 8;
    }
    if metrics.has_retirement_account {
        diversification += 8;
    }
    if metrics.distinct_plan_types >= 2 {
        diversification += 4;
    }
    let diversification = diversification.min(20);

    let stability = if metrics.total_monthly_income <= 0.0 {
        0
    } else if metrics.income_diversification > 0.05 {
        15
    } else {
        10
    };

    let breakdown = HealthBreakdown {
        liquidity: category(
            liquidity,
            20,
            &[(18, "excellent"), (15, "good"), (10, "fair")],
            "poor",
        ),
        debt_management: category(
            debt,
            25,
            &[(22, "excellent"), (18, "good"), (12, "fair")],
            "poor",
        ),
        savings_rate: category(
            savings,
            20,
            &[(18, "elite"), (15, "excellent"), (10, "good")],
            "poor",
        ),
        diversification: category(diversification, 20, &[(15, "good"), (10, "fair")], "poor"),
        income_stability: category(stability, 15, &[(13, "excellent"), (10, "good")], "poor"),
    };
    let score = breakdown
        .categories()
        .iter()
        .map(|c| c.score)
        .sum::<u32>()
        .min(100);

    HealthScore {
        score,
        rating: rating(score),
        breakdown,
    }
}

pub fn rating(score: u32) -> &'static str {
    match score {
        80.. => "Excellent",
        65..=79 => "Good",
        50..=64 => "Fair",
        _ => "Needs Improvement",
    }
}

fn strengths(m: &CoreMetrics, age: u32) -> Vec<Strength> {
    let mut out = Vec::new();

    if m.savings_rate >= 0.40 {
        out.push(Strength {
            title: "Elite Savings Rate",
            description: format!(
                "Your {} savings rate puts you in the top 10% of earners nationally",
                format_percent(m.savings_rate)
            ),
            icon: "trending_up",
            category: "savings",
        });
    } else if m.savings_rate >= 0.20 {
        out.push(Strength {
            title: "Strong Savings Habit",
            description: format!(
                "Your {} savings rate exceeds the national average",
                format_percent(m.savings_rate)
            ),
            icon: "savings",
            category: "savings",
        });
    }

    if m.income_diversification > 0.05 {
        out.push(Strength {
            title: "Income Diversification",
            description: format!(
                "{} of income from side hustle provides financial resilience",
                format_percent(m.income_diversification)
            ),
            icon: "account_balance",
            category: "income",
        });
    }

    if m.debt == 0.0 {
        out.push(Strength {
            title: "Debt-Free",
            description: "No debt allows maximum flexibility for wealth building".to_string(),
            icon: "check_circle",
            category: "debt",
        });
    } else if m.debt_to_income < 0.10 {
        out.push(Strength {
            title: "Low Debt Burden",
            description: format!(
                "Debt-to-income ratio of {} is excellent",
                format_percent(m.debt_to_income)
            ),
            icon: "thumb_up",
            category: "debt",
        });
    }

    if m.months_expenses_covered >= 6.0 {
        out.push(Strength {
            title: "Fully Funded Emergency Fund",
            description: format!(
                "{:.1} months of expenses covered - excellent protection",
                m.months_expenses_covered
            ),
            icon: "security",
            category: "emergency_fund",
        });
    }

    let (_, benchmark) = age_benchmark(age);
    if m.net_worth > benchmark.median_net_worth * 2.0 {
        out.push(Strength {
            title: "Above-Average Net Worth",
            description: format!(
                "Net worth of {} exceeds median for your age group",
                format_dollars(m.net_worth)
            ),
            icon: "stars",
            category: "net_worth",
        });
    }

    out
}

fn vulnerabilities(m: &CoreMetrics, age: u32) -> Vec<Vulnerability> {
    let mut out = Vec::new();

    if m.emergency_fund_below(3.0) {
        let target = m.emergency_fund_target();
        let gap = (target - m.savings).max(0.0);
        out.push(Vulnerability {
            title: "Emergency Fund Critically Low",
            severity: if m.months_expenses_covered < 1.0 {
                Severity::High
            } else {
                Severity::Medium
            },
            description: format!(
                "Only {:.1} months coverage. Target: 6 months ({})",
                m.months_expenses_covered,
                format_dollars(target)
            ),
            gap: Some(gap),
            months_to_fix: m.months_to_cover(gap),
            icon: "warning",
            category: "emergency_fund",
        });
    }

    if m.debt_to_income > 0.36 {
        out.push(Vulnerability {
            title: "High Debt-to-Income Ratio",
            severity: if m.debt_to_income > 0.50 {
                Severity::High
            } else {
                Severity::Medium
            },
            description: format!(
                "{} ratio exceeds recommended 36% threshold",
                format_percent(m.debt_to_income)
            ),
            gap: None,
            months_to_fix: None,
            icon: "error",
            category: "debt",
        });
    }

    if m.savings_rate < 0.10 {
        out.push(Vulnerability {
            title: "Low Savings Rate",
            severity: Severity::Medium,
            description: format!(
                "{} savings rate limits wealth accumulation. Target: 20%+",
                format_percent(m.savings_rate)
            ),
            gap: None,
            months_to_fix: None,
            icon: "trending_down",
            category: "savings",
        });
    }

    if !m.has_retirement_vehicle && age < 50 {
        out.push(Vulnerability {
            title: "No Retirement Savings Plan",
            severity: Severity::Medium,
            description: "Starting retirement savings early maximizes compound growth".to_string(),
            gap: None,
            months_to_fix: None,
            icon: "schedule",
            category: "retirement",
        });
    }

    if m.side_income <= 0.0 {
        out.push(Vulnerability {
            title: "Single Point of Income Failure",
            severity: Severity::Low,
            description: "No side income - vulnerable if primary income lost".to_string(),
            gap: None,
            months_to_fix: None,
            icon: "info",
            category: "income",
        });
    }

    out
}

fn alerts(m: &CoreMetrics) -> Vec<Alert> {
    let mut out = Vec::new();
    if m.emergency_fund_below(2.0) {
        out.push(Alert {
            kind: "critical",
            title: "Emergency Fund Dangerously Low",
            message: "One unexpected expense could derail your financial plan".to_string(),
            action: "Priority: Build to 6 months expenses immediately",
        });
    }
    if m.debt_to_income > 0.50 {
        out.push(Alert {
            kind: "critical",
            title: "Debt Burden Excessive",
            message: format!(
                "{} debt-to-income is unsustainable",
                format_percent(m.debt_to_income)
            ),
            action: "Consider debt consolidation or credit counseling",
        });
    }
    out
}

fn immediate_actions(m: &CoreMetrics, snapshot: &HouseholdSnapshot) -> Vec<ImmediateAction> {
    let mut out = Vec::new();
    let mut priority = 1;

    if m.emergency_fund_below(6.0) {
        let target = m.emergency_fund_target();
        let months = m.months_to_cover((target - m.savings).max(0.0));
        out.push(ImmediateAction {
            priority,
            title: "Build Emergency Fund",
            description: format!(
                "Increase from {} to {}",
                format_dollars(m.savings),
                format_dollars(target)
            ),
            action_steps: vec![
                format!(
                    "Redirect {}/month to high-yield savings",
                    format_dollars(m.monthly_surplus)
                ),
                match months {
                    Some(months) => format!("Target: Fully funded in {months:.0} months"),
                    None => "Review budget to increase surplus".to_string(),
                },
                "Keep in FDIC-insured account with 4.5%+ APY".to_string(),
            ],
            timeline: timeline(months),
            impact: "Protects against job loss, medical emergencies, car repairs".to_string(),
            category: "emergency_fund",
        });
        priority += 1;
    }

    if m.debt > 0.0 {
        let months = m.months_to_cover(m.debt);
        let has_interest = snapshot.debt_interest_rate.is_some_and(|rate| rate > 0.0);
        out.push(ImmediateAction {
            priority,
            title: "Eliminate Debt",
            description: format!("Pay off {} balance", format_dollars(m.debt)),
            action_steps: vec![
                if has_interest {
                    "Use debt avalanche method (highest interest first)".to_string()
                } else {
                    "Pay strategically".to_string()
                },
                format!(
                    "Allocate {}/month",
                    format_dollars(m.monthly_surplus.min(m.debt).max(0.0))
                ),
                match months {
                    Some(months) => format!("Debt-free in {months:.1} months"),
                    None => "Review payment strategy".to_string(),
                },
            ],
            timeline: timeline(months),
            impact: format!(
                "Frees {}/month for investing",
                format_dollars(m.monthly_surplus.max(0.0))
            ),
            category: "debt",
        });
    }

    out
}

fn timeline(months: Option<f64>) -> String {
    match months {
        Some(months) => format!("{months:.0} months"),
        None => "Ongoing".to_string(),
    }
}

fn short_term_tactics(m: &CoreMetrics) -> Vec<Tactic> {
    let mut out = vec![Tactic {
        title: "Expense Audit & Optimization",
        description: "Review monthly spending to identify $200-500 in savings opportunities"
            .to_string(),
        action_steps: [
            "Track all expenses for 30 days",
            "Identify recurring subscriptions to cancel",
            "Negotiate bills (insurance, phone, internet)",
            "Redirect savings to investments",
        ]
        .map(String::from)
        .to_vec(),
        timeline: "1-3 months",
        potential_impact: format!(
            "{}/month savings potential",
            format_dollars(m.monthly_expenses * 0.1)
        ),
        category: "expenses",
    }];

    if m.side_income > 0.0 {
        let increase = m.side_income * 0.5;
        out.push(Tactic {
            title: "Scale Side Income",
            description: format!(
                "Grow side income from {} to {}/month",
                format_dollars(m.side_income),
                format_dollars(m.side_income + increase)
            ),
            action_steps: [
                "Dedicate 5-10 hours/week to side hustle",
                "Raise rates or increase client base",
                "Automate/systematize operations",
            ]
            .map(String::from)
            .to_vec(),
            timeline: "6-12 months",
            potential_impact: format!("{}/month additional income", format_dollars(increase)),
            category: "income",
        });
    }

    out
}

fn long_term_strategy(age: u32) -> Vec<Strategy> {
    vec![
        Strategy {
            title: "Maximize Tax-Advantaged Retirement Accounts",
            description: "Prioritize Roth IRA and 401(k) contributions for long-term growth",
            action_steps: [
                "Open Roth IRA if not already (contribute $7,000/year)",
                "Increase 401(k) to capture full employer match",
                "Target 15% of gross income to retirement savings",
            ]
            .map(String::from)
            .to_vec(),
            timeline: format!("{} years to retirement", 65_u32.saturating_sub(age)),
            category: "retirement",
        },
        Strategy {
            title: "Build Diversified Investment Portfolio",
            description: "Balance growth, stability, and liquidity across asset classes",
            action_steps: [
                "Target allocation: 60% stocks / 30% bonds / 10% alternatives",
                "Use low-cost index funds (0.05% expense ratio)",
                "Rebalance quarterly",
            ]
            .map(String::from)
            .to_vec(),
            timeline: "Ongoing".to_string(),
            category: "investments",
        },
    ]
}

/// Rough percentile from how far `user` sits from the bracket median.
pub fn estimate_percentile(user: f64, median: f64) -> u32 {
    if median == 0.0 {
        return 50;
    }
    let relative = user / median;
    if relative >= 2.0 {
        90
    } else if relative >= 1.5 {
        75
    } else if relative >= 1.0 {
        60
    } else if relative >= 0.75 {
        50
    } else if relative >= 0.5 {
        40
    } else {
        25
    }
}

fn benchmarks(m: &CoreMetrics, age: u32) -> Benchmarks {
    let (age_group, benchmark) = age_benchmark(age);
    Benchmarks {
        age_group,
        net_worth: NetWorthBenchmark {
            user: m.net_worth,
            median: benchmark.median_net_worth,
            percentile: estimate_percentile(m.net_worth, benchmark.median_net_worth),
        },
        savings_rate: SavingsRateBenchmark {
            user: m.savings_rate,
            median: benchmark.median_savings_rate,
            top_10: benchmark.top_10_savings_rate,
            percentile: estimate_percentile(m.savings_rate, benchmark.median_savings_rate),
        },
    }
}

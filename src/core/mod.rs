mod assumptions;
mod calculator;
mod engine;
mod error;
mod insight;
mod market;
mod money;
mod types;
mod validate;
mod velocity;

pub use assumptions::{
    PlanPolicy, ScenarioRates, VehicleAssumption, plan_policy, plan_return, scenario_rates,
    vehicle_assumption,
};
pub use calculator::{
    CalculatorConfig, ScenarioOutcome, VehicleParams, VehicleProjection, VehicleSummary,
    assumption_table, compare_vehicles, project_vehicle, project_vehicle_named,
};
pub use engine::{ProjectionConfig, run_all_scenarios, run_projection};
pub use error::{CoreError, CoreResult};
pub use insight::{AnalysisResult, CoreMetrics, HealthScore, analyze, health_score};
pub use market::{
    CachedMarketData, DEFAULT_FRESHNESS, Freshness, IndexQuote, MarketDataError,
    MarketDataSource, Observed, PricePoint, quote_from_series,
};
pub use money::{format_dollars, format_percent, round_cents};
pub use types::{
    HouseholdSnapshot, PlanInput, PlanType, PlanValue, Projection, ProjectionSummary,
    ProjectionYearRecord, Scenario, ScenarioSet,
};
pub use validate::{
    validate_calculator_config, validate_plan, validate_snapshot, validate_vehicle_params,
};
pub use velocity::{
    Stage, StageDetail, VelocityInputs, VelocityReport, calculate_wealth_velocity, classify,
    velocity_report,
};

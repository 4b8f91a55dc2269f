//! Signal rules and the per-observation buy/sell evaluator

use crate::models::simulation::Observation;
use crate::models::strategy::{Condition, Strategy};

/// Indicator name handled by [`MomentumRule`]
pub const MOMENTUM: &str = "momentum";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// Which sides fired for one observation. Both may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub buy: bool,
    pub sell: bool,
}

/// A threshold rule selected by a condition's `indicator` name
pub trait SignalRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn fires(&self, side: Side, observation: &Observation, threshold: f64) -> bool;
}

/// Buys when the close is above the threshold, sells when it is below
pub struct MomentumRule;

impl SignalRule for MomentumRule {
    fn name(&self) -> &'static str {
        MOMENTUM
    }

    fn fires(&self, side: Side, observation: &Observation, threshold: f64) -> bool {
        match side {
            Side::Buy => observation.close > threshold,
            Side::Sell => observation.close < threshold,
        }
    }
}

static MOMENTUM_RULE: MomentumRule = MomentumRule;

/// Look up the rule for an indicator name; unknown names have no rule and
/// never fire.
pub fn rule_for(indicator: &str) -> Option<&'static dyn SignalRule> {
    match indicator {
        MOMENTUM => Some(&MOMENTUM_RULE),
        _ => None,
    }
}

fn condition_fires(condition: &Condition, side: Side, observation: &Observation) -> bool {
    rule_for(&condition.indicator)
        .is_some_and(|rule| rule.fires(side, observation, condition.threshold))
}

/// Evaluate both sides of the strategy independently
pub fn evaluate(observation: &Observation, strategy: &Strategy) -> Signals {
    Signals {
        buy: condition_fires(&strategy.buy_condition, Side::Buy, observation),
        sell: condition_fires(&strategy.sell_condition, Side::Sell, observation),
    }
}

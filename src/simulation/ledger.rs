//! Cash ledger and performance metrics accumulated over a simulation

use crate::models::simulation::{Observation, SimulationResult};
use crate::simulation::rules::Signals;

pub const INITIAL_BALANCE: f64 = 10_000.0;

/// Running state of one simulation.
///
/// `highest_balance` never drops below [`INITIAL_BALANCE`], which keeps the
/// drawdown division well defined.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    balance: f64,
    highest_balance: f64,
    total_trades: u64,
    win_trades: u64,
    max_drawdown: f64,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            balance: INITIAL_BALANCE,
            highest_balance: INITIAL_BALANCE,
            total_trades: 0,
            win_trades: 0,
            max_drawdown: 0.0,
        }
    }

    /// Book the fired signals of one observation, buy before sell
    pub fn apply(&mut self, observation: &Observation, signals: Signals) {
        if signals.buy {
            self.total_trades += 1;
            self.balance -= observation.notional();
        }

        // Every sell is counted as a win; buys and sells are not paired.
        if signals.sell {
            self.total_trades += 1;
            self.balance += observation.notional();
            self.win_trades += 1;
        }

        if self.balance > self.highest_balance {
            self.highest_balance = self.balance;
        }
        let drawdown = (self.highest_balance - self.balance) / self.highest_balance * 100.0;
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn highest_balance(&self) -> f64 {
        self.highest_balance
    }

    pub fn total_trades(&self) -> u64 {
        self.total_trades
    }

    pub fn win_trades(&self) -> u64 {
        self.win_trades
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn profit_loss(&self) -> f64 {
        self.balance - INITIAL_BALANCE
    }

    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        self.win_trades as f64 / self.total_trades as f64 * 100.0
    }

    pub fn finish(self, strategy_id: i64) -> SimulationResult {
        SimulationResult {
            strategy_id,
            total_trades: self.total_trades,
            profit_loss: round2(self.profit_loss()),
            win_rate: round2(self.win_rate()),
            max_drawdown: round2(self.max_drawdown),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Round to two decimals, folding `-0.0` into `0.0`
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

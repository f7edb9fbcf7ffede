use common::RiskLimits;
use common::models::{TradeAction, TradeDecision};
use strategy::{SignalError, SignalGenerator};
use thiserror::Error;
use tracing::{info, warn};

use crate::ledger::{EXECUTION_WINDOW, TradeHistory};
use crate::services::execution_service::{ExecutionError, ExecutionGateway, ExecutionReport};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Signal(#[from] SignalError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("No trade signal at position {index}; only the last {window} signals can be executed")]
    NotSelectable { index: usize, window: usize },
    #[error("Auto-execution is disabled")]
    AutoExecuteDisabled,
}

/// Gate applied to decisions generated by `run_auto`. Manual by default.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AutoExecutePolicy {
    pub enabled: bool,
    pub limits: RiskLimits,
}

impl AutoExecutePolicy {
    pub fn new(enabled: bool, limits: RiskLimits) -> Self {
        Self { enabled, limits }
    }

    pub fn within_limits(&self, decision: &TradeDecision) -> bool {
        decision.confidence >= self.limits.min_confidence
            && decision.risk_score <= self.limits.max_risk_score
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutoOutcome {
    Executed { symbol: String, message: String },
    Held { symbol: String },
    Skipped { symbol: String, reason: String },
    Failed { symbol: String, error: String },
}

/// Per-symbol results of one auto-execution pass, in watchlist order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoRunReport {
    pub outcomes: Vec<AutoOutcome>,
}

impl AutoRunReport {
    pub fn executed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, AutoOutcome::Executed { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &AutoOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, AutoOutcome::Failed { .. }))
    }
}

/// One user session: generated signals, their execution and the history.
pub struct TradingSession {
    signals: SignalGenerator,
    gateway: ExecutionGateway,
    policy: AutoExecutePolicy,
    history: TradeHistory,
    executed_trades: usize,
}

impl TradingSession {
    pub fn new(signals: SignalGenerator, gateway: ExecutionGateway, policy: AutoExecutePolicy) -> Self {
        Self {
            signals,
            gateway,
            policy,
            history: TradeHistory::new(),
            executed_trades: 0,
        }
    }

    pub fn history(&self) -> &TradeHistory {
        &self.history
    }

    pub fn policy(&self) -> &AutoExecutePolicy {
        &self.policy
    }

    pub fn executed_trades(&self) -> usize {
        self.executed_trades
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Generates a decision and records it. Failures record nothing.
    pub async fn generate_signal(&mut self, symbol: &str) -> Result<TradeDecision, SessionError> {
        let decision = self.signals.generate(symbol).await?;
        self.history.append(decision.clone());
        Ok(decision)
    }

    /// Executes the decision at `index` of the selectable window, oldest first.
    pub async fn execute_selected(&mut self, index: usize) -> Result<ExecutionReport, SessionError> {
        let mut decision = self
            .history
            .select(index)
            .cloned()
            .ok_or(SessionError::NotSelectable {
                index,
                window: EXECUTION_WINDOW,
            })?;
        self.execute(&mut decision).await
    }

    async fn execute(&mut self, decision: &mut TradeDecision) -> Result<ExecutionReport, SessionError> {
        let report = self.gateway.execute(decision, &mut self.history).await?;
        if report.executed {
            self.executed_trades += 1;
        }
        Ok(report)
    }

    /// Generates and, within the risk limits, executes a decision for each
    /// symbol in turn. A failing symbol does not stop the run.
    pub async fn run_auto(&mut self, symbols: &[String]) -> Result<AutoRunReport, SessionError> {
        if !self.policy.enabled {
            return Err(SessionError::AutoExecuteDisabled);
        }

        let mut report = AutoRunReport::default();
        for symbol in symbols {
            let outcome = self.auto_step(symbol).await;
            match &outcome {
                AutoOutcome::Failed { error, .. } => warn!("Auto-execution for {} failed: {}", symbol, error),
                AutoOutcome::Skipped { reason, .. } => info!("Auto-execution for {} skipped: {}", symbol, reason),
                _ => {}
            }
            report.outcomes.push(outcome);
        }
        info!(
            "Auto-execution pass done: {} of {} symbols executed",
            report.executed(),
            symbols.len()
        );
        Ok(report)
    }

    async fn auto_step(&mut self, symbol: &str) -> AutoOutcome {
        let mut decision = match self.generate_signal(symbol).await {
            Ok(decision) => decision,
            Err(e) => {
                return AutoOutcome::Failed {
                    symbol: symbol.to_string(),
                    error: e.to_string(),
                };
            }
        };

        if decision.action == TradeAction::Hold {
            return AutoOutcome::Held {
                symbol: symbol.to_string(),
            };
        }

        let limits = self.policy.limits;
        if !self.policy.within_limits(&decision) {
            return AutoOutcome::Skipped {
                symbol: symbol.to_string(),
                reason: format!(
                    "confidence {} (min {}), risk {} (max {})",
                    decision.confidence,
                    limits.min_confidence,
                    decision.risk_score,
                    limits.max_risk_score
                ),
            };
        }
        if self.executed_trades >= limits.max_daily_trades {
            return AutoOutcome::Skipped {
                symbol: symbol.to_string(),
                reason: format!("daily trade limit of {} reached", limits.max_daily_trades),
            };
        }

        match self.execute(&mut decision).await {
            Ok(report) => AutoOutcome::Executed {
                symbol: symbol.to_string(),
                message: report.message,
            },
            Err(e) => AutoOutcome::Failed {
                symbol: symbol.to_string(),
                error: e.to_string(),
            },
        }
    }
}

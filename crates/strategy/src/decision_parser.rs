use chrono::{DateTime, Utc};
use common::models::{OrderType, TradeAction, TradeDecision};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::SignalError;

const THINK_END: &str = "</think>";

/// Locates the decision object in a free-form reply.
///
/// Anything up to the last `</think>` is reasoning and is dropped. The
/// object is the text between the first `{` and the last `}` of what is left.
pub fn extract_json(reply: &str) -> Result<&str, SignalError> {
    let body = match reply.rfind(THINK_END) {
        Some(pos) => &reply[pos + THINK_END.len()..],
        None => reply,
    };

    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(&body[start..=end]),
        _ => Err(SignalError::NoJsonFound),
    }
}

/// Parses and validates a reply into a decision for `symbol`.
pub fn parse_decision(
    reply: &str,
    symbol: &str,
    now: DateTime<Utc>,
) -> Result<TradeDecision, SignalError> {
    let raw = extract_json(reply)?;
    let value: Value =
        serde_json::from_str(raw).map_err(|e| SignalError::InvalidJson(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(SignalError::InvalidJson("expected a JSON object".to_string()));
    };

    let stock = text(&obj, "stock")?;
    if !stock.trim().eq_ignore_ascii_case(symbol) {
        return Err(SignalError::StockMismatch {
            expected: symbol.to_string(),
            got: stock.to_string(),
        });
    }

    let action: TradeAction = text(&obj, "action")?
        .parse()
        .map_err(|reason| SignalError::InvalidField {
            field: "action",
            reason,
        })?;

    let order_type = match optional(&obj, "order_type") {
        None => OrderType::default(),
        Some(Value::String(s)) => s.parse().map_err(|reason| SignalError::InvalidField {
            field: "order_type",
            reason,
        })?,
        Some(other) => return Err(wrong_type("order_type", "a string", other)),
    };

    let reasoning = match optional(&obj, "reasoning") {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    // HOLD replies often leave the price levels out.
    let price = |field: &'static str| -> Result<f64, SignalError> {
        if action == TradeAction::Hold && optional(&obj, field).is_none() {
            return Ok(0.0);
        }
        let value = number(&obj, field)?;
        if !value.is_finite() || value < 0.0 {
            return Err(SignalError::InvalidField {
                field,
                reason: format!("expected a non-negative price, got {}", value),
            });
        }
        Ok(value)
    };

    let entry_price = price("entry_price")?;
    if action != TradeAction::Hold && entry_price <= 0.0 {
        return Err(SignalError::InvalidField {
            field: "entry_price",
            reason: format!("must be positive for {}", action),
        });
    }
    let stop_loss = price("stop_loss")?;
    let take_profit = price("take_profit")?;

    Ok(TradeDecision {
        id: Uuid::new_v4(),
        stock: symbol.to_string(),
        action,
        reasoning,
        entry_price,
        stop_loss,
        take_profit,
        order_type,
        risk_score: score(&obj, "risk_score")?,
        confidence: score(&obj, "confidence")?,
        timestamp: now,
        executed: false,
        execution_time: None,
        execution_status: None,
    })
}

fn optional<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

fn required<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, SignalError> {
    optional(obj, field).ok_or(SignalError::MissingField(field))
}

fn wrong_type(field: &'static str, expected: &str, got: &Value) -> SignalError {
    SignalError::InvalidField {
        field,
        reason: format!("expected {}, got {}", expected, got),
    }
}

fn text<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, SignalError> {
    match required(obj, field)? {
        Value::String(s) => Ok(s),
        other => Err(wrong_type(field, "a string", other)),
    }
}

/// Numbers may arrive as JSON numbers or numeric strings.
fn number(obj: &Map<String, Value>, field: &'static str) -> Result<f64, SignalError> {
    match required(obj, field)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| wrong_type(field, "a number", &Value::Number(n.clone()))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| wrong_type(field, "a number", &Value::String(s.clone()))),
        other => Err(wrong_type(field, "a number", other)),
    }
}

fn score(obj: &Map<String, Value>, field: &'static str) -> Result<u8, SignalError> {
    let value = number(obj, field)?;
    if value.fract() != 0.0 || !(1.0..=10.0).contains(&value) {
        return Err(SignalError::InvalidField {
            field,
            reason: format!("expected an integer from 1 to 10, got {}", value),
        });
    }
    Ok(value as u8)
}

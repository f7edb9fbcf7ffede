use crate::features::PriceSnapshot;

fn format_average(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

/// Renders the analysis request for one symbol.
pub fn render_prompt(snapshot: &PriceSnapshot) -> String {
    let recent = serde_json::to_string(&snapshot.recent).unwrap_or_else(|_| "[]".to_string());
    let symbol = &snapshot.symbol;

    format!(
        r#"Analyze the following stock: {symbol}
Current price: {last}
Daily change: {change:.2}%
20-day SMA: {sma_20}
50-day SMA: {sma_50}

Recent price data:
{recent}

Based on the above data, provide a trading decision in the following JSON format:
{{
    "stock": "{symbol}",
    "action": "BUY or SELL or HOLD",
    "reasoning": "Brief explanation for your decision",
    "entry_price": float,
    "stop_loss": float,
    "take_profit": float,
    "order_type": "INTRADAY or DELIVERY",
    "risk_score": integer (1-10, with 10 being highest risk),
    "confidence": integer (1-10, with 10 being highest confidence)
}}

Ensure your response contains only valid JSON.
Respond strictly with JSON format and no additional text."#,
        last = snapshot.last_price,
        change = snapshot.change_pct,
        sma_20 = format_average(snapshot.sma_20),
        sma_50 = format_average(snapshot.sma_50),
    )
}

//! Blended model pricing
//!
//! Prices are USD per 1K tokens, blended across input and output. Lookup is by
//! longest matching prefix: `claude-opus-4-5-20251101` must price as
//! `claude-opus-4-5`, not as the older and pricier `claude-opus-4`.

use crate::types::Tool;

/// Price for models that match nothing in the table
pub const DEFAULT_PRICE_PER_1K: f64 = 0.003;

const MODEL_PRICES: &[(&str, f64)] = &[
    // Anthropic
    ("claude-opus-4", 0.045),
    ("claude-opus-4-1", 0.045),
    ("claude-opus-4-5", 0.015),
    ("claude-sonnet-4", 0.009),
    ("claude-sonnet-4-5", 0.009),
    ("claude-haiku-4-5", 0.003),
    ("claude-3-5-haiku", 0.0024),
    ("claude-3-5-sonnet", 0.009),
    ("claude-3-7-sonnet", 0.009),
    ("claude-4.5-sonnet", 0.009),
    ("claude-4.5-opus", 0.015),
    // OpenAI
    ("gpt-4o", 0.00625),
    ("gpt-4o-mini", 0.000375),
    ("gpt-4.1", 0.005),
    ("gpt-4.1-mini", 0.001),
    ("gpt-5", 0.005625),
    ("gpt-5-mini", 0.001125),
    ("gpt-5-nano", 0.000225),
    ("o3", 0.005),
    ("o4-mini", 0.00275),
    // Google
    ("gemini-2.5-pro", 0.005625),
    ("gemini-2.5-flash", 0.0014),
    ("gemini-2.5-flash-lite", 0.00025),
    ("gemini-3-pro", 0.007),
    // Others
    ("composer-1", 0.005625),
    ("grok-code-fast", 0.0008),
];

const TOOL_MULTIPLIERS: &[(Tool, f64)] = &[
    (Tool::Cursor, 1.0),
    (Tool::Claude, 1.0),
    (Tool::Gemini, 1.0),
    (Tool::Copilot, 1.0),
    (Tool::Windsurf, 1.0),
    (Tool::Generic, 1.0),
];

/// Price per 1K tokens for a model id.
pub fn price_per_1k(model: Option<&str>) -> f64 {
    let Some(model) = model.map(|m| m.trim().to_ascii_lowercase()) else {
        return DEFAULT_PRICE_PER_1K;
    };

    MODEL_PRICES
        .iter()
        .filter(|(prefix, _)| model.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, price)| *price)
        .unwrap_or(DEFAULT_PRICE_PER_1K)
}

pub fn tool_multiplier(tool: Tool) -> f64 {
    TOOL_MULTIPLIERS
        .iter()
        .find(|(t, _)| *t == tool)
        .map(|(_, m)| *m)
        .unwrap_or(1.0)
}

/// Estimated USD cost of `total_tokens` on `model` through `tool`.
pub fn estimate_cost(total_tokens: u64, model: Option<&str>, tool: Tool) -> f64 {
    total_tokens as f64 / 1000.0 * price_per_1k(model) * tool_multiplier(tool)
}

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolRule {
    pub size_step: f64,
    pub min_size: f64,
    pub size_decimals: usize,
    pub price_decimals: usize,
}

const FALLBACK_RULE: SymbolRule = SymbolRule {
    size_step: 1.0,
    min_size: 1.0,
    size_decimals: 0,
    price_decimals: 4,
};

const SYMBOL_RULES: &[(&str, SymbolRule)] = &[
    ("cmt_btcusdt", rule(0.001, 0.001, 3, 1)),
    ("cmt_ethusdt", rule(0.01, 0.01, 2, 2)),
    ("cmt_solusdt", rule(0.1, 0.1, 1, 3)),
    ("cmt_bnbusdt", rule(0.01, 0.01, 2, 2)),
    ("cmt_ltcusdt", rule(0.1, 0.1, 1, 2)),
    ("cmt_xrpusdt", rule(10.0, 10.0, 0, 4)),
    ("cmt_adausdt", rule(10.0, 10.0, 0, 4)),
    ("cmt_dogeusdt", rule(100.0, 100.0, 0, 5)),
];

const fn rule(size_step: f64, min_size: f64, size_decimals: usize, price_decimals: usize) -> SymbolRule {
    SymbolRule {
        size_step,
        min_size,
        size_decimals,
        price_decimals,
    }
}

// Absorbs representation error so 0.006 / 0.001 floors to 6, not 5.
const STEP_EPSILON: f64 = 1e-9;

/// Maps `BTC_USDT`, `BTC/USDT`, `btcusdt` or `cmt_btcusdt` to `cmt_btcusdt`.
pub fn to_exchange_symbol(ticker: &str) -> String {
    let lower = ticker.trim().to_lowercase();
    let stripped = lower.strip_prefix("cmt_").unwrap_or(lower.as_str());
    let compact: String = stripped
        .chars()
        .filter(|c| !matches!(c, '_' | '/' | '-'))
        .collect();
    let base = compact.strip_suffix("usdt").unwrap_or(compact.as_str());
    format!("cmt_{}usdt", base)
}

pub fn symbol_rule(symbol: &str) -> SymbolRule {
    let symbol = to_exchange_symbol(symbol);
    SYMBOL_RULES
        .iter()
        .find(|(name, _)| *name == symbol)
        .map(|(_, rule)| *rule)
        .unwrap_or(FALLBACK_RULE)
}

pub fn adjust_size(symbol: &str, raw_size: f64) -> String {
    let rule = symbol_rule(symbol);
    let raw = if raw_size.is_finite() { raw_size } else { 0.0 };
    let stepped = (raw / rule.size_step + STEP_EPSILON).floor() * rule.size_step;
    let size = stepped.max(rule.min_size);
    format!("{:.*}", rule.size_decimals, size)
}

/// Non-numeric input is returned unchanged.
pub fn format_price<T: Display>(symbol: &str, raw_price: T) -> String {
    let raw = raw_price.to_string();
    match parse_finite(&raw) {
        Some(price) => format!("{:.*}", symbol_rule(symbol).price_decimals, price),
        None => raw,
    }
}

/// Anything that is not a finite positive price becomes
/// `fallback_price * (1 + fallback_offset_pct)`.
pub fn sanitize_price<T: Display>(
    symbol: &str,
    value: T,
    fallback_price: f64,
    fallback_offset_pct: f64,
) -> String {
    let decimals = symbol_rule(symbol).price_decimals;
    match parse_finite(&value.to_string()).filter(|v| *v > 0.0) {
        Some(price) => format!("{:.*}", decimals, price),
        None => format!("{:.*}", decimals, fallback_price * (1.0 + fallback_offset_pct)),
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

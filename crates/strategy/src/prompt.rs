use crate::classifier::MarketContext;

pub const SYSTEM_PROMPT: &str = "You are a senior hedge fund risk manager. Reply ONLY in JSON.";

const BLACK_SWAN_CONTEXT: &str =
    "CRITICAL: SIMULATE A GLOBAL BLACK SWAN EVENT. MARKET IS CRASHING.";

pub fn is_crash_drill(symbol: &str) -> bool {
    symbol.to_uppercase().contains("CRASH")
}

pub fn user_prompt(context: &MarketContext) -> String {
    let special = if is_crash_drill(&context.symbol) {
        BLACK_SWAN_CONTEXT
    } else {
        "None"
    };

    format!(
        "CONTEXT: {special}\n\
         ASSET: {symbol}\n\
         ACTION: {action}\n\
         DATA: Trend={trend}, Volatility={volatility}, ADX={strength}\n\
         \n\
         RULES:\n\
         1. If BLACK SWAN: BLOCK 'BUY'. APPROVE 'SELL'. Profile = \"BlackSwan\".\n\
         2. If ADX > 60: Profile = \"Parabolic\".\n\
         3. If Squeeze or ADX > 40: Profile = \"Scalping\".\n\
         4. Else: Profile = \"Standard\".\n\
         \n\
         OUTPUT JSON: {{ \"decision\": \"APPROVED\"/\"BLOCKED\", \"profile\": \"Standard\"/\"Scalping\"/\"Parabolic\"/\"BlackSwan\", \"reason\": \"...\" }}",
        special = special,
        symbol = context.symbol,
        action = context.action.as_str().to_uppercase(),
        trend = context.trend,
        volatility = context.volatility,
        strength = context.strength,
    )
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Comparison a data-source reference performs against its target.
///
/// Anything other than the six canonical symbols is kept verbatim in
/// `Other`, so the operator is written back exactly as it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Neq,
    Other(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Other(s) => s,
        }
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        match s.as_str() {
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            "==" => Operator::Eq,
            "!=" => Operator::Neq,
            _ => Operator::Other(s),
        }
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        Operator::from(s.to_string())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy's pointer to one oracle feed plus the comparison it performs.
///
/// Every field is optional on the wire. An `id` that is missing or not a
/// JSON integer (including numeric strings like `"12245"`) becomes `0`,
/// which no registry entry uses, so lookups stay exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceRef {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(default, deserialize_with = "non_empty_operator", skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
}

impl DataSourceRef {
    pub fn new(id: i64, current_value: f64, target_value: f64, operator: Operator) -> Self {
        Self {
            id,
            current_value: Some(current_value),
            target_value: Some(target_value),
            operator: Some(operator),
        }
    }

    /// Only an id; values and operator left for the validator to fill.
    pub fn bare(id: i64) -> Self {
        Self {
            id,
            current_value: None,
            target_value: None,
            operator: None,
        }
    }
}

/// Which side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenSide {
    Yes,
    No,
}

impl std::fmt::Display for TokenSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSide::Yes => write!(f, "yes"),
            TokenSide::No => write!(f, "no"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwapPoint {
    pub twap: f64,
    pub timestamp: i64,
}

/// Pool state for one side of a strategy. TWAP is computed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_reserve: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default)]
    pub history: Vec<PricePoint>,
    #[serde(default)]
    pub twap: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twap_history: Option<Vec<TwapPoint>>,
}

/// A market proposal: a yes/no question resolved against external data.
///
/// Fields the dashboard does not model are kept in `extra` and written back
/// out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStrategy {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub evaluation_logic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mathematical_logic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_data_sources: Option<Vec<DataSourceRef>>,
    #[serde(default)]
    pub resolution_deadline: i64,
    #[serde(default)]
    pub yes_token: TokenInfo,
    #[serde(default)]
    pub no_token: TokenInfo,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub winner: Option<TokenSide>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MarketStrategy {
    /// An unresolved strategy with no data sources and no logic.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            evaluation_logic: String::new(),
            mathematical_logic: None,
            used_data_sources: None,
            resolution_deadline: 0,
            yes_token: TokenInfo::default(),
            no_token: TokenInfo::default(),
            timestamp: 0,
            resolved: false,
            winner: None,
            extra: Map::new(),
        }
    }
}

/// Snapshot of the current trading round (`/api/market`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketState {
    #[serde(default)]
    pub strategies: Vec<MarketStrategy>,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub round_number: u64,
    #[serde(default)]
    pub round_start_time: i64,
    #[serde(default)]
    pub round_end_time: i64,
    /// Milliseconds.
    #[serde(default)]
    pub round_duration: i64,
    #[serde(default)]
    pub rounds_until_resolution: i64,
    #[serde(default)]
    pub last_round_end_time: Option<i64>,
    #[serde(default)]
    pub is_executing_trades: bool,
    #[serde(default, rename = "isMakingBatchLLMCall")]
    pub is_making_batch_llm_call: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPersonality {
    pub name: String,
    pub risk_tolerance: RiskTolerance,
    /// 0.0 to 1.0.
    pub aggressiveness: f64,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub traits: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTokenHoldings {
    pub strategy_id: String,
    pub token_type: TokenSide,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentWallet {
    pub address: String,
    pub derivation_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTrade {
    #[serde(rename = "type")]
    pub action: TradeAction,
    pub strategy_id: String,
    pub token_type: TokenSide,
    pub price: f64,
    pub quantity: f64,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// An AI trading agent as reported by `/api/agents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub personality: AgentPersonality,
    #[serde(rename = "vUSD", default)]
    pub v_usd: f64,
    #[serde(default)]
    pub token_holdings: Vec<AgentTokenHoldings>,
    pub wallet: AgentWallet,
    #[serde(default)]
    pub trades: Vec<AgentTrade>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogSource {
    System,
    Market,
    Trading,
    Agents,
    #[serde(rename = "LLM")]
    Llm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Debug => write!(f, "debug"),
        }
    }
}

/// One line of the backend's system log (`/api/logs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub source: LogSource,
    pub level: LogLevel,
    pub message: String,
}

// ─── Lenient field decoding ───────────────────────────────────────────────────

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite()))
}

fn non_empty_operator<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Operator>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.filter(|s| !s.is_empty()).map(Operator::from))
}

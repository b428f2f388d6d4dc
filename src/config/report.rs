use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Prefixed to every amount in settlement lines, e.g. "₹".
    pub currency_symbol: String,
}

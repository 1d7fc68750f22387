//! Purchase / Order Intents and Spending Mandates

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle phase reported by the commerce provider
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentPhase {
    /// A verification step must succeed before the intent can be charged
    #[default]
    RequiresVerification,

    /// Ready to be charged
    #[serde(alias = "active")]
    Ready,

    /// Any phase this crate does not know; treated as not gating
    #[serde(other)]
    Unknown,
}

/// Provider-owned record of a proposed charge
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntent {
    pub id: String,

    #[serde(default)]
    pub phase: IntentPhase,
}

impl OrderIntent {
    pub fn new(id: impl Into<String>, phase: IntentPhase) -> Self {
        Self {
            id: id.into(),
            phase,
        }
    }

    pub fn requires_verification(&self) -> bool {
        self.phase == IntentPhase::RequiresVerification
    }
}

/// Period a mandate limit applies to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MandatePeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

/// Spending-limit policy attached to an order intent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mandate {
    pub max_amount: Decimal,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub period: MandatePeriod,
}

fn default_currency() -> String {
    "USD".into()
}

impl Mandate {
    pub fn new(max_amount: Decimal, period: MandatePeriod) -> Self {
        Self {
            max_amount,
            currency: default_currency(),
            period,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.max_amount > Decimal::ZERO && !self.currency.trim().is_empty()
    }
}

impl Default for Mandate {
    fn default() -> Self {
        Self::new(Decimal::ONE_HUNDRED, MandatePeriod::Monthly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_phase_defaults_to_requires_verification() {
        let intent: OrderIntent = serde_json::from_str(r#"{"id":"pi_1"}"#).unwrap();
        assert!(intent.requires_verification());

        let intent: OrderIntent = serde_json::from_str(r#"{"id":"pi_1","phase":"active"}"#).unwrap();
        assert!(!intent.requires_verification());

        let intent: OrderIntent = serde_json::from_str(r#"{"id":"pi_1","phase":"ready"}"#).unwrap();
        assert_eq!(intent.phase, IntentPhase::Ready);

        let intent: OrderIntent = serde_json::from_str(r#"{"id":"pi_1","phase":"settled"}"#).unwrap();
        assert_eq!(intent.phase, IntentPhase::Unknown);
        assert!(!intent.requires_verification());
    }

    #[test]
    fn test_mandate_wire_shape() {
        let mandate = Mandate::new(dec!(250.00), MandatePeriod::Weekly);
        let json = serde_json::to_value(&mandate).unwrap();
        assert_eq!(json["maxAmount"], "250.00");
        assert_eq!(json["period"], "weekly");
        assert_eq!(json["currency"], "USD");
    }

    #[test]
    fn test_zero_mandate_is_invalid() {
        assert!(!Mandate::new(Decimal::ZERO, MandatePeriod::Daily).is_valid());
        assert!(Mandate::default().is_valid());
    }
}

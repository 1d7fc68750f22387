//! Card Capture Input
//!
//! The field set submitted by the capture form. Field values are opaque to
//! this crate and are forwarded to the tokenization provider unchanged.

use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// One hosted card field with its readiness flag
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardElement {
    /// Whether the hosted element reported itself ready and complete
    #[serde(default)]
    pub ready: bool,

    #[serde(default)]
    pub value: String,
}

impl CardElement {
    pub fn ready(value: impl Into<String>) -> Self {
        Self {
            ready: true,
            value: value.into(),
        }
    }

    fn is_usable(&self) -> bool {
        self.ready && !self.value.trim().is_empty()
    }
}

// Card data never reaches logs
impl std::fmt::Debug for CardElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardElement")
            .field("ready", &self.ready)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Expiration element, exposing month and year separately
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationElement {
    #[serde(default)]
    pub ready: bool,

    #[serde(default)]
    pub month: u8,

    #[serde(default)]
    pub year: u16,
}

impl ExpirationElement {
    pub fn ready(month: u8, year: u16) -> Self {
        Self {
            ready: true,
            month,
            year,
        }
    }

    fn is_usable(&self) -> bool {
        self.ready && (1..=12).contains(&self.month) && self.year > 0
    }
}

/// Complete capture form
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardForm {
    pub number: CardElement,
    pub expiration: ExpirationElement,
    pub cvc: CardElement,
    #[serde(default)]
    pub cardholder_name: String,
}

impl CardForm {
    /// Check that every element is ready and the name is filled in
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if !self.number.is_usable() {
            missing.push("number");
        }
        if !self.expiration.is_usable() {
            missing.push("expiration");
        }
        if !self.cvc.is_usable() {
            missing.push("cvc");
        }
        if self.cardholder_name.trim().is_empty() {
            missing.push("cardholder name");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CheckoutError::ElementsNotReady(missing.join(", ")))
        }
    }

    pub fn cardholder_name(&self) -> &str {
        self.cardholder_name.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> CardForm {
        CardForm {
            number: CardElement::ready("4242424242424242"),
            expiration: ExpirationElement::ready(12, 2030),
            cvc: CardElement::ready("123"),
            cardholder_name: "Jane Doe".into(),
        }
    }

    #[test]
    fn test_complete_form_validates() {
        assert!(complete_form().validate().is_ok());
    }

    #[test]
    fn test_reports_every_missing_field() {
        let mut form = complete_form();
        form.cvc.ready = false;
        form.cardholder_name = "   ".into();

        let err = form.validate().unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::ElementsNotReady(ref fields) if fields == "cvc, cardholder name"
        ));
    }

    #[test]
    fn test_rejects_bad_expiration_month() {
        let mut form = complete_form();
        form.expiration.month = 13;
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_values() {
        let rendered = format!("{:?}", complete_form());
        assert!(!rendered.contains("4242"));
        assert!(rendered.contains("Jane Doe"));
    }
}

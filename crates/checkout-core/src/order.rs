//! Order Payloads

use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// User-entered order details
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
    pub product_url: String,

    #[serde(default)]
    pub note: Option<String>,

    pub email: String,
}

impl OrderForm {
    pub fn validate(&self) -> Result<()> {
        if self.product_url.trim().is_empty() {
            return Err(CheckoutError::InvalidInput("product URL is required".into()));
        }
        if !self.email.contains('@') {
            return Err(CheckoutError::InvalidInput("a valid email is required".into()));
        }
        Ok(())
    }

    /// Free-text line-item locator: `url:<product url>:<note>`
    pub fn product_locator(&self) -> String {
        format!(
            "url:{}:{}",
            self.product_url.trim(),
            self.note.as_deref().unwrap_or("")
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalAddress {
    pub name: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl PhysicalAddress {
    /// Fixed shipping address used by the demo checkout
    pub fn placeholder() -> Self {
        Self {
            name: "John Doe".into(),
            line1: "123 Sample Street".into(),
            line2: String::new(),
            city: "New York City".into(),
            state: "NY".into(),
            postal_code: "10007".into(),
            country: "US".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email: String,
    pub physical_address: PhysicalAddress,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayment {
    pub receipt_email: String,
    pub method: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItems {
    pub product_locator: String,
}

/// Create-order request body
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub recipient: Recipient,
    pub locale: String,
    pub payment: OrderPayment,
    pub line_items: LineItems,
}

impl CreateOrderRequest {
    pub fn from_form(form: &OrderForm) -> Self {
        let email = form.email.trim().to_string();
        Self {
            recipient: Recipient {
                email: email.clone(),
                physical_address: PhysicalAddress::placeholder(),
            },
            locale: "en-US".into(),
            payment: OrderPayment {
                receipt_email: email,
                method: "card-token".into(),
            },
            line_items: LineItems {
                product_locator: form.product_locator(),
            },
        }
    }
}

/// Order created by the commerce provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,

    #[serde(default)]
    pub phase: Option<String>,
}

/// Response of a payment submission, kept as returned
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt(pub serde_json::Value);

/// Final result shown on the order page
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: String,
    pub payment: serde_json::Value,
}

impl OrderConfirmation {
    pub fn message(&self) -> String {
        format!("Order {} submitted", self.order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> OrderForm {
        OrderForm {
            product_url: "https://example.com/item".into(),
            note: None,
            email: "jane@example.com".into(),
        }
    }

    #[test]
    fn test_product_locator() {
        let mut form = form();
        assert_eq!(form.product_locator(), "url:https://example.com/item:");
        form.note = Some("size M".into());
        assert_eq!(form.product_locator(), "url:https://example.com/item:size M");
    }

    #[test]
    fn test_create_order_wire_shape() {
        let body = serde_json::to_value(CreateOrderRequest::from_form(&form())).unwrap();
        assert_eq!(body["recipient"]["email"], "jane@example.com");
        assert_eq!(body["recipient"]["physicalAddress"]["postalCode"], "10007");
        assert_eq!(body["payment"]["receiptEmail"], "jane@example.com");
        assert_eq!(body["payment"]["method"], "card-token");
        assert_eq!(body["lineItems"]["productLocator"], "url:https://example.com/item:");
        assert_eq!(body["locale"], "en-US");
    }

    #[test]
    fn test_form_validation() {
        assert!(form().validate().is_ok());
        let mut bad = form();
        bad.email = "nope".into();
        assert!(bad.validate().is_err());
        bad = form();
        bad.product_url = " ".into();
        assert!(bad.validate().is_err());
    }
}

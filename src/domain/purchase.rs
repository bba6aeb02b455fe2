use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};

/// A strictly positive amount, held in minor units so the hidden form field,
/// the visible summary and the stored record all agree on one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    pub fn from_cents(cents: i64) -> Option<Self> {
        (cents > 0).then_some(Self(cents))
    }

    /// Parses gateway or form text such as `100`, `100.5` or `$100.00`.
    /// Decimals are taken exactly: more than two significant fractional
    /// digits (`12.345`, `0.004`) are rejected, never rounded.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
        let (units, fraction) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
        let fraction = fraction.trim_end_matches('0');

        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if units.is_empty() || !is_digits(units) || !is_digits(fraction) || fraction.len() > 2 {
            return None;
        }

        let units: i64 = units.parse().ok()?;
        let minor: i64 = format!("{:0<2}", fraction).parse().ok()?;
        units
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(minor))
            .and_then(Self::from_cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (units, cents) = (self.0 / 100, self.0 % 100);
        if cents == 0 {
            write!(f, "{}", units)
        } else {
            write!(f, "{}.{:02}", units, cents)
        }
    }
}

/// A single order, built per form request and embedded in the synthesized
/// markup. It is never stored; only a completed purchase is.
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub order_id: String,
    pub amount: Amount,
    pub quantity: u32,
    pub currency: String,
    pub buyer_email: Option<String>,
    pub buyer_name: Option<String>,
}

impl PurchaseRequest {
    pub fn description(&self, product_name: &str) -> String {
        format!("{} (x{})", product_name, self.quantity)
    }

    /// First and last name for the prefilled form fields.
    pub fn buyer_name_parts(&self) -> (&str, &str) {
        match self.buyer_name.as_deref().map(str::trim) {
            Some(name) => match name.split_once(char::is_whitespace) {
                Some((first, last)) => (first, last.trim()),
                None => (name, ""),
            },
            None => ("", ""),
        }
    }
}

pub fn generate_order_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "KIT-{}-{}",
        now.format("%Y%m%d%H%M%S%3f"),
        suffix[..8].to_uppercase()
    )
}

/// Body of the JSON form request sent by the embedding page.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFormRequest {
    /// Kept loose so a string or missing amount maps to `InvalidAmount`
    /// rather than a generic body rejection.
    pub amount: Option<Value>,
    #[validate(range(min = 1, max = 1000))]
    pub quantity: Option<u32>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    #[validate(email)]
    pub customer_email: Option<String>,
    #[validate(length(max = 200))]
    pub customer_name: Option<String>,
    #[serde(default = "default_embed_form")]
    pub embed_form: bool,
}

fn default_embed_form() -> bool {
    true
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CheckoutFormRequest {
    pub fn amount(&self) -> Result<Amount> {
        let amount = match &self.amount {
            Some(Value::Number(n)) => Amount::parse(&n.to_string()),
            Some(Value::String(s)) => Amount::parse(s),
            _ => None,
        };
        amount.ok_or_else(|| {
            AppError::InvalidAmount(
                "Amount must be a positive number with at most two decimal places".to_string(),
            )
        })
    }

    pub fn into_purchase_request(mut self, now: DateTime<Utc>) -> Result<PurchaseRequest> {
        let amount = self.amount()?;

        if !self.embed_form {
            return Err(AppError::BadRequest(
                "Only embedded payment forms are supported".to_string(),
            ));
        }

        self.customer_email = blank_to_none(self.customer_email);
        self.customer_name = blank_to_none(self.customer_name);
        self.currency = blank_to_none(self.currency);
        self.validate()?;

        let currency = self
            .currency
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or_else(|| "USD".to_string());
        if !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::Validation(format!("Invalid currency code: {}", currency)));
        }

        Ok(PurchaseRequest {
            order_id: generate_order_id(now),
            amount,
            quantity: self.quantity.unwrap_or(1),
            currency,
            buyer_email: self.customer_email,
            buyer_name: self.customer_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: Value) -> CheckoutFormRequest {
        serde_json::from_value(body).expect("valid request body")
    }

    #[test]
    fn test_amount_display_is_stable() {
        assert_eq!(Amount::parse("100").unwrap().to_string(), "100");
        assert_eq!(Amount::parse("100.5").unwrap().to_string(), "100.50");
        assert_eq!(Amount::parse("$1,250.00").unwrap().to_string(), "1250");
        assert_eq!(Amount::parse("19.99").unwrap().cents(), 1999);
        assert_eq!(Amount::parse("12.340").unwrap().to_string(), "12.34");
    }

    #[test]
    fn test_amount_rejects_non_positive() {
        assert!(Amount::parse("0").is_none());
        assert!(Amount::parse("-5").is_none());
        assert!(Amount::parse("abc").is_none());
        assert!(Amount::parse("").is_none());
        assert!(Amount::parse("NaN").is_none());
        assert!(Amount::parse("1e3").is_none());
        assert!(Amount::parse(".5").is_none());
    }

    #[test]
    fn test_amount_is_never_rounded() {
        assert!(Amount::parse("12.345").is_none());
        assert!(Amount::parse("0.004").is_none());

        for amount in [json!(12.345), json!(0.004), json!("12.345")] {
            let err = request(json!({ "amount": amount }))
                .into_purchase_request(Utc::now())
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidAmount(_)), "amount {:?}", amount);
        }

        let purchase = request(json!({ "amount": 12.34 }))
            .into_purchase_request(Utc::now())
            .unwrap();
        assert_eq!(purchase.amount.cents(), 1234);
        assert_eq!(purchase.amount.to_string(), "12.34");
    }

    #[test]
    fn test_order_id_carries_timestamp() {
        let now = DateTime::parse_from_rfc3339("2024-03-01T12:30:45.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let first = generate_order_id(now);
        let second = generate_order_id(now);

        assert!(first.starts_with("KIT-20240301123045123-"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_defaults_applied() {
        let purchase = request(json!({ "amount": 100, "embedForm": true }))
            .into_purchase_request(Utc::now())
            .unwrap();

        assert_eq!(purchase.quantity, 1);
        assert_eq!(purchase.currency, "USD");
        assert_eq!(purchase.amount.to_string(), "100");
        assert_eq!(purchase.description("Genius Recovery Kit"), "Genius Recovery Kit (x1)");
    }

    #[test]
    fn test_invalid_amounts() {
        for amount in [json!(0), json!(-10), json!("abc"), json!(null), json!([1])] {
            let err = request(json!({ "amount": amount }))
                .into_purchase_request(Utc::now())
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidAmount(_)), "amount {:?}", err);
        }

        let err = request(json!({ "quantity": 1 }))
            .into_purchase_request(Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAmount(_)));
    }

    #[test]
    fn test_email_validated_only_when_present() {
        let err = request(json!({ "amount": 50, "customerEmail": "not-an-email" }))
            .into_purchase_request(Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let purchase = request(json!({ "amount": 50, "customerEmail": "  " }))
            .into_purchase_request(Utc::now())
            .unwrap();
        assert_eq!(purchase.buyer_email, None);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = request(json!({ "amount": 50, "quantity": 0 }))
            .into_purchase_request(Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_buyer_name_split() {
        let purchase = request(json!({ "amount": 50, "customerName": "Ada  King Lovelace" }))
            .into_purchase_request(Utc::now())
            .unwrap();
        assert_eq!(purchase.buyer_name_parts(), ("Ada", "King Lovelace"));

        let purchase = request(json!({ "amount": 50, "customerName": "Ada" }))
            .into_purchase_request(Utc::now())
            .unwrap();
        assert_eq!(purchase.buyer_name_parts(), ("Ada", ""));
    }
}

use crate::payments::outcome::{classify, Outcome};

type Pairs = Vec<(String, String)>;

fn parse_pairs(raw: &str) -> Pairs {
    serde_urlencoded::from_str::<Pairs>(raw.trim()).unwrap_or_default()
}

/// First non-empty value among `keys`, checked in order. The gateway and the
/// card form spell the same field differently (`first_name`, `firstname`).
fn lookup(pairs: &[(String, String)], keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        pairs
            .iter()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim().to_string())
    })
}

/// Buyer details carried either by the original form submission or echoed
/// back by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuyerFields {
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub order_id: Option<String>,
}

impl BuyerFields {
    pub fn parse(raw: &str) -> Self {
        Self::from_pairs(&parse_pairs(raw))
    }

    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            amount: lookup(pairs, &["amount"]),
            currency: lookup(pairs, &["currency"]),
            email: lookup(pairs, &["email"]),
            first_name: lookup(pairs, &["first_name", "firstname", "firstName"]),
            last_name: lookup(pairs, &["last_name", "lastname", "lastName"]),
            order_id: lookup(pairs, &["orderid", "orderId", "order_id"]),
        }
    }

    /// Field-wise merge that keeps `self` wherever it has a value.
    pub fn or(self, fallback: &BuyerFields) -> Self {
        Self {
            amount: self.amount.or_else(|| fallback.amount.clone()),
            currency: self.currency.or_else(|| fallback.currency.clone()),
            email: self.email.or_else(|| fallback.email.clone()),
            first_name: self.first_name.or_else(|| fallback.first_name.clone()),
            last_name: self.last_name.or_else(|| fallback.last_name.clone()),
            order_id: self.order_id.or_else(|| fallback.order_id.clone()),
        }
    }
}

/// One gateway answer, from an inline relay reply or a GET postback.
#[derive(Debug, Clone, Default)]
pub struct GatewayResult {
    pub raw_response_code: Option<String>,
    pub raw_response_text: String,
    pub transaction_id: Option<String>,
    pub echoed: BuyerFields,
    /// The unparsed payload, kept for server-side diagnostics only.
    pub raw: String,
    /// Whether `response` or `responsetext` appeared at all, even empty.
    responded: bool,
}

impl GatewayResult {
    /// Parses a `key=value&...` payload; used for both the relay body and
    /// the callback query string.
    pub fn parse(raw: &str) -> Self {
        let pairs = parse_pairs(raw);
        Self {
            raw_response_code: lookup(&pairs, &["response"]),
            raw_response_text: lookup(&pairs, &["responsetext"]).unwrap_or_default(),
            transaction_id: lookup(&pairs, &["transactionid", "transactionId", "transaction_id"]),
            echoed: BuyerFields::from_pairs(&pairs),
            raw: raw.to_string(),
            responded: pairs
                .iter()
                .any(|(k, _)| k == "response" || k == "responsetext"),
        }
    }

    pub fn transport_failure(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            raw_response_text: reason.clone(),
            raw: reason,
            ..Default::default()
        }
    }

    /// True when the payload carries the gateway's own response markers,
    /// whether or not they have values.
    pub fn has_response(&self) -> bool {
        self.responded
    }

    pub fn outcome(&self) -> Outcome {
        classify(self.raw_response_code.as_deref(), &self.raw_response_text)
    }
}

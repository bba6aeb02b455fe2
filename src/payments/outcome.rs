//! Classification of gateway answers.
//!
//! The gateway speaks a loose `response=<code>&responsetext=<text>` protocol:
//! `1` approved, `2` declined, `3` error. Every entry point funnels through
//! [`classify`] so the relay and the callback can never disagree about an
//! equivalent payload.

pub const DECLINED_MESSAGE: &str = "Payment declined - Please check your card details";
pub const FAILED_MESSAGE: &str = "Payment failed";

const DECLINE_MARKER: &str = "DECLINE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Approved,
    /// Explicit rejection; carries the buyer-facing diagnostic.
    Declined(String),
    /// Anything the gateway did not classify, including transport failures.
    /// Carries the raw text for logging; the buyer only sees [`FAILED_MESSAGE`].
    Ambiguous(String),
}

impl Outcome {
    /// Message shown on the failure page, `None` when approved.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Outcome::Approved => None,
            Outcome::Declined(reason) => Some(reason),
            Outcome::Ambiguous(_) => Some(FAILED_MESSAGE),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Approved => "approved",
            Outcome::Declined(_) => "declined",
            Outcome::Ambiguous(_) => "error",
        }
    }
}

pub fn classify(raw_code: Option<&str>, raw_text: &str) -> Outcome {
    match raw_code.map(str::trim) {
        Some("1") => Outcome::Approved,
        Some("2") | Some("3") => {
            if raw_text.to_ascii_uppercase().contains(DECLINE_MARKER) {
                Outcome::Declined(DECLINED_MESSAGE.to_string())
            } else {
                Outcome::Declined(FAILED_MESSAGE.to_string())
            }
        }
        _ => Outcome::Ambiguous(raw_text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approved_only_on_code_one() {
        assert_eq!(classify(Some("1"), "SUCCESS"), Outcome::Approved);
        assert_eq!(classify(Some(" 1 "), ""), Outcome::Approved);
        assert_ne!(classify(Some("11"), "SUCCESS"), Outcome::Approved);
        assert_ne!(classify(None, "response=1"), Outcome::Approved);
    }

    #[test]
    fn test_decline_marker_gives_specific_message() {
        let outcome = classify(Some("2"), "DECLINE");
        assert_eq!(outcome.diagnostic(), Some(DECLINED_MESSAGE));

        let outcome = classify(Some("2"), "Card Declined by issuer");
        assert_eq!(outcome.diagnostic(), Some(DECLINED_MESSAGE));
    }

    #[test]
    fn test_generic_failure_message() {
        let outcome = classify(Some("3"), "Invalid Credit Card Number REFID:1234");
        assert_eq!(outcome, Outcome::Declined(FAILED_MESSAGE.to_string()));
        assert_eq!(outcome.label(), "declined");
    }

    #[test]
    fn test_unknown_code_is_ambiguous() {
        let outcome = classify(Some("9"), "weird");
        assert_eq!(outcome, Outcome::Ambiguous("weird".to_string()));
        assert_eq!(outcome.diagnostic(), Some(FAILED_MESSAGE));
        assert_eq!(outcome.label(), "error");

        assert_eq!(classify(None, "").diagnostic(), Some(FAILED_MESSAGE));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let inputs = [
            (Some("1"), "SUCCESS"),
            (Some("2"), "DECLINE"),
            (Some("3"), "Duplicate transaction"),
            (None, "timeout"),
        ];
        for (code, text) in inputs {
            assert_eq!(classify(code, text), classify(code, text));
        }
    }
}

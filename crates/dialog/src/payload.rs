//! Typed submission payloads, one fixed shape per flow.
//!
//! The engine collects free text into `Session::fields`; completing a flow
//! turns that map into one of these records. Construction re-checks every
//! field rule, so a payload that exists is a payload that is valid.

use std::collections::BTreeMap;

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use crate::error::{Error, Result};

/// Marker value the chatlog service expects on bot-collected entries.
const CHATLOG_ENTRY_TYPE: &str = "user_input";

// ── Field rules ─────────────────────────────────────────────────────────────

/// `+` followed by at least one digit and nothing else. Shared by the
/// customer phone and the chatlog Viber id.
pub fn is_phone_shaped(text: &str) -> bool {
    let Some(digits) = text.strip_prefix('+') else {
        return false;
    };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Positive integer amounts only.
pub fn parse_amount(text: &str) -> Option<i64> {
    let value: i64 = text.trim().parse().ok()?;
    (value > 0).then_some(value)
}

fn required(fields: &BTreeMap<String, String>, flow: &'static str, key: &'static str) -> Result<String> {
    let value = fields
        .get(key)
        .map(|v| v.trim().to_string())
        .unwrap_or_default();
    if value.is_empty() {
        return Err(Error::MissingField { flow, field: key });
    }
    Ok(value)
}

// ── Payload records ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerPayload {
    pub name: String,
    pub phone: String,
    pub region: String,
}

impl CustomerPayload {
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Result<Self> {
        let payload = Self {
            name: required(fields, "customer", "name")?,
            phone: required(fields, "customer", "phone")?,
            region: required(fields, "customer", "region")?,
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.region.trim().is_empty() {
            return Err(Error::InvalidPayload {
                flow: "customer",
                reason: "name and region must be non-empty".into(),
            });
        }
        if !is_phone_shaped(&self.phone) {
            return Err(Error::InvalidPayload {
                flow: "customer",
                reason: format!("phone `{}` must be `+` followed by digits", self.phone),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub user_id: String,
    pub amount: i64,
    pub method: String,
    pub reference_id: String,
}

impl PaymentPayload {
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Result<Self> {
        let amount_text = required(fields, "payment", "amount")?;
        let amount = parse_amount(&amount_text).ok_or_else(|| Error::InvalidPayload {
            flow: "payment",
            reason: format!("amount `{amount_text}` is not a positive integer"),
        })?;
        let payload = Self {
            user_id: required(fields, "payment", "user_id")?,
            amount,
            method: required(fields, "payment", "method")?,
            reference_id: required(fields, "payment", "reference_id")?,
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount <= 0 {
            return Err(Error::InvalidPayload {
                flow: "payment",
                reason: format!("amount {} must be positive", self.amount),
            });
        }
        if self.user_id.trim().is_empty()
            || self.method.trim().is_empty()
            || self.reference_id.trim().is_empty()
        {
            return Err(Error::InvalidPayload {
                flow: "payment",
                reason: "user_id, method and reference_id must be non-empty".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatLogPayload {
    pub viber_id: String,
    pub message: String,
    /// Stamped server-side when the payload is built.
    pub timestamp: DateTime<Utc>,
    pub r#type: String,
}

impl ChatLogPayload {
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Result<Self> {
        let payload = Self {
            viber_id: required(fields, "chatlog", "viber_id")?,
            message: required(fields, "chatlog", "message")?,
            timestamp: Utc::now(),
            r#type: CHATLOG_ENTRY_TYPE.into(),
        };
        payload.validate()?;
        Ok(payload)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_phone_shaped(&self.viber_id) {
            return Err(Error::InvalidPayload {
                flow: "chatlog",
                reason: format!("viber_id `{}` must be `+` followed by digits", self.viber_id),
            });
        }
        if self.message.trim().is_empty() {
            return Err(Error::InvalidPayload {
                flow: "chatlog",
                reason: "message must be non-empty".into(),
            });
        }
        Ok(())
    }
}

// ── Submission union ────────────────────────────────────────────────────────

/// A completed flow's payload, ready for its downstream service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum Submission {
    Customer(CustomerPayload),
    Payment(PaymentPayload),
    ChatLog(ChatLogPayload),
    /// Deliberately hits the always-failing sandbox endpoint.
    SimulateFailure,
}

impl Submission {
    /// Short tag for logs and request-log entries.
    pub fn flow_name(&self) -> &'static str {
        match self {
            Self::Customer(_) => "customer",
            Self::Payment(_) => "payment",
            Self::ChatLog(_) => "chatlog",
            Self::SimulateFailure => "simulate_failure",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rstest]
    #[case("+959123456", true)]
    #[case("+1", true)]
    #[case("+", false)]
    #[case("959123456", false)]
    #[case("+959 123", false)]
    #[case("+959abc", false)]
    #[case("", false)]
    fn phone_shape_rule(#[case] input: &str, #[case] ok: bool) {
        assert_eq!(is_phone_shaped(input), ok);
    }

    #[rstest]
    #[case("25000", Some(25000))]
    #[case(" 25000 ", Some(25000))]
    #[case("0", None)]
    #[case("-5", None)]
    #[case("abc", None)]
    #[case("25.5", None)]
    fn amount_rule(#[case] input: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_amount(input), expected);
    }

    #[test]
    fn customer_payload_requires_every_field() {
        let err = CustomerPayload::from_fields(&fields(&[("name", "Aye"), ("phone", "+95911")]))
            .unwrap_err();
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn payment_payload_parses_the_collected_amount() {
        let payload = PaymentPayload::from_fields(&fields(&[
            ("user_id", "U1"),
            ("amount", "25000"),
            ("method", "KBZ Pay"),
            ("reference_id", "REF1"),
        ]))
        .unwrap();
        assert_eq!(payload.amount, 25000);
    }

    #[test]
    fn chatlog_payload_gets_timestamp_and_entry_type() {
        let payload =
            ChatLogPayload::from_fields(&fields(&[("viber_id", "+95911"), ("message", "hi")]))
                .unwrap();
        assert_eq!(payload.r#type, "user_input");
        assert!(payload.timestamp <= Utc::now());
    }

    #[test]
    fn submission_serializes_with_a_flow_tag() {
        let submission = Submission::Payment(PaymentPayload {
            user_id: "U1".into(),
            amount: 25000,
            method: "KBZ Pay".into(),
            reference_id: "REF1".into(),
        });
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["flow"], "payment");
        assert_eq!(json["amount"], 25000);
    }
}

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::domain::{Cryptocurrency, NewTransaction, TransactionStatus};

/// Fractional digits kept for amounts and prices. Matches `NUMERIC(20, 8)`.
pub const DECIMAL_SCALE: i64 = 8;
/// Integer digits `NUMERIC(20, 8)` can hold; values must stay below 10^12.
pub const DECIMAL_INTEGER_DIGITS: u32 = 12;
const MAX_NUMERIC_STRING_LEN: usize = 32;
pub const ALLOWED_CRYPTOCURRENCIES: &[&str] = &["SOL", "USDC", "ETH", "BTC"];
pub const ALLOWED_STATUSES: &[&str] = &["pending", "completed", "failed"];

/// Untrusted payment request as received over the wire.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionInput {
    pub amount: Option<Value>,
    pub cryptocurrency: Option<String>,
    pub sender_address: Option<String>,
    pub recipient_address: Option<String>,
    pub status: Option<String>,
    pub price_at_transaction: Option<Value>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct RawStatusUpdate {
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Every field-level failure found in one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn record<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.0.push(e);
                None
            }
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_enum(field: &'static str, value: &str, allowed: &[&str]) -> ValidationResult {
    if allowed.iter().all(|candidate| value != *candidate) {
        return Err(ValidationError::new(
            field,
            format!("must be one of: {}", allowed.join(", ")),
        ));
    }

    Ok(())
}

pub fn validate_positive_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

pub fn validate_decimal_range(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    let limit = BigDecimal::from(10_i64.pow(DECIMAL_INTEGER_DIGITS));
    if amount >= &limit {
        return Err(ValidationError::new(
            field,
            format!("must be less than {}", limit),
        ));
    }

    Ok(())
}

/// Plain `[+-]digits[.digits]` notation only. Exponents are refused so that
/// rescaling stays proportional to the input length.
fn is_plain_decimal(value: &str) -> bool {
    let unsigned = value
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(value);
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    !(int_part.is_empty() && frac_part.is_empty())
        && int_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.chars().all(|c| c.is_ascii_digit())
}

/// Parses a JSON number or plain numeric string, checks it is positive and
/// fits the column, then truncates it to [`DECIMAL_SCALE`].
///
/// A positive value that truncates to zero is refused as too precise rather
/// than stored as zero.
pub fn parse_positive_decimal(
    field: &'static str,
    value: Option<&Value>,
) -> Result<BigDecimal, ValidationError> {
    let parsed = match value {
        None | Some(Value::Null) => return Err(ValidationError::new(field, "is required")),
        Some(Value::Number(n)) => BigDecimal::from_str(&n.to_string()).ok(),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.len() <= MAX_NUMERIC_STRING_LEN && is_plain_decimal(s) {
                BigDecimal::from_str(s).ok()
            } else {
                None
            }
        }
        Some(_) => None,
    }
    .ok_or_else(|| ValidationError::new(field, "must be a number"))?;

    validate_positive_amount(field, &parsed)?;
    validate_decimal_range(field, &parsed)?;

    let normalized = parsed.with_scale(DECIMAL_SCALE);
    if normalized == BigDecimal::from(0) {
        return Err(ValidationError::new(
            field,
            format!("must be at least 0.{:0>width$}", 1, width = DECIMAL_SCALE as usize),
        ));
    }
    Ok(normalized)
}

/// Addresses are stored exactly as submitted; sanitising only decides emptiness.
fn parse_address(field: &'static str, value: Option<&str>) -> Result<String, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::new(field, "is required"))?;
    validate_required(field, &sanitize_string(value))?;
    Ok(value.to_string())
}

fn parse_variant<T: FromStr>(
    field: &'static str,
    value: Option<&str>,
    allowed: &[&str],
) -> Result<T, ValidationError> {
    let value = value.ok_or_else(|| ValidationError::new(field, "is required"))?;
    validate_enum(field, value, allowed)?;
    value
        .parse()
        .map_err(|_| ValidationError::new(field, format!("must be one of: {}", allowed.join(", "))))
}

pub fn parse_cryptocurrency(value: Option<&str>) -> Result<Cryptocurrency, ValidationError> {
    parse_variant("cryptocurrency", value, ALLOWED_CRYPTOCURRENCIES)
}

pub fn parse_status(value: Option<&str>) -> Result<TransactionStatus, ValidationError> {
    parse_variant("status", value, ALLOWED_STATUSES)
}

/// Validates an untrusted payment request, collecting every field failure.
pub fn validate_transaction(input: &RawTransactionInput) -> Result<NewTransaction, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let amount = errors.record(parse_positive_decimal("amount", input.amount.as_ref()));
    let cryptocurrency = errors.record(parse_cryptocurrency(input.cryptocurrency.as_deref()));
    let sender_address =
        errors.record(parse_address("senderAddress", input.sender_address.as_deref()));
    let recipient_address =
        errors.record(parse_address("recipientAddress", input.recipient_address.as_deref()));
    let status = errors.record(parse_status(input.status.as_deref()));
    let price_at_transaction = errors.record(parse_positive_decimal(
        "priceAtTransaction",
        input.price_at_transaction.as_ref(),
    ));

    match (
        amount,
        cryptocurrency,
        sender_address,
        recipient_address,
        status,
        price_at_transaction,
    ) {
        (
            Some(amount),
            Some(cryptocurrency),
            Some(sender_address),
            Some(recipient_address),
            Some(status),
            Some(price_at_transaction),
        ) if errors.is_empty() => Ok(NewTransaction {
            amount,
            cryptocurrency,
            sender_address,
            recipient_address,
            status,
            price_at_transaction,
        }),
        _ => Err(errors),
    }
}

pub fn validate_status_update(input: &RawStatusUpdate) -> Result<TransactionStatus, ValidationErrors> {
    parse_status(input.status.as_deref()).map_err(ValidationErrors::from)
}

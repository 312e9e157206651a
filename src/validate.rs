//! Request parameter validation.
//!
//! Everything here runs before any chain access: a failure is always a client
//! error, carries the exact message the route returns, and never triggers a
//! retry. Each function takes raw string input and produces a strongly-typed
//! value or a [`ValidationError`].

use alloy_primitives::{B256, U256};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::shape::{Page, StatusFilter};
use crate::types::{EvmAddress, TokenAmount, TokenId};

/// Maximum description length, applied after sanitization.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Fractional digits accepted on the creation amount; matches the base-unit
/// scale the contract carries amounts in.
pub const AMOUNT_DECIMALS: u32 = 18;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;

/// A validation failure. The `Display` form is the client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required parameters")]
    MissingParameters,
    #[error("Missing address parameter")]
    MissingAddress,
    #[error("Invalid address format")]
    AddressFormat,
    #[error("Invalid {0} address")]
    InvalidAddress(&'static str),
    #[error("Amount must be a positive number")]
    InvalidAmount,
    #[error("Amount has too many decimal places")]
    TooManyDecimals,
    #[error("Invalid {0} format")]
    InvalidFormat(&'static str),
    #[error("Invalid token ID")]
    InvalidTokenId,
    #[error("Description cannot be empty")]
    EmptyDescription,
    #[error("Description is too long")]
    DescriptionTooLong,
    #[error("Invalid page number")]
    InvalidPage,
    #[error("Invalid limit (must be between 1 and 100)")]
    InvalidLimit,
    #[error("Invalid status (must be paid or unpaid)")]
    InvalidStatus,
    #[error("Missing userOpHash parameter")]
    MissingUserOpHash,
    #[error("Invalid userOpHash format. Must start with 0x")]
    UserOpHashFormat,
    #[error("Invalid userOpHash length")]
    UserOpHashLength,
}

/// Requires a POST body field to be present and non-empty.
pub fn require_field(value: Option<&str>) -> Result<&str, ValidationError> {
    match value {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(ValidationError::MissingParameters),
    }
}

/// Validates a body address field, naming the field in the failure message.
pub fn validate_address(input: &str, field: &'static str) -> Result<EvmAddress, ValidationError> {
    EvmAddress::from_str(input).map_err(|_| ValidationError::InvalidAddress(field))
}

/// Validates the `address` query parameter.
pub fn validate_query_address(input: Option<&str>) -> Result<EvmAddress, ValidationError> {
    let input = input.ok_or(ValidationError::MissingAddress)?;
    if input.is_empty() {
        return Err(ValidationError::MissingAddress);
    }
    EvmAddress::from_str(input).map_err(|_| ValidationError::AddressFormat)
}

/// Validates a creation amount: a positive decimal with at most 18 fractional
/// digits, converted to base units by scaling the mantissa to 18 decimals.
///
/// `"1.5"` means one and a half whole tokens, i.e. `1500000000000000000` base
/// units; `"5"` means five whole tokens.
pub fn validate_create_amount(input: &str) -> Result<TokenAmount, ValidationError> {
    let decimal = Decimal::from_str(input).map_err(|_| ValidationError::InvalidAmount)?;
    if decimal <= Decimal::ZERO {
        return Err(ValidationError::InvalidAmount);
    }
    // Decimal::from_str already caps the scale at 28; the 18-digit cap below is
    // the one callers observe. Count digits textually so "1.1234567890123456789"
    // is rejected rather than silently rounded.
    if let Some((_, fraction)) = input.split_once('.') {
        if fraction.len() > AMOUNT_DECIMALS as usize {
            return Err(ValidationError::TooManyDecimals);
        }
    }
    let mantissa = U256::from(decimal.mantissa().unsigned_abs());
    let scale_up = U256::from(10u64).pow(U256::from(AMOUNT_DECIMALS - decimal.scale()));
    Ok(TokenAmount(mantissa * scale_up))
}

static UINT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid uint regex"));

/// Validates a non-negative integer string (`^\d+$`), naming the field in the
/// failure message. Used for the settlement path's token id and amount.
pub fn validate_uint(input: &str, field: &'static str) -> Result<U256, ValidationError> {
    if !UINT_RE.is_match(input) {
        return Err(ValidationError::InvalidFormat(field));
    }
    U256::from_str_radix(input, 10).map_err(|_| ValidationError::InvalidFormat(field))
}

/// Validates the settlement-path token id.
pub fn validate_token_id(input: &str) -> Result<TokenId, ValidationError> {
    validate_uint(input, "token ID").map(TokenId)
}

/// Validates the settlement-path amount (already in base units).
pub fn validate_settle_amount(input: &str) -> Result<TokenAmount, ValidationError> {
    validate_uint(input, "amount").map(TokenAmount)
}

/// Validates the `tokenId` query parameter of the details route.
pub fn validate_query_token_id(input: Option<&str>) -> Result<TokenId, ValidationError> {
    let input = input.ok_or(ValidationError::InvalidTokenId)?;
    if !UINT_RE.is_match(input) {
        return Err(ValidationError::InvalidTokenId);
    }
    U256::from_str_radix(input, 10)
        .map(TokenId)
        .map_err(|_| ValidationError::InvalidTokenId)
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Entity bodies (after `&`) that escaping itself produces. An ampersand
/// already starting one of these is left alone, which keeps sanitization
/// idempotent.
const ESCAPED_ENTITIES: [&str; 5] = ["amp;", "lt;", "gt;", "quot;", "#x27;"];

/// Sanitizes a payment description: strips HTML tags, HTML-escapes
/// `& < > " '`, trims whitespace. Rejects results that are empty or longer
/// than [`MAX_DESCRIPTION_LEN`]. Length is checked after sanitization.
pub fn sanitize_description(input: &str) -> Result<String, ValidationError> {
    let stripped = TAG_RE.replace_all(input, "");
    let mut escaped = String::with_capacity(stripped.len());
    for (i, c) in stripped.char_indices() {
        match c {
            '&' => {
                let tail = &stripped[i + 1..];
                if ESCAPED_ENTITIES.iter().any(|e| tail.starts_with(e)) {
                    escaped.push('&');
                } else {
                    escaped.push_str("&amp;");
                }
            }
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    let trimmed = escaped.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(trimmed.to_string())
}

/// Validates `page` and `limit` query parameters, applying defaults of 1/10.
pub fn validate_pagination(
    page: Option<&str>,
    limit: Option<&str>,
) -> Result<Page, ValidationError> {
    let page = match page {
        None => DEFAULT_PAGE,
        Some(s) => match s.parse::<u64>() {
            Ok(n) if n >= 1 => n,
            _ => return Err(ValidationError::InvalidPage),
        },
    };
    let limit = match limit {
        None => DEFAULT_LIMIT,
        Some(s) => match s.parse::<u64>() {
            Ok(n) if (1..=MAX_LIMIT).contains(&n) => n,
            _ => return Err(ValidationError::InvalidLimit),
        },
    };
    Ok(Page { page, limit })
}

/// Validates the optional `status` filter: exactly `paid` or `unpaid`.
pub fn validate_status(input: Option<&str>) -> Result<Option<StatusFilter>, ValidationError> {
    match input {
        None => Ok(None),
        Some("paid") => Ok(Some(StatusFilter::Paid)),
        Some("unpaid") => Ok(Some(StatusFilter::Unpaid)),
        Some(_) => Err(ValidationError::InvalidStatus),
    }
}

/// Validates a user-operation hash: `0x`-prefixed, exactly 66 characters,
/// valid hex. Runs before any network call.
pub fn validate_user_op_hash(input: &str) -> Result<B256, ValidationError> {
    if !input.starts_with("0x") {
        return Err(ValidationError::UserOpHashFormat);
    }
    if input.len() != 66 {
        return Err(ValidationError::UserOpHashLength);
    }
    let bytes = hex::decode(&input[2..]).map_err(|_| ValidationError::UserOpHashFormat)?;
    Ok(B256::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_eighteen_fractional_digits() {
        let amount = validate_create_amount("1.123456789012345678").unwrap();
        assert_eq!(amount, TokenAmount(U256::from(1_123_456_789_012_345_678u64)));
    }

    #[test]
    fn rejects_nineteen_fractional_digits() {
        assert_eq!(
            validate_create_amount("1.1234567890123456789"),
            Err(ValidationError::TooManyDecimals)
        );
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert_eq!(validate_create_amount("0"), Err(ValidationError::InvalidAmount));
        assert_eq!(validate_create_amount("-1"), Err(ValidationError::InvalidAmount));
        assert_eq!(validate_create_amount("abc"), Err(ValidationError::InvalidAmount));
        assert_eq!(validate_create_amount(""), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn scales_whole_tokens_to_base_units() {
        let amount = validate_create_amount("1.5").unwrap();
        assert_eq!(amount, TokenAmount(U256::from(1_500_000_000_000_000_000u64)));
        let amount = validate_create_amount("2").unwrap();
        assert_eq!(amount, TokenAmount(U256::from(2_000_000_000_000_000_000u64)));
    }

    #[test]
    fn uint_rejects_signs_decimals_and_hex() {
        assert!(validate_uint("123", "amount").is_ok());
        assert_eq!(
            validate_uint("1.5", "amount"),
            Err(ValidationError::InvalidFormat("amount"))
        );
        assert_eq!(
            validate_uint("-1", "token ID"),
            Err(ValidationError::InvalidFormat("token ID"))
        );
        assert_eq!(
            validate_uint("0x10", "token ID"),
            Err(ValidationError::InvalidFormat("token ID"))
        );
    }

    #[test]
    fn uint_accepts_values_beyond_u64() {
        let value = validate_uint("340282366920938463463374607431768211456", "amount").unwrap();
        assert_eq!(value, U256::from(1u8) << 128);
    }

    #[test]
    fn sanitize_strips_tags_and_escapes() {
        assert_eq!(
            sanitize_description("<script>x</script>Pay rent").unwrap(),
            "Pay rent"
        );
        assert_eq!(sanitize_description("<b>Rent</b>").unwrap(), "Rent");
        assert_eq!(sanitize_description("it's due").unwrap(), "it&#x27;s due");
        assert_eq!(sanitize_description("a < b & c").unwrap(), "a &lt; b &amp; c");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = sanitize_description("it's a <b>deal</b> & more").unwrap();
        let twice = sanitize_description(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn sanitize_trims_and_bounds_length() {
        assert_eq!(sanitize_description("  hi  ").unwrap(), "hi");
        assert_eq!(
            sanitize_description("<p></p>"),
            Err(ValidationError::EmptyDescription)
        );
        assert_eq!(
            sanitize_description("   "),
            Err(ValidationError::EmptyDescription)
        );
        let long = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert_eq!(
            sanitize_description(&long),
            Err(ValidationError::DescriptionTooLong)
        );
        let exact = "x".repeat(MAX_DESCRIPTION_LEN);
        assert!(sanitize_description(&exact).is_ok());
    }

    #[test]
    fn length_limit_applies_after_sanitization() {
        // 600 raw characters whose tags strip down to fit.
        let input = format!("<div>{}</div>{}", "a".repeat(11), "b".repeat(489));
        assert!(sanitize_description(&input).is_ok());
    }

    #[test]
    fn pagination_defaults_and_bounds() {
        let page = validate_pagination(None, None).unwrap();
        assert_eq!((page.page, page.limit), (1, 10));
        let page = validate_pagination(Some("3"), Some("100")).unwrap();
        assert_eq!((page.page, page.limit), (3, 100));
        assert_eq!(
            validate_pagination(Some("0"), None),
            Err(ValidationError::InvalidPage)
        );
        assert_eq!(
            validate_pagination(Some("abc"), None),
            Err(ValidationError::InvalidPage)
        );
        assert_eq!(
            validate_pagination(None, Some("0")),
            Err(ValidationError::InvalidLimit)
        );
        assert_eq!(
            validate_pagination(None, Some("101")),
            Err(ValidationError::InvalidLimit)
        );
    }

    #[test]
    fn status_filter_is_exact() {
        assert_eq!(validate_status(None).unwrap(), None);
        assert_eq!(validate_status(Some("paid")).unwrap(), Some(StatusFilter::Paid));
        assert_eq!(
            validate_status(Some("unpaid")).unwrap(),
            Some(StatusFilter::Unpaid)
        );
        assert_eq!(
            validate_status(Some("Paid")),
            Err(ValidationError::InvalidStatus)
        );
        assert_eq!(validate_status(Some("")), Err(ValidationError::InvalidStatus));
    }

    #[test]
    fn user_op_hash_shape_checks_run_locally() {
        let ok = format!("0x{}", "ab".repeat(32));
        assert!(validate_user_op_hash(&ok).is_ok());
        assert_eq!(
            validate_user_op_hash(&"ab".repeat(33)),
            Err(ValidationError::UserOpHashFormat)
        );
        assert_eq!(
            validate_user_op_hash("0x1234"),
            Err(ValidationError::UserOpHashLength)
        );
        let non_hex = format!("0x{}", "zz".repeat(32));
        assert_eq!(
            validate_user_op_hash(&non_hex),
            Err(ValidationError::UserOpHashFormat)
        );
    }
}

//! Base-unit amounts carried as decimal strings, summed with arbitrary precision

use dashu_int::UBig;
use tracing::debug;

/// Parse a base-10 amount string
pub fn parse(amount: &str) -> Option<UBig> {
    UBig::from_str_radix(amount.trim(), 10).ok()
}

/// Sum base-10 amount strings. Entries that do not parse are skipped.
/// The empty sum is "0".
pub fn sum<'a, I>(amounts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut total = UBig::ZERO;
    for amount in amounts {
        match parse(amount) {
            Some(value) => total += value,
            None => debug!(amount, "Ignoring unparsable amount"),
        }
    }
    total.to_string()
}

pub fn is_zero(amount: &str) -> bool {
    parse(amount).is_none_or(|value| value == UBig::ZERO)
}

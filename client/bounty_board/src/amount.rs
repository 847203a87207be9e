//! Conversion between human-entered coin amounts and integer base units.
//!
//! [`parse_base_units`] is the only place a decimal amount becomes a wire
//! value. Everything read back from the ledger is already in base units and
//! is only ever scaled for display through [`format_base_units`].

use crate::errors::{BoardError, Result};

pub const DECIMALS: usize = 9;
pub const BASE_UNITS_PER_COIN: u64 = 1_000_000_000;

/// Parse a positive decimal string into base units, flooring anything past
/// the ninth decimal place.
pub fn parse_base_units(input: &str) -> Result<u64> {
    let s = input.trim();
    if s.is_empty() {
        return Err(BoardError::validation("amount is required"));
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(BoardError::validation(format!("invalid amount: {input}")));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BoardError::validation(format!("invalid amount: {input}")));
    }

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .ok()
            .and_then(|w| w.checked_mul(BASE_UNITS_PER_COIN))
            .ok_or_else(|| BoardError::validation(format!("amount too large: {input}")))?
    };

    let kept = &frac[..frac.len().min(DECIMALS)];
    let frac_units = if kept.is_empty() {
        0
    } else {
        // `kept` is at most nine digits so this cannot overflow.
        format!("{kept:0<9}").parse::<u64>().unwrap_or(0)
    };

    let total = whole_units
        .checked_add(frac_units)
        .ok_or_else(|| BoardError::validation(format!("amount too large: {input}")))?;
    if total == 0 {
        return Err(BoardError::validation("amount must be greater than zero"));
    }
    Ok(total)
}

/// Render base units as a decimal coin amount, trimming trailing zeros.
pub fn format_base_units(units: u64) -> String {
    let whole = units / BASE_UNITS_PER_COIN;
    let frac = units % BASE_UNITS_PER_COIN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:09}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

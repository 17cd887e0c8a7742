//! Human-readable formatting for amounts, addresses and times

use chrono::{TimeZone, Utc};

use crate::types::proposal::TransactionKind;

const STX_DECIMALS: u32 = 6;

/// Format micro-STX as STX: `1 STX`, `1.500000 STX`, `1,234 STX`
pub fn format_stx_amount(micro_stx: u128) -> String {
    format!("{} STX", format_token_amount(micro_stx, STX_DECIMALS))
}

/// Format base units with `decimals` fractional digits.
///
/// Whole amounts drop the fraction entirely; otherwise all digits are shown.
pub fn format_token_amount(amount: u128, decimals: u32) -> String {
    let divisor = 10u128.checked_pow(decimals).unwrap_or(u128::MAX);
    let whole = amount / divisor;
    let fraction = amount % divisor;

    if fraction == 0 {
        return group_thousands(whole);
    }
    format!(
        "{}.{:0width$}",
        group_thousands(whole),
        fraction,
        width = decimals as usize
    )
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM` -> `ST1PQH...GZGM` for `chars = 4`
pub fn abbreviate_address(address: &str, chars: usize) -> String {
    let len = address.chars().count();
    if len <= chars * 2 {
        return address.to_string();
    }
    let head: String = address.chars().take(chars + 2).collect();
    let tail: String = address.chars().skip(len - chars).collect();
    format!("{head}...{tail}")
}

/// Relative age of `then_ms` as seen at `now_ms`, both Unix milliseconds.
///
/// Anything a week or older falls back to a short date (`Jan 1, 2023`).
pub fn format_relative_time(then_ms: i64, now_ms: i64) -> String {
    let seconds = now_ms.saturating_sub(then_ms).div_euclid(1000);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if seconds < 60 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} {} ago", plural(minutes, "min"))
    } else if hours < 24 {
        format!("{hours} {} ago", plural(hours, "hour"))
    } else if days < 7 {
        format!("{days} {} ago", plural(days, "day"))
    } else {
        format_date(then_ms)
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n > 1 {
        format!("{unit}s")
    } else {
        unit.to_string()
    }
}

/// Short UTC date, e.g. `Jan 1, 2023`
pub fn format_date(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => timestamp_ms.to_string(),
    }
}

pub fn format_transaction_kind(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::NativeTransfer => "STX Transfer",
        TransactionKind::TokenTransfer => "Token Transfer",
    }
}

//! Unit conversion and display formatting shared by the services and views.

use ethers::types::U256;

use crate::constants::SCIENTIFIC_PRICE_THRESHOLD;

/// Convert a raw integer amount to a decimal string in `decimals` precision.
///
/// Keeps every significant digit and always carries at least one fractional
/// digit, so `10^21` at 18 decimals is `"1000.0"` and zero is `"0.0"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;

    let (int_part, frac_part) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        let padded = format!("{:0>width$}", digits, width = decimals);
        ("0".to_string(), padded)
    };

    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        format!("{}.0", int_part)
    } else {
        format!("{}.{}", int_part, frac)
    }
}

/// `0` is `0.00000000`, tiny positive prices use two significant digits in
/// scientific notation, everything else is fixed at 8 decimals.
pub fn format_price(price: f64) -> String {
    if price == 0.0 {
        return "0.00000000".to_string();
    }
    if price > 0.0 && price < SCIENTIFIC_PRICE_THRESHOLD {
        return format!("{:.1e}", price);
    }
    format!("{:.8}", price)
}

pub fn format_percentage_change(change: f64) -> String {
    // normalise -0.0 so it renders as +0.00%
    let change = if change == 0.0 { 0.0 } else { change };
    let sign = if change >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, change)
}

/// Raw holder balance to human units with at most two fraction digits and
/// thousands separators. Malformed input renders as `"0"`.
pub fn format_holder_balance(value: &str, decimals: u8) -> String {
    let raw = match U256::from_dec_str(value.trim()) {
        Ok(raw) => raw,
        Err(_) => return "0".to_string(),
    };
    if decimals > 77 {
        return "0".to_string();
    }

    let base = U256::exp10(decimals as usize);
    let scaled = match raw.checked_mul(U256::from(100)) {
        Some(scaled) => scaled,
        None => return "0".to_string(),
    };

    let (mut cents, remainder) = scaled.div_mod(base);
    if remainder.saturating_mul(U256::from(2)) >= base {
        cents += U256::one();
    }

    let (whole, frac) = cents.div_mod(U256::from(100));
    let whole = group_thousands(&whole.to_string());
    let frac = frac.as_u64();

    match frac {
        0 => whole,
        f if f % 10 == 0 => format!("{}.{}", whole, f / 10),
        f => format!("{}.{:02}", whole, f),
    }
}

/// Share of total supply held, as a percentage with 4 decimals.
///
/// `total_supply` is in human units (as carried by `TokenRecord`), `holder_value`
/// is raw. Anything unparsable or non-finite renders as `"0"`.
pub fn calculate_supply_owned(holder_value: &str, total_supply: &str, decimals: u8) -> String {
    let holder = match holder_value.trim().parse::<f64>() {
        Ok(v) => v,
        Err(_) => return "0".to_string(),
    };
    let total = match total_supply.trim().parse::<f64>() {
        Ok(v) => v * 10f64.powi(decimals as i32),
        Err(_) => return "0".to_string(),
    };

    let percentage = holder / total * 100.0;
    if !percentage.is_finite() {
        return "0".to_string();
    }
    format!("{:.4}", percentage)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

//! Money is stored as integer cents to keep arithmetic exact.

/// Amount in cents.
pub type Cents = i64;

/// Format cents as a dollar string, e.g. `123456` -> `"$1234.56"`.
pub fn usd(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

/// Convert a dollar price from an external quote into cents, rounding
/// to the nearest cent.
pub fn dollars_to_cents(dollars: f64) -> Cents {
    (dollars * 100.0).round() as Cents
}

use std::fmt;

/// Amounts are non-negative magnitudes; the sign comes from the entry type.
/// Stored as SQLite REAL.
pub type Amount = f64;

/// Format an amount with two decimals.
/// Example: 50.0 -> "50.00", 1930.5 -> "1930.50"
pub fn format_amount(amount: Amount) -> String {
    // avoid printing "-0.00" for tiny negative balances
    if amount.abs() < 0.005 {
        return "0.00".to_string();
    }
    format!("{:.2}", amount)
}

/// Parse a user-supplied amount.
/// Accepts anything `f64` parses ("50", "12.5", ".50", "1e3") as long as it is
/// finite and not negative.
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let amount: f64 = input.parse().map_err(|_| ParseAmountError::InvalidFormat)?;
    if !amount.is_finite() {
        return Err(ParseAmountError::NotFinite);
    }
    if amount < 0.0 {
        return Err(ParseAmountError::Negative);
    }
    Ok(amount)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat,
    NotFinite,
    Negative,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "amount is required"),
            ParseAmountError::InvalidFormat => write!(f, "invalid amount format"),
            ParseAmountError::NotFinite => write!(f, "amount must be a finite number"),
            ParseAmountError::Negative => write!(f, "amount cannot be negative"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

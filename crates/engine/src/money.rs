use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount represented as **integer cents**.
///
/// Every balance and total in the engine is accumulated in this type, so a
/// long history of edits never drifts the way binary floats would. Rounding
/// to two decimals only happens when the value is displayed.
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "$12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
/// assert_eq!("10,5".parse::<MoneyCents>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
///
/// Totals use [`MoneyCents::parse_or_zero`], which rounds extra decimals
/// instead:
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!(MoneyCents::parse_or_zero("12.345").cents(), 1235);
/// ```
///
/// Arithmetic saturates at the `i64` bounds.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }

    /// Lenient parse used at aggregation time.
    ///
    /// Extra decimals are rounded to the cent, half away from zero, so
    /// `"12.345"` counts as 1235 cents and a float-stringified
    /// `"0.30000000000000004"` as 30. Text that does not parse contributes
    /// nothing to a total; it is never an error once an entry is in the
    /// ledger.
    #[must_use]
    pub fn parse_or_zero(text: &str) -> MoneyCents {
        match parse_decimal(text, Decimals::Round) {
            Ok(amount) => amount,
            Err(err) => {
                if !text.trim().is_empty() {
                    tracing::debug!("amount {text:?} counted as zero: {err}");
                }
                MoneyCents::ZERO
            }
        }
    }

    /// Value in currency units, for wire formats that carry plain numbers.
    #[must_use]
    pub fn as_units(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let dollars = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}${dollars}.{cents:02}")
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        *self = *self + rhs;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for MoneyCents {
    fn sub_assign(&mut self, rhs: MoneyCents) {
        *self = *self - rhs;
    }
}

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> Self::Output {
        MoneyCents(self.0.saturating_neg())
    }
}

impl std::iter::Sum for MoneyCents {
    fn sum<I: Iterator<Item = MoneyCents>>(iter: I) -> Self {
        iter.fold(MoneyCents::ZERO, Add::add)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator, an optional leading `+`/`-`
    /// and an optional leading `$`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s, Decimals::Reject)
    }
}

/// What to do with fractional digits past the cent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decimals {
    Reject,
    Round,
}

fn parse_decimal(s: &str, decimals: Decimals) -> Result<MoneyCents, EngineError> {
    let empty = || EngineError::ParseFailure("empty amount".to_string());
    let invalid = || EngineError::ParseFailure(format!("invalid amount {s:?}"));
    let overflow = || EngineError::ParseFailure("amount too large".to_string());

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (-1i64, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (1i64, stripped)
    } else {
        (1i64, trimmed)
    };

    let rest = rest.trim();
    let rest = rest.strip_prefix('$').unwrap_or(rest).trim();
    if rest.is_empty() {
        return Err(empty());
    }

    let rest = rest.replace(',', ".");
    let mut parts = rest.split('.');
    let whole_str = parts.next().ok_or_else(invalid)?;
    let cents_str = parts.next();

    if parts.next().is_some() {
        return Err(invalid());
    }

    // ".5" is a valid way to type fifty cents in a number input.
    let whole: i64 = if whole_str.is_empty() && cents_str.is_some_and(|c| !c.is_empty()) {
        0
    } else {
        if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        whole_str.parse().map_err(|_| overflow())?
    };

    let cents: i64 = match cents_str {
        None | Some("") => 0,
        Some(frac) => {
            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            if frac.len() > 2 && decimals == Decimals::Reject {
                return Err(EngineError::ParseFailure("too many decimals".to_string()));
            }
            let digit = |i: usize| frac.as_bytes().get(i).map_or(0, |b| i64::from(b - b'0'));
            let round_up = frac.len() > 2 && digit(2) >= 5;
            digit(0) * 10 + digit(1) + i64::from(round_up)
        }
    };

    let total = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(overflow)?;

    let signed = if sign < 0 {
        total.checked_neg().ok_or_else(overflow)?
    } else {
        total
    };

    Ok(MoneyCents(signed))
}

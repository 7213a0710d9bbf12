//! The module contains the `Entry` type, one line of a sub-ledger.
//!
//! The same shape serves all three pools: a personal transaction, a CaseCash
//! purchase and a meal swipe. The amount keeps the text the user typed so the
//! view can show it back unchanged; totals read it through
//! [`Entry::amount_cents`].
use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{EngineError, MoneyCents};

/// Direction of a personal-pool entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidEntry(format!(
                "unknown entry type '{other}'"
            ))),
        }
    }
}

/// One line of a sub-ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Category for personal entries, location for CaseCash and swipes.
    #[serde(default, alias = "category", alias = "location", alias = "place")]
    pub label: String,
    #[serde(
        default,
        alias = "type",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<EntryKind>,
    #[serde(default, deserialize_with = "amount_text")]
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Entry {
    /// A personal income or expense.
    pub fn personal(kind: EntryKind, category: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            label: category.into(),
            kind: Some(kind),
            amount: amount.into(),
            ..Self::default()
        }
    }

    /// A CaseCash purchase.
    pub fn case_cash(location: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            label: location.into(),
            amount: amount.into(),
            ..Self::default()
        }
    }

    /// A single meal swipe.
    pub fn swipe(location: impl Into<String>) -> Self {
        Self {
            label: location.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    #[must_use]
    pub fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Amount in cents; unparseable or missing text counts as zero.
    pub fn amount_cents(&self) -> MoneyCents {
        MoneyCents::parse_or_zero(&self.amount)
    }

    /// Entry kind for personal aggregation. Untyped entries are expenses.
    pub fn kind_or_expense(&self) -> EntryKind {
        self.kind.unwrap_or(EntryKind::Expense)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(date) = &self.date {
            write!(f, "{date} ")?;
        }
        write!(f, "{}", self.label)?;
        if !self.amount.is_empty() {
            write!(f, " {}", self.amount_cents())?;
        }
        Ok(())
    }
}

/// Older slots stored amounts as JSON numbers; keep whatever came in as text.
fn amount_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
        Raw::Missing(()) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_amount_is_kept_but_counts_as_zero() {
        let entry = Entry::personal(EntryKind::Expense, "Books", "abc");
        assert_eq!(entry.amount, "abc");
        assert_eq!(entry.amount_cents(), MoneyCents::ZERO);
    }

    #[test]
    fn deserializes_original_field_names() {
        let json = r#"{"date":"2025-01-15","category":"Food","type":"Expense","amount":"12.50","notes":""}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.label, "Food");
        assert_eq!(entry.kind, Some(EntryKind::Expense));
        assert_eq!(entry.amount_cents().cents(), 1250);

        let json = r#"{"date":"2025-01-15","place":"Grab-It","amount":4.5}"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.label, "Grab-It");
        assert_eq!(entry.amount, "4.5");
        assert_eq!(entry.amount_cents().cents(), 450);
    }

    #[test]
    fn float_number_amount_rounds_to_cents() {
        let entry: Entry =
            serde_json::from_str(r#"{"location":"Grab-It","amount":0.30000000000000004}"#).unwrap();
        assert_eq!(entry.amount_cents().cents(), 30);
    }

    #[test]
    fn null_amount_becomes_empty_text() {
        let entry: Entry = serde_json::from_str(r#"{"location":"Leutner","amount":null}"#).unwrap();
        assert_eq!(entry.amount, "");
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("income".parse::<EntryKind>().unwrap(), EntryKind::Income);
        assert_eq!(" EXPENSE ".parse::<EntryKind>().unwrap(), EntryKind::Expense);
        assert!("refund".parse::<EntryKind>().is_err());
    }
}

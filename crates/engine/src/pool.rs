//! The three money pools and what an entry means in each of them.
//!
//! A [`Pool`] decides how an [`Entry`] moves its aggregate (the `effect`), what
//! config the pool carries, and which entries a view may submit.

use std::{
    fmt,
    ops::{Add, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{EngineError, Entry, EntryKind, MoneyCents, ResultEngine};

/// Identifies a pool in scope keys, routes and logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Personal,
    CaseCash,
    MealSwipes,
}

impl PoolKind {
    pub const ALL: [PoolKind; 3] = [Self::Personal, Self::CaseCash, Self::MealSwipes];

    /// Path segment and scope-key prefix.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Personal => "transactions",
            Self::CaseCash => "casecash",
            Self::MealSwipes => "mealplan",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PoolKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PoolKind::ALL
            .into_iter()
            .find(|kind| kind.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::InvalidEntry(format!("unknown pool '{s}'")))
    }
}

/// Domain rules of one pool.
pub trait Pool: fmt::Debug + Clone + Copy + Default + Send + Sync + 'static {
    /// Aggregate maintained over the entries.
    type Total: Copy
        + Default
        + fmt::Debug
        + fmt::Display
        + PartialEq
        + Send
        + Sync
        + Add<Output = Self::Total>
        + Sub<Output = Self::Total>;

    /// Scalar settings persisted next to the entries.
    type Config: Clone + Default + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    const KIND: PoolKind;

    /// Signed contribution of one entry to the aggregate.
    fn effect(entry: &Entry) -> Self::Total;

    /// Checks a view must run before handing an entry to the ledger.
    fn validate(entry: &Entry) -> ResultEngine<()>;

    /// Reads a slot document written before the versioned schema existed.
    fn from_legacy(_value: &serde_json::Value) -> Option<(Self::Config, Vec<Entry>)> {
        None
    }
}

/// Personal funds: signed income/expense ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Personal;

/// CaseCash: cumulative spend, no funding or top-ups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaseCash;

/// Meal plan: one entry per swipe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MealSwipes;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalConfig {
    #[serde(rename = "weeklyBudgetCents")]
    pub weekly_budget: MoneyCents,
}

impl Default for PersonalConfig {
    fn default() -> Self {
        Self {
            weekly_budget: MoneyCents::new(100_00),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseCashConfig {}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MealPlanConfig {
    pub weekly_limit: WeeklyLimit,
    /// ISO date of the last explicit week reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reset: Option<String>,
}

/// Weekly swipe allowance; serialized as a number or `"Unlimited"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLimit", into = "RawLimit")]
pub enum WeeklyLimit {
    Limited(u32),
    Unlimited,
}

impl WeeklyLimit {
    pub const DEFAULT_SWIPES: u32 = 19;

    /// Swipes left this week, `None` for an unlimited plan.
    pub fn remaining(self, used: SwipeCount) -> Option<i64> {
        match self {
            Self::Limited(limit) => Some(i64::from(limit) - used.count()),
            Self::Unlimited => None,
        }
    }
}

impl Default for WeeklyLimit {
    fn default() -> Self {
        Self::Limited(Self::DEFAULT_SWIPES)
    }
}

impl fmt::Display for WeeklyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(limit) => write!(f, "{limit}"),
            Self::Unlimited => f.write_str("Unlimited"),
        }
    }
}

impl FromStr for WeeklyLimit {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("unlimited") {
            return Ok(Self::Unlimited);
        }
        trimmed
            .parse::<u32>()
            .map(Self::Limited)
            .map_err(|_| EngineError::InvalidEntry(format!("invalid weekly limit '{s}'")))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawLimit {
    Count(u32),
    Text(String),
}

impl TryFrom<RawLimit> for WeeklyLimit {
    type Error = EngineError;

    fn try_from(value: RawLimit) -> Result<Self, Self::Error> {
        match value {
            RawLimit::Count(count) => Ok(Self::Limited(count)),
            RawLimit::Text(text) => text.parse(),
        }
    }
}

impl From<WeeklyLimit> for RawLimit {
    fn from(value: WeeklyLimit) -> Self {
        match value {
            WeeklyLimit::Limited(count) => RawLimit::Count(count),
            WeeklyLimit::Unlimited => RawLimit::Text("Unlimited".to_string()),
        }
    }
}

/// Number of meal swipes; signed so reversal arithmetic stays closed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SwipeCount(i64);

impl SwipeCount {
    pub const ONE: SwipeCount = SwipeCount(1);

    pub const fn new(count: i64) -> Self {
        Self(count)
    }

    pub const fn count(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SwipeCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for SwipeCount {
    type Output = SwipeCount;

    fn add(self, rhs: SwipeCount) -> Self::Output {
        SwipeCount(self.0.saturating_add(rhs.0))
    }
}

impl Sub for SwipeCount {
    type Output = SwipeCount;

    fn sub(self, rhs: SwipeCount) -> Self::Output {
        SwipeCount(self.0.saturating_sub(rhs.0))
    }
}

fn require_label(entry: &Entry, what: &str) -> ResultEngine<()> {
    if entry.label.trim().is_empty() {
        return Err(EngineError::InvalidEntry(format!("{what} must not be empty")));
    }
    Ok(())
}

/// Largest amount a single entry may carry: one billion dollars.
pub const MAX_ENTRY_AMOUNT: MoneyCents = MoneyCents::new(1_000_000_000_00);

fn require_positive_amount(entry: &Entry) -> ResultEngine<()> {
    let amount: MoneyCents = entry.amount.parse()?;
    if !amount.is_positive() {
        return Err(EngineError::InvalidEntry("amount must be > 0".to_string()));
    }
    if amount > MAX_ENTRY_AMOUNT {
        return Err(EngineError::InvalidEntry(format!(
            "amount must not exceed {MAX_ENTRY_AMOUNT}"
        )));
    }
    Ok(())
}

impl Pool for Personal {
    type Total = MoneyCents;
    type Config = PersonalConfig;

    const KIND: PoolKind = PoolKind::Personal;

    fn effect(entry: &Entry) -> MoneyCents {
        let amount = entry.amount_cents();
        match entry.kind_or_expense() {
            EntryKind::Income => amount,
            EntryKind::Expense => -amount,
        }
    }

    fn validate(entry: &Entry) -> ResultEngine<()> {
        require_label(entry, "category")?;
        require_positive_amount(entry)
    }
}

impl Pool for CaseCash {
    type Total = MoneyCents;
    type Config = CaseCashConfig;

    const KIND: PoolKind = PoolKind::CaseCash;

    fn effect(entry: &Entry) -> MoneyCents {
        entry.amount_cents()
    }

    fn validate(entry: &Entry) -> ResultEngine<()> {
        require_label(entry, "location")?;
        require_positive_amount(entry)
    }
}

impl Pool for MealSwipes {
    type Total = SwipeCount;
    type Config = MealPlanConfig;

    const KIND: PoolKind = PoolKind::MealSwipes;

    fn effect(_entry: &Entry) -> SwipeCount {
        SwipeCount::ONE
    }

    fn validate(entry: &Entry) -> ResultEngine<()> {
        require_label(entry, "location")
    }

    /// The browser client stored `{weeklyLimit, swipesUsed, swipeHistory}`
    /// with the newest swipe first.
    fn from_legacy(value: &serde_json::Value) -> Option<(MealPlanConfig, Vec<Entry>)> {
        let object = value.as_object()?;
        let history = object.get("swipeHistory")?;
        let entries: Vec<Entry> = serde_json::from_value(history.clone()).ok()?;

        let weekly_limit = object
            .get("weeklyLimit")
            .cloned()
            .and_then(|raw| serde_json::from_value::<WeeklyLimit>(raw).ok())
            .unwrap_or_default();

        if let Some(used) = object.get("swipesUsed").and_then(serde_json::Value::as_i64)
            && used != entries.len() as i64
        {
            tracing::warn!(
                "legacy meal plan recorded {used} swipes but holds {} entries; using the entries",
                entries.len()
            );
        }

        Some((
            MealPlanConfig {
                weekly_limit,
                last_reset: None,
            },
            entries,
        ))
    }
}

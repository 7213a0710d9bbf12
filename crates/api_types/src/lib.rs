use serde::{Deserialize, Serialize};

pub mod ledger {
    use super::*;

    /// Direction of a personal transaction.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub enum TransactionKind {
        #[serde(alias = "income")]
        Income,
        #[serde(alias = "expense")]
        Expense,
    }

    /// Amount as typed by the user; clients send either a string or a number.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum AmountInput {
        Text(String),
        Number(f64),
    }

    impl AmountInput {
        pub fn into_text(self) -> String {
            match self {
                Self::Text(text) => text,
                Self::Number(number) => number.to_string(),
            }
        }
    }

    /// Editable fields of an entry.
    ///
    /// `label` is the category of a personal transaction and the location of
    /// a CaseCash purchase or meal swipe; both names are accepted.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct EntryFields {
        pub date: Option<String>,
        pub time: Option<String>,
        #[serde(alias = "category", alias = "location", alias = "place")]
        pub label: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<TransactionKind>,
        pub amount: Option<AmountInput>,
        pub notes: Option<String>,
    }

    /// Request body for adding an entry.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntryNew {
        /// Email of the signed-in user; absent for a guest.
        #[serde(default)]
        pub user_id: Option<String>,
        #[serde(flatten)]
        pub fields: EntryFields,
    }

    /// Request body for editing an entry in place.
    pub type EntryUpdate = EntryFields;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EntryView {
        pub position: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub date: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub time: Option<String>,
        pub label: String,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        pub kind: Option<TransactionKind>,
        /// The amount exactly as it was entered.
        pub amount: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub notes: Option<String>,
    }

    /// Weekly swipe allowance on the wire: a number or `"Unlimited"`.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum WeeklyLimitInput {
        Count(u32),
        Text(String),
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WeeklyLimitUpdate {
        pub weekly_limit: WeeklyLimitInput,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WeeklyBudgetUpdate {
        pub weekly_budget: AmountInput,
    }

    /// Response body for every ledger route.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LedgerView {
        /// `transactions`, `casecash` or `mealplan`.
        pub pool: String,
        pub user_id: String,
        pub entries: Vec<EntryView>,
        /// Formatted aggregate: `$70.00` for money pools, a count for swipes.
        pub total: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub weekly_budget: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub weekly_limit: Option<WeeklyLimitInput>,
        /// Absent for an unlimited plan.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub swipes_remaining: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub last_reset: Option<String>,
        /// False when the change is only held in memory.
        pub persisted: bool,
    }
}

pub mod assistant {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AssistantAsk {
        #[serde(default)]
        pub user_id: Option<String>,
        pub question: String,
    }

    /// Body posted to the assistant service. Money is in dollars.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AssistantQuery {
        pub question: String,
        pub weekly_budget_personal: f64,
        pub spent_this_week_personal: f64,
        pub case_cash_total_semester: f64,
        pub case_cash_spent_this_week: f64,
        /// `null` for an unlimited plan.
        pub meal_swipes_weekly_total: Option<u32>,
        pub meal_swipes_used_this_week: i64,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AssistantReply {
        pub message: String,
    }
}

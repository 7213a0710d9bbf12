//! Week-to-date figures handed to the budget assistant.
//!
//! A week starts on Sunday at local midnight. Entry dates are calendar dates
//! with no timezone; "local" means the engine's configured timezone.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{CaseCash, Entry, EntryKind, Ledger, MealSwipes, MoneyCents, Personal, WeeklyLimit};

/// Date formats the views are known to write.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Reads an entry date; `None` for anything that is not a known format.
pub fn parse_entry_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Sunday that starts the local week containing `now`.
pub fn week_start(now: DateTime<Utc>, timezone: Tz) -> NaiveDate {
    WeekWindow::containing(now, timezone).start()
}

/// `[start, start + 7 days)` for the week containing a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekWindow {
    start: NaiveDate,
}

impl WeekWindow {
    /// The week containing `now`, as seen from `timezone`.
    pub fn containing(now: DateTime<Utc>, timezone: Tz) -> Self {
        let local = timezone.from_utc_datetime(&now.naive_utc()).date_naive();
        Self::of_date(local)
    }

    pub fn of_date(date: NaiveDate) -> Self {
        let back = u64::from(date.weekday().num_days_from_sunday());
        let start = date.checked_sub_days(Days::new(back)).unwrap_or(date);
        Self { start }
    }

    /// The Sunday the week starts on.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Half-open `[start, start + 7 days)`: entries post-dated into a later
    /// week do not count toward this one.
    pub fn contains(&self, date: NaiveDate) -> bool {
        let end = self.start.checked_add_days(Days::new(7));
        date >= self.start && end.is_none_or(|end| date < end)
    }

    /// Whether an entry's date falls in this week. Undated entries never do.
    pub fn contains_entry(&self, entry: &Entry) -> bool {
        entry
            .date
            .as_deref()
            .and_then(parse_entry_date)
            .is_some_and(|date| self.contains(date))
    }
}

/// Aggregates the assistant needs to answer a budget question.
#[derive(Clone, Debug, PartialEq)]
pub struct AssistantSnapshot {
    pub weekly_budget_personal: MoneyCents,
    pub spent_this_week_personal: MoneyCents,
    pub case_cash_total_semester: MoneyCents,
    pub case_cash_spent_this_week: MoneyCents,
    /// `None` for an unlimited plan.
    pub meal_swipes_weekly_total: Option<u32>,
    pub meal_swipes_used_this_week: i64,
}

impl AssistantSnapshot {
    pub fn build(
        personal: &Ledger<Personal>,
        case_cash: &Ledger<CaseCash>,
        meal_plan: &Ledger<MealSwipes>,
        week: WeekWindow,
    ) -> Self {
        let spent_this_week_personal = personal
            .entries()
            .iter()
            .filter(|entry| entry.kind_or_expense() == EntryKind::Expense)
            .filter(|entry| week.contains_entry(entry))
            .map(Entry::amount_cents)
            .sum();

        let case_cash_spent_this_week = case_cash
            .entries()
            .iter()
            .filter(|entry| week.contains_entry(entry))
            .map(Entry::amount_cents)
            .sum();

        let meal_swipes_weekly_total = match meal_plan.config().weekly_limit {
            WeeklyLimit::Limited(limit) => Some(limit),
            WeeklyLimit::Unlimited => None,
        };

        Self {
            weekly_budget_personal: personal.config().weekly_budget,
            spent_this_week_personal,
            case_cash_total_semester: case_cash.total(),
            case_cash_spent_this_week,
            meal_swipes_weekly_total,
            // Swipes are counted since the last explicit reset, not by date.
            meal_swipes_used_this_week: meal_plan.total().count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Intent;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2025-01-15 is a Wednesday.
        assert_eq!(WeekWindow::of_date(date(2025, 1, 15)).start(), date(2025, 1, 12));
        assert_eq!(WeekWindow::of_date(date(2025, 1, 12)).start(), date(2025, 1, 12));
        assert_eq!(WeekWindow::of_date(date(2025, 1, 18)).start(), date(2025, 1, 12));
    }

    #[test]
    fn week_window_is_half_open() {
        let week = WeekWindow::of_date(date(2025, 1, 15));
        assert!(week.contains(date(2025, 1, 12)));
        assert!(week.contains(date(2025, 1, 18)));
        assert!(!week.contains(date(2025, 1, 11)));
        assert!(!week.contains(date(2025, 1, 19)));
    }

    #[test]
    fn local_midnight_depends_on_timezone() {
        // Sunday 03:00 UTC is still Saturday evening in New York.
        let now = Utc.with_ymd_and_hms(2025, 1, 19, 3, 0, 0).unwrap();
        assert_eq!(week_start(now, Tz::UTC), date(2025, 1, 19));
        assert_eq!(
            WeekWindow::containing(now, chrono_tz::America::New_York).start(),
            date(2025, 1, 12)
        );
    }

    #[test]
    fn entry_dates_in_both_formats() {
        assert_eq!(parse_entry_date("2025-01-15"), Some(date(2025, 1, 15)));
        assert_eq!(parse_entry_date("15/01/2025"), Some(date(2025, 1, 15)));
        assert_eq!(parse_entry_date("Jan 15"), None);
    }

    #[test]
    fn snapshot_counts_this_weeks_spend_only() {
        let mut personal = Ledger::<Personal>::new();
        for entry in [
            Entry::personal(EntryKind::Expense, "Food", "12.00").date("2025-01-13"),
            Entry::personal(EntryKind::Income, "Job", "200").date("2025-01-14"),
            Entry::personal(EntryKind::Expense, "Books", "40").date("2025-01-05"),
            Entry::personal(EntryKind::Expense, "Coffee", "3.50").date("14/01/2025"),
            Entry::personal(EntryKind::Expense, "Undated", "9"),
        ] {
            personal.apply(Intent::Add(entry)).unwrap();
        }

        let mut case_cash = Ledger::<CaseCash>::new();
        case_cash
            .apply(Intent::Add(Entry::case_cash("Grab-It", "5").date("2025-01-12")))
            .unwrap();
        case_cash
            .apply(Intent::Add(Entry::case_cash("Starbucks", "7.25").date("2025-01-02")))
            .unwrap();

        let mut meal_plan = Ledger::<MealSwipes>::new();
        meal_plan.apply(Intent::Add(Entry::swipe("Leutner"))).unwrap();

        let snapshot = AssistantSnapshot::build(
            &personal,
            &case_cash,
            &meal_plan,
            WeekWindow::of_date(date(2025, 1, 15)),
        );

        assert_eq!(snapshot.weekly_budget_personal, MoneyCents::new(100_00));
        assert_eq!(snapshot.spent_this_week_personal, MoneyCents::new(15_50));
        assert_eq!(snapshot.case_cash_total_semester, MoneyCents::new(12_25));
        assert_eq!(snapshot.case_cash_spent_this_week, MoneyCents::new(5_00));
        assert_eq!(snapshot.meal_swipes_weekly_total, Some(19));
        assert_eq!(snapshot.meal_swipes_used_this_week, 1);
    }
}

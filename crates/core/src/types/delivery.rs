//! Delivery-day policy.
//!
//! Orders are only delivered on a configured set of weekdays. The default set
//! is the weekend, but the policy is data so it can change without code edits.

use core::fmt;
use core::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use thiserror::Error;

/// Errors that can occur when parsing a [`DeliveryDays`] list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryDaysError {
    /// The list names no day at all.
    #[error("at least one delivery day is required")]
    Empty,
    /// An entry is not an English weekday name.
    #[error("unknown weekday: {0}")]
    UnknownDay(String),
}

/// English name of a weekday as the delivery-slots endpoint spells it.
#[must_use]
pub const fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// The set of weekdays on which deliveries are made.
///
/// Days are kept in Monday-first order regardless of how they were listed.
///
/// ```
/// use chrono::NaiveDate;
/// use truffle_core::DeliveryDays;
///
/// let days = DeliveryDays::default();
/// let saturday = NaiveDate::from_ymd_opt(2026, 10, 24).unwrap();
/// let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
/// assert!(days.allows(saturday));
/// assert!(!days.allows(monday));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDays {
    days: Vec<Weekday>,
}

impl DeliveryDays {
    /// Build a policy from an explicit list of days.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryDaysError::Empty`] if `days` is empty.
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Result<Self, DeliveryDaysError> {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        days.sort_by_key(Weekday::num_days_from_monday);
        days.dedup();
        if days.is_empty() {
            return Err(DeliveryDaysError::Empty);
        }
        Ok(Self { days })
    }

    /// Whether deliveries are made on the weekday of `date`.
    ///
    /// `date` is a calendar date with no timezone attached, so the weekday
    /// is the one the shopper picked.
    #[must_use]
    pub fn allows(&self, date: NaiveDate) -> bool {
        self.allows_weekday(date.weekday())
    }

    /// Whether deliveries are made on `day`.
    #[must_use]
    pub fn allows_weekday(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }

    /// The configured days in Monday-first order.
    #[must_use]
    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    /// Message shown when a shopper picks a day outside the policy.
    ///
    /// With the default policy: `Delivery only available on Saturdays and Sundays.`
    #[must_use]
    pub fn policy_message(&self) -> String {
        let names: Vec<String> = self
            .days
            .iter()
            .map(|d| format!("{}s", weekday_name(*d)))
            .collect();
        let list = match names.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} and {last}", rest.join(", ")),
            Some((last, _)) => last.clone(),
            None => String::new(),
        };
        format!("Delivery only available on {list}.")
    }
}

impl Default for DeliveryDays {
    fn default() -> Self {
        Self {
            days: vec![Weekday::Sat, Weekday::Sun],
        }
    }
}

impl FromStr for DeliveryDays {
    type Err = DeliveryDaysError;

    /// Parse a comma-separated list of English weekday names
    /// (`"Saturday,Sunday"`, `"sat, sun"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<Weekday>()
                    .map_err(|_| DeliveryDaysError::UnknownDay(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(days)
    }
}

impl fmt::Display for DeliveryDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.days.iter().map(|d| weekday_name(*d)).collect();
        f.write_str(&names.join(","))
    }
}

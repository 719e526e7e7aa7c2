//! Trip parameters and itinerary prompt construction.
//!
//! The prompt builder is a pure collaborator of the request orchestrator: it
//! turns [`TripParams`] into prompt text and nothing else. The exact wording
//! is unspecified; the builder only guarantees that the destination, trip
//! length, and every interest appear in the prompt, and that the prompt asks
//! for a day-by-day itinerary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Spending level for the trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    Shoestring,
    #[default]
    Moderate,
    Luxury,
}

impl std::fmt::Display for BudgetLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shoestring => write!(f, "shoestring"),
            Self::Moderate => write!(f, "moderate"),
            Self::Luxury => write!(f, "luxury"),
        }
    }
}

/// How densely packed each day should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelPace {
    Relaxed,
    #[default]
    Balanced,
    Packed,
}

impl std::fmt::Display for TravelPace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relaxed => write!(f, "relaxed"),
            Self::Balanced => write!(f, "balanced"),
            Self::Packed => write!(f, "packed"),
        }
    }
}

/// Trip preferences collected by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripParams {
    /// Where the trip goes.
    pub destination: String,
    /// First day of the trip, if known.
    pub start_date: Option<NaiveDate>,
    /// Trip length in days.
    pub duration_days: u32,
    /// Number of people traveling.
    pub travelers: u32,
    /// Spending level.
    pub budget: BudgetLevel,
    /// Daily pacing preference.
    pub pace: TravelPace,
    /// Free-form interests ("food", "museums", ...).
    pub interests: Vec<String>,
}

impl TripParams {
    /// Create parameters for a trip to `destination` lasting `duration_days`.
    #[must_use]
    pub fn new(destination: impl Into<String>, duration_days: u32) -> Self {
        Self {
            destination: destination.into(),
            start_date: None,
            duration_days,
            travelers: 1,
            budget: BudgetLevel::default(),
            pace: TravelPace::default(),
            interests: Vec::new(),
        }
    }

    /// Set the trip start date.
    #[must_use]
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Set the number of travelers.
    #[must_use]
    pub fn with_travelers(mut self, travelers: u32) -> Self {
        self.travelers = travelers;
        self
    }

    /// Set the budget level.
    #[must_use]
    pub fn with_budget(mut self, budget: BudgetLevel) -> Self {
        self.budget = budget;
        self
    }

    /// Set the travel pace.
    #[must_use]
    pub fn with_pace(mut self, pace: TravelPace) -> Self {
        self.pace = pace;
        self
    }

    /// Add an interest.
    #[must_use]
    pub fn with_interest(mut self, interest: impl Into<String>) -> Self {
        self.interests.push(interest.into());
        self
    }
}

/// Build the generation prompt for a trip.
///
/// Pure and deterministic: the same parameters always produce the same text.
#[must_use]
pub fn build_prompt(params: &TripParams) -> String {
    let mut prompt = String::with_capacity(512);

    prompt.push_str(&format!(
        "Create a detailed {}-day travel itinerary for {} for {} traveler{}.\n",
        params.duration_days,
        params.destination,
        params.travelers,
        if params.travelers == 1 { "" } else { "s" },
    ));

    if let Some(date) = params.start_date {
        prompt.push_str(&format!("The trip starts on {}.\n", date.format("%Y-%m-%d")));
    }

    prompt.push_str(&format!(
        "Budget level: {}. Pace: {}.\n",
        params.budget, params.pace
    ));

    if !params.interests.is_empty() {
        prompt.push_str("The travelers are particularly interested in: ");
        prompt.push_str(&params.interests.join(", "));
        prompt.push_str(".\n");
    }

    prompt.push_str(
        "\nStructure the itinerary day by day (\"Day 1\", \"Day 2\", ...), with \
         morning, afternoon, and evening activities for each day. Include \
         specific restaurant and activity recommendations with brief reasons, \
         and note anything that needs advance booking.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TripParams {
        TripParams::new("Lisbon", 4)
            .with_travelers(2)
            .with_budget(BudgetLevel::Moderate)
            .with_pace(TravelPace::Relaxed)
            .with_interest("food")
            .with_interest("fado music")
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(build_prompt(&params()), build_prompt(&params()));
    }

    #[test]
    fn prompt_mentions_destination_duration_and_interests() {
        let prompt = build_prompt(&params());
        assert!(prompt.contains("Lisbon"));
        assert!(prompt.contains("4-day"));
        assert!(prompt.contains("food"));
        assert!(prompt.contains("fado music"));
        assert!(prompt.contains("2 travelers"));
    }

    #[test]
    fn prompt_asks_for_day_by_day_structure() {
        let prompt = build_prompt(&params());
        assert!(prompt.contains("Day 1"));
        assert!(prompt.contains("morning"));
    }

    #[test]
    fn start_date_is_included_when_set() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 14).unwrap();
        let prompt = build_prompt(&params().with_start_date(date));
        assert!(prompt.contains("2026-09-14"));

        let without = build_prompt(&params());
        assert!(!without.contains("starts on"));
    }

    #[test]
    fn singular_traveler_reads_naturally() {
        let prompt = build_prompt(&TripParams::new("Kyoto", 3));
        assert!(prompt.contains("1 traveler."));
        assert!(!prompt.contains("1 travelers"));
    }
}

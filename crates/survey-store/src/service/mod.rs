//! Application services: the operations callers perform, written against
//! the [`SurveyStore`](crate::port::SurveyStore) and
//! [`Notifier`](crate::port::Notifier) ports.

mod analytics;
mod requirement;
mod suggestion;
mod survey;

pub use analytics::AnalyticsService;
pub use requirement::{RequirementProposal, RequirementService, RequirementUpdate};
pub use suggestion::SuggestionService;
pub use survey::SurveyService;

use crate::error::StoreError;
use survey_core::lifecycle::{classify, Lifecycle, Transition};

/// Parse a status accepted at the service boundary.
fn parse_status<S>(value: &str) -> Result<S, StoreError>
where
    S: std::str::FromStr<Err = survey_core::error::CoreError>,
{
    Ok(value.parse::<S>()?)
}

/// Log a status change, warning when it leaves the documented graph.
fn log_transition<S: Lifecycle>(id: &str, from: S, to: S) -> Transition {
    let transition = classify(from, to);
    match transition {
        Transition::Unchanged => {}
        Transition::Documented => log::info!("{} {}: {} -> {}", S::ENTITY, id, from, to),
        Transition::Undocumented => log::warn!(
            "{} {}: {} -> {} is outside the documented lifecycle",
            S::ENTITY,
            id,
            from,
            to
        ),
    }
    transition
}

/// Trimmed text, or `None` when nothing is left.
fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim).filter(|t| !t.is_empty()).map(String::from)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A selectable entry in one of the selector lists.
///
/// An empty `key` is the "no selection" / "All" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectOption {
    pub key: String,
    #[serde(default)]
    pub label: String,
}

impl SelectOption {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// The zero value: `{key: "", label: ""}`.
    pub fn none() -> Self {
        Self::default()
    }

    /// Synthetic entry prepended to lists on log/event pages.
    pub fn all() -> Self {
        Self::new("", "All")
    }

    pub fn is_none(&self) -> bool {
        self.key.is_empty() && self.label.is_empty()
    }
}

/// The view mode a selector set is currently serving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageContext {
    #[default]
    Unset,
    Dashboard,
    Log,
    Event,
    /// Any other view, e.g. `traceList`.
    Other(String),
}

impl PageContext {
    pub fn as_str(&self) -> &str {
        match self {
            PageContext::Unset => "",
            PageContext::Dashboard => "dashboard",
            PageContext::Log => "log",
            PageContext::Event => "event",
            PageContext::Other(name) => name,
        }
    }

    pub fn is_dashboard(&self) -> bool {
        matches!(self, PageContext::Dashboard)
    }

    /// Log and event explorers filter by "All" by default.
    pub fn injects_all_option(&self) -> bool {
        matches!(self, PageContext::Log | PageContext::Event)
    }
}

impl FromStr for PageContext {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "" => PageContext::Unset,
            "dashboard" => PageContext::Dashboard,
            "log" => PageContext::Log,
            "event" => PageContext::Event,
            other => PageContext::Other(other.to_string()),
        })
    }
}

impl From<&str> for PageContext {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(ctx) => ctx,
            Err(never) => match never {},
        }
    }
}

impl From<String> for PageContext {
    fn from(s: String) -> Self {
        PageContext::from(s.as_str())
    }
}

impl From<PageContext> for String {
    fn from(ctx: PageContext) -> Self {
        ctx.as_str().to_string()
    }
}

impl fmt::Display for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent selectable entity categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Service,
    Endpoint,
    Instance,
    Database,
}

impl Family {
    pub const ALL: [Family; 4] = [
        Family::Service,
        Family::Endpoint,
        Family::Instance,
        Family::Database,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Family::Service => 0,
            Family::Endpoint => 1,
            Family::Instance => 2,
            Family::Database => 3,
        }
    }

    /// Databases never get the synthetic "All" entry.
    pub fn accepts_all_option(self) -> bool {
        !matches!(self, Family::Database)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Service => "service",
            Family::Endpoint => "endpoint",
            Family::Instance => "instance",
            Family::Database => "database",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    Day,
    Hour,
    Minute,
    Second,
}

impl Step {
    fn time_format(self) -> &'static str {
        match self {
            Step::Day => "%Y-%m-%d",
            Step::Hour => "%Y-%m-%d %H",
            Step::Minute => "%Y-%m-%d %H%M",
            Step::Second => "%Y-%m-%d %H%M%S",
        }
    }
}

/// Query window passed through to every fetch and callback condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationTime {
    pub start: String,
    pub end: String,
    pub step: Step,
}

impl DurationTime {
    pub fn new(start: impl Into<String>, end: impl Into<String>, step: Step) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            step,
        }
    }

    /// Build a window from two instants, truncated to the step's precision.
    pub fn from_range(start: DateTime<Utc>, end: DateTime<Utc>, step: Step) -> Self {
        let format = step.time_format();
        Self {
            start: start.format(format).to_string(),
            end: end.format(format).to_string(),
            step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn page_context_parses_known_and_custom_views() {
        assert_eq!(PageContext::from("dashboard"), PageContext::Dashboard);
        assert_eq!(PageContext::from("log"), PageContext::Log);
        assert_eq!(PageContext::from("event"), PageContext::Event);
        assert_eq!(PageContext::from(""), PageContext::Unset);
        assert_eq!(
            PageContext::from("traceList"),
            PageContext::Other("traceList".into())
        );
        assert_eq!(PageContext::Other("traceList".into()).to_string(), "traceList");
    }

    #[test]
    fn only_log_and_event_inject_all() {
        assert!(PageContext::Log.injects_all_option());
        assert!(PageContext::Event.injects_all_option());
        assert!(!PageContext::Dashboard.injects_all_option());
        assert!(!PageContext::Other("traceList".into()).injects_all_option());
        assert!(!Family::Database.accepts_all_option());
    }

    #[test]
    fn page_context_serializes_as_plain_string() {
        let json = serde_json::to_string(&PageContext::Event).unwrap();
        assert_eq!(json, "\"event\"");
        let back: PageContext = serde_json::from_str("\"profile\"").unwrap();
        assert_eq!(back, PageContext::Other("profile".into()));
    }

    #[test]
    fn duration_formats_per_step() {
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 9, 7, 20, 59).unwrap();

        let minute = DurationTime::from_range(start, end, Step::Minute);
        assert_eq!(minute.start, "2024-03-09 0705");
        assert_eq!(minute.end, "2024-03-09 0720");

        let day = DurationTime::from_range(start, end, Step::Day);
        assert_eq!(day.start, "2024-03-09");

        let second = DurationTime::from_range(start, end, Step::Second);
        assert_eq!(second.end, "2024-03-09 072059");

        let json = serde_json::to_value(&minute).unwrap();
        assert_eq!(json["step"], "MINUTE");
    }
}

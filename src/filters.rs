use crate::{Alert, AtomEntry, Info};
use std::collections::BTreeSet;

/// Selects alerts by their classification.
///
/// Each set lists acceptable values for one field; an empty set accepts anything.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Filter {
    pub event: BTreeSet<String>,
    pub severity: BTreeSet<String>,
    pub urgency: BTreeSet<String>,
    pub certainty: BTreeSet<String>,
    pub status: BTreeSet<String>,
}

fn collect<I: IntoIterator<Item = S>, S: Into<String>>(values: I) -> BTreeSet<String> {
    values.into_iter().map(|s| s.into()).collect()
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event<I: IntoIterator<Item = S>, S: Into<String>>(self, event: I) -> Self {
        Self {
            event: collect(event),
            ..self
        }
    }

    pub fn with_severity<I: IntoIterator<Item = S>, S: Into<String>>(self, severity: I) -> Self {
        Self {
            severity: collect(severity),
            ..self
        }
    }

    pub fn with_urgency<I: IntoIterator<Item = S>, S: Into<String>>(self, urgency: I) -> Self {
        Self {
            urgency: collect(urgency),
            ..self
        }
    }

    pub fn with_certainty<I: IntoIterator<Item = S>, S: Into<String>>(self, certainty: I) -> Self {
        Self {
            certainty: collect(certainty),
            ..self
        }
    }

    pub fn with_status<I: IntoIterator<Item = S>, S: Into<String>>(self, status: I) -> Self {
        Self {
            status: collect(status),
            ..self
        }
    }

    /// Build a filter from a form-encoded query such as `severity=Severe,Extreme&status=Actual`.
    ///
    /// Values are comma-separated; unknown keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut filter = Filter::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            filter = match key.as_ref() {
                "event" => filter.with_event(value.split(',')),
                "severity" => filter.with_severity(value.split(',')),
                "urgency" => filter.with_urgency(value.split(',')),
                "certainty" => filter.with_certainty(value.split(',')),
                "status" => filter.with_status(value.split(',')),
                _ => filter,
            }
        }
        filter
    }

    pub fn is_empty(&self) -> bool {
        self.event.is_empty()
            && self.severity.is_empty()
            && self.urgency.is_empty()
            && self.certainty.is_empty()
            && self.status.is_empty()
    }

    /// Does this filter match an item?
    ///
    /// # Example
    ///
    /// ```
    /// let filter = cap_feed::Filter::new().with_severity(["Severe", "Extreme"]);
    ///
    /// assert_eq!(true, filter.matches(cap_feed::FilterItem {
    ///     event: "Tornado Warning",
    ///     severity: "Extreme",
    ///     urgency: "Immediate",
    ///     certainty: "Observed",
    ///     status: "Actual",
    /// }));
    ///
    /// assert_eq!(false, filter.matches(cap_feed::FilterItem {
    ///     event: "Flood Warning",
    ///     severity: "Moderate",
    ///     urgency: "Expected",
    ///     certainty: "Likely",
    ///     status: "Actual",
    /// }));
    /// ```
    pub fn matches<'a, I: Into<FilterItem<'a>>>(&self, item: I) -> bool {
        let query = item.into();

        accepts(&self.event, query.event)
            && accepts(&self.severity, query.severity)
            && accepts(&self.urgency, query.urgency)
            && accepts(&self.certainty, query.certainty)
            && accepts(&self.status, query.status)
    }

    /// Entries of `entries` this filter matches, in order.
    pub fn select<'e>(&'e self, entries: &'e [AtomEntry]) -> impl Iterator<Item = &'e AtomEntry> {
        entries.iter().filter(move |e| self.matches(*e))
    }

    /// Does any `info` block of `alert` match?
    pub fn matches_alert(&self, alert: &Alert) -> bool {
        alert.infos.iter().any(|info| self.matches((alert, info)))
    }
}

fn accepts(set: &BTreeSet<String>, value: &str) -> bool {
    set.is_empty() || set.contains(value)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FilterItem<'a> {
    pub event: &'a str,
    pub severity: &'a str,
    pub urgency: &'a str,
    pub certainty: &'a str,
    pub status: &'a str,
}

impl<'a> From<&'a AtomEntry> for FilterItem<'a> {
    fn from(e: &'a AtomEntry) -> Self {
        Self {
            event: &e.event,
            severity: &e.severity,
            urgency: &e.urgency,
            certainty: &e.certainty,
            status: &e.status,
        }
    }
}

impl<'a> From<(&'a Alert, &'a Info)> for FilterItem<'a> {
    fn from((alert, info): (&'a Alert, &'a Info)) -> Self {
        Self {
            event: &info.event,
            severity: &info.severity,
            urgency: &info.urgency,
            certainty: &info.certainty,
            status: &alert.status,
        }
    }
}

use crate::kinds::{Category, Certainty, MsgType, Severity, Status, Urgency};
use crate::timestamp::{parse_cap_timestamp, parse_optional};
use crate::{Geocodes, NamedValues};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Identifiers of alerts published on the NWS feed are this prefix followed by the `x` query
/// parameter of the entry's id.
pub const NWS_IDENTIFIER_PREFIX: &str = "NOAA-NWS-ALERTS-";

/// An Atom feed of CAP alerts as published by the National Weather Service.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomFeed {
    pub id: String,
    pub logo: String,
    pub generator: String,
    pub updated: String,
    pub author: Author,
    pub title: String,
    pub links: Vec<Link>,
    pub entries: Vec<AtomEntry>,
}

impl AtomFeed {
    pub fn updated_at(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        parse_cap_timestamp(&self.updated)
    }
}

/// A link related to a feed or entry.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub rel: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
}

/// One alert summarized on the feed.
///
/// The CAP classification fields sit directly on the entry instead of being split across
/// `info` and `area` blocks. The full alert is reachable through [`AtomEntry::alert_link`].
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomEntry {
    pub id: String,
    pub updated: String,
    pub published: String,
    pub author: Author,
    pub title: String,
    pub links: Vec<Link>,
    pub summary: String,
    pub event: String,
    pub effective: String,
    pub expires: String,
    pub status: String,
    pub msg_type: String,
    pub category: String,
    pub urgency: String,
    pub severity: String,
    pub certainty: String,
    pub area_desc: String,
    pub polygon: String,
    pub circle: String,
    pub geocode: AtomGeocode,
    pub parameters: NamedValues,
}

impl AtomEntry {
    /// The value of the first parameter named `name`.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.first(name)
    }

    pub fn add_parameter<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.parameters.add(name, value);
    }

    /// The link to the full CAP document: the first `alternate` (or rel-less) link, falling back
    /// to the first link of any kind.
    pub fn alert_link(&self) -> Option<&Link> {
        self.links
            .iter()
            .find(|l| l.rel.is_empty() || l.rel == "alternate")
            .or_else(|| self.links.first())
    }

    /// The `x` query parameter of the entry id, which NWS uses as the per-alert key.
    pub fn alert_key(&self) -> Option<String> {
        let id = url::Url::parse(&self.id).ok()?;
        let key = id
            .query_pairs()
            .find(|(k, _)| k == "x")
            .map(|(_, v)| v.into_owned());
        key
    }

    /// The identifier the linked CAP alert is expected to carry.
    pub fn alert_identifier(&self) -> Option<String> {
        self.alert_key()
            .map(|key| format!("{}{}", NWS_IDENTIFIER_PREFIX, key))
    }

    pub fn status_kind(&self) -> Option<Status> {
        self.status.parse().ok()
    }

    pub fn msg_type_kind(&self) -> Option<MsgType> {
        self.msg_type.parse().ok()
    }

    pub fn category_kind(&self) -> Option<Category> {
        self.category.parse().ok()
    }

    pub fn urgency_level(&self) -> Option<Urgency> {
        self.urgency.parse().ok()
    }

    pub fn severity_level(&self) -> Option<Severity> {
        self.severity.parse().ok()
    }

    pub fn certainty_level(&self) -> Option<Certainty> {
        self.certainty.parse().ok()
    }

    pub fn updated_at(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        parse_cap_timestamp(&self.updated)
    }

    pub fn published_at(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        parse_cap_timestamp(&self.published)
    }

    pub fn effective_at(&self) -> Result<Option<DateTime<FixedOffset>>, chrono::ParseError> {
        parse_optional(&self.effective)
    }

    pub fn expires_at(&self) -> Result<Option<DateTime<FixedOffset>>, chrono::ParseError> {
        parse_optional(&self.expires)
    }
}

/// The geocode element of the NWS feed.
///
/// Instead of one element per pair, NWS emits a single element holding every `valueName` and every
/// `value`. The name at index *i* pairs with the value at index *i*, and each value is itself a
/// space-separated list of codes:
///
/// ```xml
/// <cap:geocode>
///   <valueName>FIPS6</valueName>
///   <value>005067 005147</value>
///   <valueName>UGC</valueName>
///   <value>ARC067 ARC147</value>
/// </cap:geocode>
/// ```
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomGeocode {
    pub names: Vec<String>,
    pub values: Vec<String>,
}

impl AtomGeocode {
    /// The codes recorded under `name`.
    ///
    /// Only the first occurrence of `name` is consulted. Its value is split on every single space,
    /// so `"a  b"` yields `["a", "", "b"]`.
    ///
    /// # Example
    ///
    /// ```
    /// let geocode = cap_feed::AtomGeocode {
    ///     names: vec!["FIPS6".into(), "UGC".into()],
    ///     values: vec!["005067 005147".into(), "ARC067 ARC147".into()],
    /// };
    ///
    /// assert_eq!(geocode.values_for("FIPS6"), vec!["005067", "005147"]);
    /// assert_eq!(geocode.values_for("UGC"), vec!["ARC067", "ARC147"]);
    /// assert!(geocode.values_for("ZZZZ").is_empty());
    /// ```
    pub fn values_for(&self, name: &str) -> Vec<&str> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|index| self.values.get(index))
            .map(|value| value.split(' ').collect())
            .unwrap_or_default()
    }

    /// Record `codes` under `name`, joining them with single spaces.
    pub fn add<N: Into<String>, I: IntoIterator<Item = S>, S: AsRef<str>>(
        &mut self,
        name: N,
        codes: I,
    ) {
        let value = codes
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self.names.push(name.into());
        self.values.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Geocodes for AtomGeocode {
    fn geocode(&self, name: &str) -> Option<&str> {
        self.values_for(name).into_iter().next()
    }

    fn geocode_all(&self, name: &str) -> Vec<&str> {
        self.values_for(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nws_geocode() -> AtomGeocode {
        AtomGeocode {
            names: vec!["FIPS6".into(), "UGC".into()],
            values: vec!["005067 005147".into(), "ARC067 ARC147".into()],
        }
    }

    #[test]
    fn values_split_on_spaces() {
        let g = nws_geocode();
        assert_eq!(g.values_for("FIPS6"), vec!["005067", "005147"]);
        assert_eq!(g.values_for("UGC"), vec!["ARC067", "ARC147"]);
        assert!(g.values_for("ZZZZ").is_empty());
    }

    #[test]
    fn empty_geocode_is_empty() {
        let g = AtomGeocode::default();
        assert!(g.is_empty());
        assert!(g.values_for("not-a-real-key").is_empty());
        assert_eq!(g.geocode("not-a-real-key"), None);
    }

    #[test]
    fn only_first_name_is_consulted() {
        let g = AtomGeocode {
            names: vec!["UGC".into(), "UGC".into()],
            values: vec!["ARC067".into(), "ARC147".into()],
        };
        assert_eq!(g.values_for("UGC"), vec!["ARC067"]);
    }

    #[test]
    fn split_is_exact() {
        let g = AtomGeocode {
            names: vec!["FIPS6".into(), "SAME".into()],
            values: vec!["005067  005147".into(), "".into()],
        };
        assert_eq!(g.values_for("FIPS6"), vec!["005067", "", "005147"]);
        assert_eq!(g.values_for("SAME"), vec![""]);
    }

    #[test]
    fn name_without_value() {
        let g = AtomGeocode {
            names: vec!["FIPS6".into(), "UGC".into()],
            values: vec!["005067".into()],
        };
        assert!(g.values_for("UGC").is_empty());
    }

    #[test]
    fn add_joins_codes() {
        let mut g = AtomGeocode::default();
        g.add("UGC", ["ARC067", "ARC147"]);
        assert_eq!(g.values, vec!["ARC067 ARC147"]);
        assert_eq!(g.geocode("UGC"), Some("ARC067"));
    }

    #[test]
    fn alert_key() {
        let entry = AtomEntry {
            id: "http://alerts.weather.gov/cap/wwacapget.php?x=AR1253BA2D9194.FloodWarning.1253BA3B7444AR.LZKFLSLZK.342064b5a5aafb8265dfc3707d6a3b09".into(),
            ..AtomEntry::default()
        };
        assert_eq!(
            entry.alert_identifier().as_deref(),
            Some("NOAA-NWS-ALERTS-AR1253BA2D9194.FloodWarning.1253BA3B7444AR.LZKFLSLZK.342064b5a5aafb8265dfc3707d6a3b09")
        );

        let entry = AtomEntry {
            id: "urn:uuid:1234".into(),
            ..AtomEntry::default()
        };
        assert_eq!(entry.alert_key(), None);
    }

    #[test]
    fn alert_link_prefers_alternate() {
        let mut entry = AtomEntry::default();
        assert!(entry.alert_link().is_none());

        entry.links.push(Link {
            rel: "self".into(),
            href: "https://example.com/self".into(),
        });
        assert_eq!(entry.alert_link().unwrap().href, "https://example.com/self");

        entry.links.push(Link {
            rel: String::new(),
            href: "https://example.com/alert".into(),
        });
        assert_eq!(entry.alert_link().unwrap().href, "https://example.com/alert");
    }
}

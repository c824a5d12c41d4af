use crate::kinds::{Category, Certainty, MsgType, Scope, Severity, Status, Urgency};
use crate::timestamp::{parse_cap_timestamp, parse_optional};
use crate::{Geocodes, NamedValues};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A CAP alert message: its purpose, its source and its status.
///
/// CAP 1.1 and CAP 1.2 documents both decode into this one shape. Fields the document omits are
/// left empty; no CAP-required field is enforced.
///
/// See the [CAP 1.2 specification](http://docs.oasis-open.org/emergency/cap/v1.2/CAP-v1.2-os.html)
/// for the meaning of each field.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Unique per sender, e.g. `NOAA-NWS-ALERTS-AR1253BA3B00A4.FloodWarning...`
    pub identifier: String,
    pub sender: String,
    /// Offset-aware timestamp as sent; see [`Alert::sent_at`]
    pub sent: String,
    pub status: String,
    pub msg_type: String,
    pub source: String,
    pub scope: String,
    pub restriction: String,
    pub addresses: String,
    /// Special handling code
    pub code: String,
    pub note: String,
    pub references: Vec<String>,
    pub incidents: Vec<String>,
    pub infos: Vec<Info>,
}

impl Alert {
    pub fn status_kind(&self) -> Option<Status> {
        self.status.parse().ok()
    }

    pub fn msg_type_kind(&self) -> Option<MsgType> {
        self.msg_type.parse().ok()
    }

    pub fn scope_kind(&self) -> Option<Scope> {
        self.scope.parse().ok()
    }

    pub fn sent_at(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        parse_cap_timestamp(&self.sent)
    }
}

/// One rendering of an alert for a particular language and event.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub language: String,
    pub category: String,
    pub event: String,
    pub response_type: String,
    pub urgency: String,
    pub severity: String,
    pub certainty: String,
    pub audience: String,
    pub event_codes: NamedValues,
    pub effective: String,
    pub onset: String,
    pub expires: String,
    pub sender_name: String,
    pub headline: String,
    pub description: String,
    pub instruction: String,
    pub web: String,
    pub contact: String,
    pub parameters: NamedValues,
    pub areas: Vec<Area>,
    pub resources: Vec<Resource>,
}

impl Info {
    /// The value of the first parameter named `name`.
    ///
    /// NWS alerts carry `VTEC`, `UGC`, `WMOHEADER` and similar parameters here.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.first(name)
    }

    pub fn parameter_all(&self, name: &str) -> Vec<&str> {
        self.parameters.all(name)
    }

    pub fn add_parameter<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.parameters.add(name, value);
    }

    pub fn event_code(&self, name: &str) -> Option<&str> {
        self.event_codes.first(name)
    }

    pub fn add_event_code<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.event_codes.add(name, value);
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

    pub fn effective_at(&self) -> Result<Option<DateTime<FixedOffset>>, chrono::ParseError> {
        parse_optional(&self.effective)
    }

    pub fn onset_at(&self) -> Result<Option<DateTime<FixedOffset>>, chrono::ParseError> {
        parse_optional(&self.onset)
    }

    pub fn expires_at(&self) -> Result<Option<DateTime<FixedOffset>>, chrono::ParseError> {
        parse_optional(&self.expires)
    }
}

/// A geographic area to which an [`Info`] applies.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    /// Free text; NWS joins county names with `"; "`
    pub description: String,
    /// Space-separated `lat,lon` pairs, first and last equal
    pub polygon: String,
    pub circle: String,
    pub geocodes: NamedValues,
    /// Bare text found in a `<geocode>` element that has no `valueName`/`value` children, kept
    /// verbatim.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub geocode_text: String,
    pub altitude: String,
    pub ceiling: String,
}

impl Area {
    pub fn add_geocode<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.geocodes.add(name, value);
    }
}

impl Geocodes for Area {
    fn geocode(&self, name: &str) -> Option<&str> {
        self.geocodes.first(name)
    }

    fn geocode_all(&self, name: &str) -> Vec<&str> {
        self.geocodes.all(name)
    }
}

/// A supplemental file referenced by an [`Info`].
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub description: String,
    pub mime_type: String,
    /// Size in bytes, as sent
    pub size: String,
    pub uri: String,
    /// Base64 content embedded in the message
    pub deref_uri: String,
    /// SHA-1 of the resource
    pub digest: String,
}

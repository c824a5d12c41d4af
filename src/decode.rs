//! Decoding of CAP alert documents and the NWS Atom feed.
//!
//! Every entry point takes a complete document and returns an owned value graph, or an error and
//! nothing else. Decoding is purely structural: a well-formed document missing CAP-required
//! fields still decodes, with those fields left empty.

use crate::{Alert, Area, AtomEntry, AtomFeed, AtomGeocode, Author, Info, Link, NamedValue};
use crate::{NamedValues, Resource};

mod tree;
use tree::Element;

pub const CAP_11_NAMESPACE: &str = "urn:oasis:names:tc:emergency:cap:1.1";
pub const CAP_12_NAMESPACE: &str = "urn:oasis:names:tc:emergency:cap:1.2";
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

const CAP_NAMESPACES: &[&str] = &[CAP_11_NAMESPACE, CAP_12_NAMESPACE];
const ATOM_NAMESPACES: &[&str] = &[ATOM_NAMESPACE];

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// The input is not well-formed XML.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The input is well-formed but its root element is not the one being decoded.
    #[error("expected {expected}, found {found}")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },
}

impl From<quick_xml::Error> for DecodeError {
    fn from(e: quick_xml::Error) -> Self {
        DecodeError::Malformed(e.to_string())
    }
}

/// The CAP schema a document declares. Only the decoder sees this; both map onto [`Alert`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Schema {
    Cap11,
    Cap12,
}

impl Schema {
    fn of(root: &Element) -> Option<Self> {
        if root.name != "alert" {
            return None;
        }
        match root.namespace.as_deref() {
            Some(CAP_11_NAMESPACE) => Some(Schema::Cap11),
            Some(CAP_12_NAMESPACE) => Some(Schema::Cap12),
            _ => None,
        }
    }

    fn namespace(self) -> &'static str {
        match self {
            Schema::Cap11 => CAP_11_NAMESPACE,
            Schema::Cap12 => CAP_12_NAMESPACE,
        }
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Schema::Cap11 => f.write_str("CAP 1.1"),
            Schema::Cap12 => f.write_str("CAP 1.2"),
        }
    }
}

/// Decode a CAP 1.1 or CAP 1.2 alert, whichever the document declares.
pub fn decode_alert(input: &[u8]) -> Result<Alert, DecodeError> {
    decode_alert_as(input, None)
}

/// Decode an alert that must be in the CAP 1.1 namespace.
pub fn decode_alert_11(input: &[u8]) -> Result<Alert, DecodeError> {
    decode_alert_as(input, Some(Schema::Cap11))
}

/// Decode an alert that must be in the CAP 1.2 namespace.
pub fn decode_alert_12(input: &[u8]) -> Result<Alert, DecodeError> {
    decode_alert_as(input, Some(Schema::Cap12))
}

fn decode_alert_as(input: &[u8], required: Option<Schema>) -> Result<Alert, DecodeError> {
    let root = tree::parse(input)?;

    let schema = match (Schema::of(&root), required) {
        (Some(found), None) => found,
        (Some(found), Some(required)) if found == required => found,
        (_, required) => {
            return Err(DecodeError::UnexpectedRoot {
                expected: match required {
                    None => "a CAP 1.1 or 1.2 <alert>",
                    Some(Schema::Cap11) => "a CAP 1.1 <alert>",
                    Some(Schema::Cap12) => "a CAP 1.2 <alert>",
                },
                found: describe(&root),
            })
        }
    };

    let alert = alert(&root, &[schema.namespace()]);
    log::debug!("decoded {} alert {:?}", schema, alert.identifier);
    Ok(alert)
}

/// Decode an NWS Atom feed.
pub fn decode_atom_feed(input: &[u8]) -> Result<AtomFeed, DecodeError> {
    let root = tree::parse(input)?;

    if root.name != "feed" || root.namespace.as_deref() != Some(ATOM_NAMESPACE) {
        return Err(DecodeError::UnexpectedRoot {
            expected: "an Atom <feed>",
            found: describe(&root),
        });
    }

    let feed = feed(&root);
    log::debug!("decoded feed {:?} with {} entries", feed.id, feed.entries.len());
    Ok(feed)
}

fn describe(root: &Element) -> String {
    match &root.namespace {
        Some(ns) => format!("<{}> in namespace {}", root.name, ns),
        None => format!("<{}> without a namespace", root.name),
    }
}

fn alert(el: &Element, ns: &[&str]) -> Alert {
    Alert {
        identifier: el.child_text_in(ns, "identifier"),
        sender: el.child_text_in(ns, "sender"),
        sent: el.child_text_in(ns, "sent"),
        status: el.child_text_in(ns, "status"),
        msg_type: el.child_text_in(ns, "msgType"),
        source: el.child_text_in(ns, "source"),
        scope: el.child_text_in(ns, "scope"),
        restriction: el.child_text_in(ns, "restriction"),
        addresses: el.child_text_in(ns, "addresses"),
        code: el.child_text_in(ns, "code"),
        note: el.child_text_in(ns, "note"),
        references: el.children_text_in(ns, "references"),
        incidents: el.children_text_in(ns, "incidents"),
        infos: el.children_in(ns, "info").map(|i| info(i, ns)).collect(),
    }
}

fn info(el: &Element, ns: &[&str]) -> Info {
    Info {
        language: el.child_text_in(ns, "language"),
        category: el.child_text_in(ns, "category"),
        event: el.child_text_in(ns, "event"),
        response_type: el.child_text_in(ns, "responseType"),
        urgency: el.child_text_in(ns, "urgency"),
        severity: el.child_text_in(ns, "severity"),
        certainty: el.child_text_in(ns, "certainty"),
        audience: el.child_text_in(ns, "audience"),
        event_codes: named_values(el.children_in(ns, "eventCode"), ns),
        effective: el.child_text_in(ns, "effective"),
        onset: el.child_text_in(ns, "onset"),
        expires: el.child_text_in(ns, "expires"),
        sender_name: el.child_text_in(ns, "senderName"),
        headline: el.child_text_in(ns, "headline"),
        description: el.child_text_in(ns, "description"),
        instruction: el.child_text_in(ns, "instruction"),
        web: el.child_text_in(ns, "web"),
        contact: el.child_text_in(ns, "contact"),
        parameters: named_values(el.children_in(ns, "parameter"), ns),
        areas: el.children_in(ns, "area").map(|a| area(a, ns)).collect(),
        resources: el.children_in(ns, "resource").map(|r| resource(r, ns)).collect(),
    }
}

fn area(el: &Element, ns: &[&str]) -> Area {
    let mut area = Area {
        description: el.child_text_in(ns, "areaDesc"),
        polygon: el.child_text_in(ns, "polygon"),
        circle: el.child_text_in(ns, "circle"),
        altitude: el.child_text_in(ns, "altitude"),
        ceiling: el.child_text_in(ns, "ceiling"),
        ..Area::default()
    };

    for geocode in el.children_in(ns, "geocode") {
        if geocode.children_in(ns, "valueName").next().is_some()
            || geocode.children_in(ns, "value").next().is_some()
        {
            area.geocodes.push(named_value(geocode, ns));
        } else if area.geocode_text.is_empty() {
            // legacy flat form
            area.geocode_text = geocode.text.clone();
        }
    }

    area
}

fn resource(el: &Element, ns: &[&str]) -> Resource {
    Resource {
        description: el.child_text_in(ns, "resourceDesc"),
        mime_type: el.child_text_in(ns, "mimeType"),
        size: el.child_text_in(ns, "size"),
        uri: el.child_text_in(ns, "uri"),
        deref_uri: el.child_text_in(ns, "derefUri"),
        digest: el.child_text_in(ns, "digest"),
    }
}

fn named_value(el: &Element, ns: &[&str]) -> NamedValue {
    NamedValue::new(
        el.child_text_in(ns, "valueName"),
        el.child_text_in(ns, "value"),
    )
}

fn named_values<'a, I: Iterator<Item = &'a Element>>(elements: I, ns: &[&str]) -> NamedValues {
    elements.map(|e| named_value(e, ns)).collect()
}

fn feed(el: &Element) -> AtomFeed {
    AtomFeed {
        id: el.child_text_in(ATOM_NAMESPACES, "id"),
        logo: el.child_text_in(ATOM_NAMESPACES, "logo"),
        generator: el.child_text_in(ATOM_NAMESPACES, "generator"),
        updated: el.child_text_in(ATOM_NAMESPACES, "updated"),
        author: author(el),
        title: el.child_text_in(ATOM_NAMESPACES, "title"),
        links: links(el),
        entries: el
            .children_in(ATOM_NAMESPACES, "entry")
            .map(entry)
            .collect(),
    }
}

fn entry(el: &Element) -> AtomEntry {
    AtomEntry {
        id: el.child_text_in(ATOM_NAMESPACES, "id"),
        updated: el.child_text_in(ATOM_NAMESPACES, "updated"),
        published: el.child_text_in(ATOM_NAMESPACES, "published"),
        author: author(el),
        title: el.child_text_in(ATOM_NAMESPACES, "title"),
        links: links(el),
        summary: el.child_text_in(ATOM_NAMESPACES, "summary"),
        event: el.child_text_in(CAP_NAMESPACES, "event"),
        effective: el.child_text_in(CAP_NAMESPACES, "effective"),
        expires: el.child_text_in(CAP_NAMESPACES, "expires"),
        status: el.child_text_in(CAP_NAMESPACES, "status"),
        msg_type: el.child_text_in(CAP_NAMESPACES, "msgType"),
        category: el.child_text_in(CAP_NAMESPACES, "category"),
        urgency: el.child_text_in(CAP_NAMESPACES, "urgency"),
        severity: el.child_text_in(CAP_NAMESPACES, "severity"),
        certainty: el.child_text_in(CAP_NAMESPACES, "certainty"),
        area_desc: el.child_text_in(CAP_NAMESPACES, "areaDesc"),
        polygon: el.child_text_in(CAP_NAMESPACES, "polygon"),
        circle: el.child_text_in(CAP_NAMESPACES, "circle"),
        geocode: el
            .children_in(CAP_NAMESPACES, "geocode")
            .next()
            .map(|g| AtomGeocode {
                names: g.children_text("valueName"),
                values: g.children_text("value"),
            })
            .unwrap_or_default(),
        // NWS leaves valueName/value unprefixed inside the cap: elements
        parameters: el
            .children_in(CAP_NAMESPACES, "parameter")
            .map(|p| NamedValue::new(p.child_text("valueName"), p.child_text("value")))
            .collect(),
    }
}

fn author(el: &Element) -> Author {
    Author {
        name: el
            .children_in(ATOM_NAMESPACES, "author")
            .next()
            .map(|a| a.child_text_in(ATOM_NAMESPACES, "name"))
            .unwrap_or_default(),
    }
}

fn links(el: &Element) -> Vec<Link> {
    el.children_in(ATOM_NAMESPACES, "link")
        .map(|l| Link {
            rel: l.attribute("rel"),
            href: l.attribute("href"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Geocodes;

    const MINIMAL_12: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
  <identifier>KSTO1055887203</identifier>
  <sender>KSTO@NWS.NOAA.GOV</sender>
  <sent>2003-06-17T14:57:00-07:00</sent>
  <status>Actual</status>
  <msgType>Alert</msgType>
  <scope>Public</scope>
  <info>
    <category>Met</category>
    <event>SEVERE THUNDERSTORM</event>
    <urgency>Immediate</urgency>
    <severity>Severe</severity>
    <certainty>Observed</certainty>
    <eventCode><valueName>SAME</valueName><value>SVR</value></eventCode>
    <expires>2003-06-17T16:00:00-07:00</expires>
    <onset>2003-06-17T15:00:00-07:00</onset>
    <area>
      <areaDesc>EXTREME NORTH CENTRAL TUOLUMNE COUNTY</areaDesc>
      <polygon>38.47,-120.14 38.34,-119.95 38.52,-119.74 38.62,-119.89 38.47,-120.14</polygon>
      <geocode><valueName>SAME</valueName><value>006109</value></geocode>
      <geocode><valueName>SAME</valueName><value>006009</value></geocode>
    </area>
  </info>
</alert>"#;

    #[test]
    fn decodes_either_schema() {
        let alert = decode_alert(MINIMAL_12.as_bytes()).unwrap();
        assert_eq!(alert.identifier, "KSTO1055887203");
        assert_eq!(alert.infos.len(), 1);

        let info = &alert.infos[0];
        assert_eq!(info.event_code("SAME"), Some("SVR"));
        assert_eq!(info.onset, "2003-06-17T15:00:00-07:00");
        assert_eq!(info.expires, "2003-06-17T16:00:00-07:00");
        assert_eq!(
            info.areas[0].geocode_all("SAME"),
            vec!["006109", "006009"]
        );

        let as_11 = MINIMAL_12.replace(CAP_12_NAMESPACE, CAP_11_NAMESPACE);
        assert_eq!(decode_alert(as_11.as_bytes()).unwrap(), alert);
    }

    #[test]
    fn pinned_schema_must_match() {
        assert!(decode_alert_12(MINIMAL_12.as_bytes()).is_ok());
        match decode_alert_11(MINIMAL_12.as_bytes()) {
            Err(DecodeError::UnexpectedRoot { expected, found }) => {
                assert_eq!(expected, "a CAP 1.1 <alert>");
                assert!(found.contains(CAP_12_NAMESPACE), "{}", found);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_namespace() {
        let doc = MINIMAL_12.replace(CAP_12_NAMESPACE, "urn:example:not-cap");
        assert!(matches!(
            decode_alert(doc.as_bytes()),
            Err(DecodeError::UnexpectedRoot { .. })
        ));
        assert!(matches!(
            decode_alert(b"<alert/>"),
            Err(DecodeError::UnexpectedRoot { .. })
        ));
    }

    #[test]
    fn missing_fields_are_empty() {
        let alert = decode_alert(
            br#"<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2"><info><area/></info></alert>"#,
        )
        .unwrap();
        assert_eq!(alert.identifier, "");
        assert!(alert.references.is_empty());
        assert_eq!(alert.infos[0].parameter("VTEC"), None);
        assert!(alert.infos[0].areas[0].geocodes.is_empty());
    }

    #[test]
    fn legacy_flat_geocode() {
        let alert = decode_alert(
            br#"<alert xmlns="urn:oasis:names:tc:emergency:cap:1.1"><info><area>
                <areaDesc>Jackson</areaDesc><geocode>005067</geocode>
            </area></info></alert>"#,
        )
        .unwrap();
        let area = &alert.infos[0].areas[0];
        assert_eq!(area.geocode_text, "005067");
        assert!(area.geocodes.is_empty());
    }

    #[test]
    fn repeated_elements_keep_order() {
        let alert = decode_alert(
            br#"<cap:alert xmlns:cap="urn:oasis:names:tc:emergency:cap:1.2">
                <cap:references>a,1,2003-06-17T14:57:00-07:00</cap:references>
                <cap:references>b,2,2003-06-17T14:58:00-07:00</cap:references>
                <cap:info><cap:language>en-US</cap:language></cap:info>
                <cap:info><cap:language>es-US</cap:language></cap:info>
            </cap:alert>"#,
        )
        .unwrap();
        assert_eq!(alert.references.len(), 2);
        assert!(alert.references[1].starts_with("b,"));
        let languages: Vec<_> = alert.infos.iter().map(|i| i.language.as_str()).collect();
        assert_eq!(languages, vec!["en-US", "es-US"]);
    }

    #[test]
    fn extension_elements_are_ignored() {
        let alert = decode_alert(
            br#"<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2" xmlns:ext="urn:example:ext">
                <ext:identifier>shadow</ext:identifier>
                <identifier>KSTO1055887203</identifier>
                <ext:info><language>xx</language></ext:info>
                <info>
                    <ext:event>shadow</ext:event>
                    <event>SEVERE THUNDERSTORM</event>
                    <parameter><ext:valueName>x</ext:valueName><valueName>VTEC</valueName><value>/O.NEW/</value></parameter>
                    <area><ext:geocode>999999</ext:geocode><geocode><valueName>SAME</valueName><value>006109</value></geocode></area>
                </info>
            </alert>"#,
        )
        .unwrap();
        assert_eq!(alert.identifier, "KSTO1055887203");
        assert_eq!(alert.infos.len(), 1);

        let info = &alert.infos[0];
        assert_eq!(info.event, "SEVERE THUNDERSTORM");
        assert_eq!(info.parameter("VTEC"), Some("/O.NEW/"));
        assert_eq!(info.areas[0].geocode("SAME"), Some("006109"));
        assert_eq!(info.areas[0].geocode_text, "");
    }

    #[test]
    fn nesting_too_deep() {
        let mut doc = String::from(r#"<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2"><note>"#);
        doc.push_str(&"<a>".repeat(300_000));
        doc.push_str(&"</a>".repeat(300_000));
        doc.push_str("</note></alert>");
        assert!(doc.len() < 5 * 1024 * 1024);

        assert_eq!(
            decode_alert(doc.as_bytes()),
            Err(DecodeError::Malformed("nesting too deep".to_string()))
        );
    }

    #[test]
    fn invalid_xml() {
        for decode in [decode_alert, decode_alert_11, decode_alert_12] {
            assert!(matches!(
                decode(b"invalid xml"),
                Err(DecodeError::Malformed(_))
            ));
        }
        assert!(matches!(
            decode_atom_feed(b"invalid xml"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn feed_root_is_checked() {
        assert!(matches!(
            decode_atom_feed(MINIMAL_12.as_bytes()),
            Err(DecodeError::UnexpectedRoot { .. })
        ));
        let empty = decode_atom_feed(br#"<feed xmlns="http://www.w3.org/2005/Atom"/>"#).unwrap();
        assert_eq!(empty, AtomFeed::default());
    }

    #[test]
    fn entry_cap_fields_need_cap_namespace() {
        let feed = decode_atom_feed(
            br#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:cap="urn:oasis:names:tc:emergency:cap:1.1">
                <entry>
                    <event>not CAP</event>
                    <cap:severity>Minor</cap:severity>
                    <cap:geocode>
                        <valueName>UGC</valueName><value>ARZ001 ARZ002</value>
                    </cap:geocode>
                </entry>
            </feed>"#,
        )
        .unwrap();
        let entry = &feed.entries[0];
        assert_eq!(entry.event, "");
        assert_eq!(entry.severity, "Minor");
        assert_eq!(entry.geocode.values_for("UGC"), vec!["ARZ001", "ARZ002"]);
    }
}

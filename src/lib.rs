//! Typed access to Common Alerting Protocol (CAP) alerts and the National Weather Service's Atom
//! feed of them.
//!
//! ```
//! use cap_feed::Geocodes;
//!
//! let alert = cap_feed::decode_alert(br#"
//!     <alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
//!       <identifier>KSTO1055887203</identifier>
//!       <info>
//!         <severity>Severe</severity>
//!         <parameter><valueName>VTEC</valueName><value>/O.NEW.KSTO.SV.W.0042/</value></parameter>
//!         <area>
//!           <areaDesc>Tuolumne</areaDesc>
//!           <geocode><valueName>SAME</valueName><value>006109</value></geocode>
//!         </area>
//!       </info>
//!     </alert>"#).unwrap();
//!
//! let info = &alert.infos[0];
//! assert_eq!(info.severity_level(), Some(cap_feed::kinds::Severity::Severe));
//! assert_eq!(info.parameter("VTEC"), Some("/O.NEW.KSTO.SV.W.0042/"));
//! assert_eq!(info.areas[0].geocode("SAME"), Some("006109"));
//! ```

mod named_values;
pub use named_values::{NamedValue, NamedValues};

mod geocode;
pub use geocode::Geocodes;

mod alert;
pub use alert::{Alert, Area, Info, Resource};

mod atom;
pub use atom::{AtomEntry, AtomFeed, AtomGeocode, Author, Link, NWS_IDENTIFIER_PREFIX};

pub mod kinds;

mod timestamp;
pub use timestamp::parse_cap_timestamp;

pub mod decode;
pub use decode::{decode_alert, decode_alert_11, decode_alert_12, decode_atom_feed, DecodeError};

mod filters;
pub use filters::{Filter, FilterItem};

#[cfg(feature = "client")]
pub mod client;

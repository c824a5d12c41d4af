//! Typed views of the CAP code lists.
//!
//! Decoded documents keep these fields as the strings the producer sent. The enums here are parsed
//! on demand by accessors such as [`crate::Info::severity_level`], which return `None` for values
//! outside the code list.

use serde::{Deserialize, Serialize};

/// A string that is not a member of the CAP code list it was parsed against.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("unrecognized {kind} value {value:?}")]
pub struct UnknownKind {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! cap_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// The spelling used on the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownKind;

            fn from_str(s: &str) -> Result<Self, UnknownKind> {
                match s.trim() {
                    $($text $(| $alias)* => Ok($name::$variant),)+
                    other => Err(UnknownKind {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                v.as_str().to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownKind;

            fn try_from(s: String) -> Result<Self, UnknownKind> {
                s.parse()
            }
        }
    };
}

cap_enum! {
    /// The appropriate handling of an alert message.
    Status {
        Actual => "Actual",
        Exercise => "Exercise",
        System => "System",
        Test => "Test",
        Draft => "Draft",
    }
}

cap_enum! {
    /// The nature of an alert message.
    MsgType {
        Alert => "Alert",
        Update => "Update",
        Cancel => "Cancel",
        Ack => "Ack",
        Error => "Error",
    }
}

cap_enum! {
    /// The intended distribution of an alert message.
    Scope {
        Public => "Public",
        Restricted => "Restricted",
        Private => "Private",
    }
}

cap_enum! {
    Category {
        Geo => "Geo",
        Met => "Met",
        Safety => "Safety",
        Security => "Security",
        Rescue => "Rescue",
        Fire => "Fire",
        Health => "Health",
        Env => "Env",
        Transport => "Transport",
        Infra => "Infra",
        Cbrne => "CBRNE",
        Other => "Other",
    }
}

cap_enum! {
    Urgency {
        Immediate => "Immediate",
        Expected => "Expected",
        Future => "Future",
        Past => "Past",
        Unknown => "Unknown",
    }
}

cap_enum! {
    Severity {
        Extreme => "Extreme",
        Severe => "Severe",
        Moderate => "Moderate",
        Minor => "Minor",
        Unknown => "Unknown",
    }
}

cap_enum! {
    /// CAP 1.1 producers may still send the deprecated "Very Likely", which reads as `Likely`.
    Certainty {
        Observed => "Observed",
        Likely => "Likely" | "Very Likely",
        Possible => "Possible",
        Unlikely => "Unlikely",
        Unknown => "Unknown",
    }
}

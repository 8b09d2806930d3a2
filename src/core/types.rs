use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::validation::normalize_id;

/// Which ledger a line comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Bank statement line
    Bank,
    /// General-ledger posting
    Gl,
}

impl Side {
    /// Parse the `kind` value used in `already_matched` responses
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "bank" => Some(Self::Bank),
            "gl" => Some(Self::Gl),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bank => write!(f, "bank"),
            Self::Gl => write!(f, "gl"),
        }
    }
}

/// Interpret a JSON scalar as an identifier.
///
/// Servers send ids as integers in some payloads and as strings in others; both
/// forms of the same id must collapse to one key.
fn id_from_json(value: &serde_json::Value) -> Option<String> {
    let raw = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
        _ => return None,
    };
    normalize_id(&raw).ok()
}

fn serialize_id<S: Serializer>(id: &str, serializer: S) -> Result<S::Ok, S::Error> {
    // Only canonical integers go out as numbers, so "007" keeps its spelling
    match id.parse::<i64>() {
        Ok(n) if n.to_string() == id => serializer.serialize_i64(n),
        _ => serializer.serialize_str(id),
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    id_from_json(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid identifier: {value}")))
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Build from a JSON string or integer, `None` if it is neither
            /// or fails validation
            pub fn from_json(value: &serde_json::Value) -> Option<Self> {
                id_from_json(value).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serialize_id(&self.0, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserialize_id(deserializer).map(Self)
            }
        }
    };
}

string_id!(
    /// Server-assigned line identifier, always keyed as a string
    LineId
);

string_id!(
    /// Server-assigned match group identifier
    MatchId
);

/// A rendered line: the ledger it belongs to plus its id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineRef {
    pub side: Side,
    pub id: LineId,
}

impl LineRef {
    pub fn new(side: Side, id: impl Into<LineId>) -> Self {
        Self {
            side,
            id: id.into(),
        }
    }

    pub fn bank(id: impl Into<LineId>) -> Self {
        Self::new(Side::Bank, id)
    }

    pub fn gl(id: impl Into<LineId>) -> Self {
        Self::new(Side::Gl, id)
    }
}

impl std::fmt::Display for LineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.side, self.id)
    }
}

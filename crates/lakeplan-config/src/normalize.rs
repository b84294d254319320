//! Lenient scalar decoding for stored records
//!
//! Stores hand back numbers as numbers, decimals or numeric strings and flags
//! as booleans or strings.

use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseInteger {
    Int(u64),
    Float(f64),
    Text(String),
}

/// Decode a non-negative integer from a number or numeric string
pub(crate) fn integer<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = match LooseInteger::deserialize(deserializer)? {
        LooseInteger::Int(n) => n,
        LooseInteger::Float(f) if f.fract() == 0.0 && f >= 0.0 => {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = f as u64;
            n
        }
        LooseInteger::Float(f) => {
            return Err(D::Error::custom(format!("expected an integer, got {f}")));
        }
        LooseInteger::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("expected an integer, got '{s}'")))?,
    };
    u32::try_from(raw).map_err(|_| D::Error::custom(format!("integer {raw} out of range")))
}

/// Flag stored as a boolean or `"true"`/`"false"`, emitted as a string
pub(crate) mod flag {
    use super::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LooseFlag {
        Bool(bool),
        Text(String),
    }

    pub(crate) fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        match LooseFlag::deserialize(deserializer)? {
            LooseFlag::Bool(b) => Ok(b),
            LooseFlag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(D::Error::custom(format!("expected a boolean flag, got '{s}'"))),
            },
        }
    }
}

/// Only a literal JSON `true` enables a table
pub(crate) fn strictly_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

/// Render a scalar override value the way the engine CLI expects it
#[must_use]
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

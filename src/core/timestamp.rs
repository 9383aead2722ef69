//! Fixed-width RFC 3339 timestamps
//!
//! Stored timestamps are strings, and backends sort them as strings. Every
//! timestamp is therefore written with exactly nine fraction digits so that
//! lexical order matches chronological order.
//!
//! ```rust,ignore
//! #[serde(with = "crate::core::timestamp")]
//! pub created_at: DateTime<Utc>,
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub fn format(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(at))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    DateTime::<Utc>::deserialize(deserializer)
}

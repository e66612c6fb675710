// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Timestamps as reported by the service. Values are normally RFC 3339, but
//! older records carry no offset at all; those are read as UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone as _, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

use crate::error;

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub(crate) fn parse(value: &str) -> Result<DateTime<Utc>, error::Conversion> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, NAIVE_FORMAT)
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
        .map_err(|_| error::Conversion::Timestamp(value.to_owned()))
}

pub(crate) fn serialize<S: Serializer>(
    value: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339())
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let value = String::deserialize(deserializer)?;
    parse(&value).map_err(de::Error::custom)
}

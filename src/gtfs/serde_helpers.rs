use chrono::NaiveDate;
use serde::de::{self, Deserialize, Deserializer};

use super::FeedError;

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&s, "%Y%m%d").map_err(de::Error::custom)
}

pub fn deserialize_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.as_str() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(de::Error::custom(format!("invalid boolean value: {other}"))),
    }
}

/// Parses `H:MM:SS` or `HH:MM:SS` into seconds. Hours past 23 are valid.
pub fn parse_time(s: &str) -> Result<u32, FeedError> {
    let invalid = || FeedError::InvalidTime(s.to_owned());
    let mut parts = s.split(':');
    let (Some(h), Some(m), Some(sec), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    if h.is_empty() || h.len() > 3 || m.len() != 2 || sec.len() != 2 {
        return Err(invalid());
    }
    let hours: u32 = h.parse().map_err(|_| invalid())?;
    let minutes: u32 = m.parse().map_err(|_| invalid())?;
    let seconds: u32 = sec.parse().map_err(|_| invalid())?;
    if minutes > 59 || seconds > 59 {
        return Err(invalid());
    }
    Ok(hours * 3600 + minutes * 60 + seconds)
}

pub fn deserialize_time<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_time(&s).map_err(de::Error::custom)
}

pub fn deserialize_optional_time<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(t) if t.is_empty() => Ok(None),
        Some(t) => parse_time(&t).map(Some).map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("06:30:15").unwrap(), 6 * 3600 + 30 * 60 + 15);
        assert_eq!(parse_time("6:30:15").unwrap(), 6 * 3600 + 30 * 60 + 15);
        assert_eq!(parse_time("25:00:00").unwrap(), 25 * 3600);
    }

    #[test]
    fn test_parse_invalid_time() {
        for s in ["", "06:30", "06:60:00", "aa:bb:cc", "06:30:15:00", "6:3:15"] {
            assert!(matches!(parse_time(s), Err(FeedError::InvalidTime(_))), "{s}");
        }
    }
}

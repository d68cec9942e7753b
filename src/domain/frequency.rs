use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Recurrence vocabulary understood by the schedule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Frequency {
    #[default]
    Monthly,
    Yearly,
    Weekly,
    BiWeekly,
    Custom,
    OneTime,
    /// Any stored value outside the vocabulary. Never applies.
    Unrecognized,
}

impl Frequency {
    /// Normalizes a stored frequency value. Matching ignores case and the
    /// separator used between words; unknown values map to `Unrecognized`.
    pub fn parse_lenient(value: &str) -> Frequency {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "monthly" => Frequency::Monthly,
            "yearly" | "annually" | "annual" => Frequency::Yearly,
            "weekly" => Frequency::Weekly,
            "biweekly" | "fortnightly" => Frequency::BiWeekly,
            "custom" => Frequency::Custom,
            "onetime" | "once" => Frequency::OneTime,
            _ => Frequency::Unrecognized,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
            Frequency::Weekly => "weekly",
            Frequency::BiWeekly => "bi-weekly",
            Frequency::Custom => "custom",
            Frequency::OneTime => "one-time",
            Frequency::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Frequency::parse_lenient(value))
    }
}

impl Serialize for Frequency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Frequency::parse_lenient(&value))
    }
}

/// Calendar months on which a `custom` item lands.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "months", rename_all = "lowercase")]
pub enum CustomMonths {
    #[default]
    Unset,
    Months(BTreeSet<u32>),
    /// The stored payload could not be read; the item never lands.
    Malformed,
}

impl CustomMonths {
    /// Builds a validated set: values must be unique and within 1..=12.
    pub fn from_values<I>(values: I) -> CustomMonths
    where
        I: IntoIterator<Item = i64>,
    {
        let mut months = BTreeSet::new();
        for value in values {
            if !(1..=12).contains(&value) || !months.insert(value as u32) {
                return CustomMonths::Malformed;
            }
        }
        CustomMonths::Months(months)
    }

    /// Parses the JSON array stored alongside an item, e.g. `"[3, 9]"`.
    /// Empty or whitespace-only text means the field was never set.
    pub fn from_json(raw: &str) -> CustomMonths {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return CustomMonths::Unset;
        }
        match serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
            Ok(values) => {
                let mut numbers = Vec::with_capacity(values.len());
                for value in values {
                    match month_number(&value) {
                        Some(number) => numbers.push(number),
                        None => return CustomMonths::Malformed,
                    }
                }
                CustomMonths::from_values(numbers)
            }
            Err(_) => CustomMonths::Malformed,
        }
    }

    pub fn contains(&self, month: u32) -> bool {
        match self {
            CustomMonths::Months(months) => months.contains(&month),
            CustomMonths::Unset | CustomMonths::Malformed => false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, CustomMonths::Malformed)
    }
}

// Stored arrays hold either numbers or numeric strings.
fn month_number(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number.as_i64(),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_and_separator_insensitive() {
        assert_eq!(Frequency::parse_lenient("Monthly"), Frequency::Monthly);
        assert_eq!(Frequency::parse_lenient("BI-WEEKLY"), Frequency::BiWeekly);
        assert_eq!(Frequency::parse_lenient("biweekly"), Frequency::BiWeekly);
        assert_eq!(Frequency::parse_lenient("one_time"), Frequency::OneTime);
        assert_eq!(Frequency::parse_lenient(" One-Time "), Frequency::OneTime);
        assert_eq!(Frequency::parse_lenient("hourly"), Frequency::Unrecognized);
    }

    #[test]
    fn serializes_with_canonical_names() {
        let json = serde_json::to_string(&Frequency::BiWeekly).unwrap();
        assert_eq!(json, "\"bi-weekly\"");
        let parsed: Frequency = serde_json::from_str("\"YEARLY\"").unwrap();
        assert_eq!(parsed, Frequency::Yearly);
    }

    #[test]
    fn custom_months_accept_numbers_and_numeric_strings() {
        let months = CustomMonths::from_json("[3, \"9\", 12]");
        assert!(months.contains(3));
        assert!(months.contains(9));
        assert!(months.contains(12));
        assert!(!months.contains(4));
    }

    #[test]
    fn custom_months_reject_bad_payloads() {
        assert_eq!(CustomMonths::from_json("[3, 9"), CustomMonths::Malformed);
        assert_eq!(CustomMonths::from_json("[0]"), CustomMonths::Malformed);
        assert_eq!(CustomMonths::from_json("[13]"), CustomMonths::Malformed);
        assert_eq!(CustomMonths::from_json("[4, 4]"), CustomMonths::Malformed);
        assert_eq!(CustomMonths::from_json("{\"a\":1}"), CustomMonths::Malformed);
        assert_eq!(CustomMonths::from_json("[\"march\"]"), CustomMonths::Malformed);
        assert_eq!(CustomMonths::from_json("  "), CustomMonths::Unset);
    }
}

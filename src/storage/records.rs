//! Stored item records as the CRUD layer writes them, and their conversion to typed items.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    CustomMonths, FinancialItem, Frequency, FutureMilestone, Granularity, IncomeDetails,
    IncomePeriod, InvestmentDetails, ItemKind, PastIncomeEntry, RecordDefect, YearMonth,
};

/// A stored scalar: the typed value when it reads cleanly, otherwise the raw JSON so
/// the problem can be reported against its record instead of failing the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Stored<T> {
    Value(T),
    Unreadable(Value),
}

impl<T> From<T> for Stored<T> {
    fn from(value: T) -> Self {
        Stored::Value(value)
    }
}

impl<T: Serialize> Serialize for Stored<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Stored::Value(value) => value.serialize(serializer),
            Stored::Unreadable(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Stored<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(match T::deserialize(&raw) {
            Ok(value) => Stored::Value(value),
            Err(_) => Stored::Unreadable(raw),
        })
    }
}

/// One stored record. Nested payloads arrive as JSON text (`"[3, 9]"`), though
/// already-decoded arrays are accepted too. Every field tolerates `null` and values
/// of the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFinancialItem {
    pub id: Option<Stored<String>>,
    pub name: Option<Stored<String>>,
    pub category: Option<Stored<String>>,
    pub amount: Option<Stored<Decimal>>,
    pub frequency: Option<Stored<String>>,
    pub custom_months: Option<Value>,
    pub start_date: Option<Stored<String>>,
    pub end_date: Option<Stored<String>>,
    pub is_active: Option<Stored<bool>>,
    pub subject_to_cpf: Option<Stored<bool>>,
    pub employee_cpf_contribution: Option<Stored<Decimal>>,
    pub past_income_history: Option<Value>,
    pub future_milestones: Option<Value>,
    pub account_for_future_change: Option<Stored<bool>>,
    pub current_capital: Option<Stored<Decimal>>,
    pub projected_yield: Option<Stored<Decimal>>,
    pub contribution_amount: Option<Stored<Decimal>>,
    pub contribution_frequency: Option<Stored<String>>,
    /// Set when the stored entry was not a JSON object at all.
    #[serde(skip)]
    pub unreadable: bool,
}

#[derive(Debug, Deserialize)]
struct RawHistoryEntry {
    period: Value,
    granularity: String,
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMilestone {
    target_month: String,
    amount: Decimal,
}

/// Reads a stored item list one record at a time, so a corrupt entry degrades only
/// itself. `null` or a non-list reads as empty.
pub(crate) fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<RawFinancialItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(found = %other, "item list is not an array; reading it as empty");
            Vec::new()
        }
    };
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| RawFinancialItem::from_value(entry, index))
        .collect())
}

impl RawFinancialItem {
    pub fn new(name: impl Into<String>, amount: Decimal, frequency: impl Into<String>) -> Self {
        Self {
            name: Some(Stored::Value(name.into())),
            amount: Some(Stored::Value(amount)),
            frequency: Some(Stored::Value(frequency.into())),
            ..Self::default()
        }
    }

    /// Reads the record at `index` of its list. Entries that are not objects become an
    /// unreadable placeholder that never applies.
    pub fn from_value(entry: Value, index: usize) -> Self {
        let record = match entry {
            Value::Object(_) => serde_json::from_value(entry).map_err(|err| err.to_string()),
            other => Err(format!("found {other}")),
        };
        record.unwrap_or_else(|reason| {
            tracing::warn!(index, %reason, "stored record is not an object");
            Self {
                name: Some(Stored::Value(format!("record {}", index + 1))),
                unreadable: true,
                ..Self::default()
            }
        })
    }

    /// Converts the record into a typed item of `kind`. Never fails: anything that
    /// cannot be read is recorded as a [`RecordDefect`] and logged.
    pub fn into_item(self, kind: ItemKind) -> FinancialItem {
        let id = parse_id(read_text(self.id).as_deref());
        let name = read_text(self.name).unwrap_or_default();
        let mut defects = Vec::new();
        if self.unreadable {
            defects.push(RecordDefect::UnreadableRecord);
        }

        let amount = read_amount(self.amount, "amount", &mut defects).unwrap_or_default();

        let frequency_text = read_text(self.frequency).unwrap_or_default();
        let frequency = Frequency::parse_lenient(&frequency_text);
        if frequency == Frequency::Unrecognized && !self.unreadable {
            defects.push(RecordDefect::UnrecognizedFrequency(frequency_text));
        }

        let custom_months = self
            .custom_months
            .as_ref()
            .map_or(CustomMonths::Unset, parse_custom_months);
        if custom_months.is_malformed() {
            defects.push(RecordDefect::MalformedCustomMonths);
        }

        let start_date = match parse_date(read_text(self.start_date).as_deref()) {
            Ok(date) => date,
            Err(raw) => {
                defects.push(RecordDefect::MalformedStartDate(raw));
                None
            }
        };
        let end_date = match parse_date(read_text(self.end_date).as_deref()) {
            Ok(date) => date,
            Err(raw) => {
                defects.push(RecordDefect::MalformedEndDate(raw));
                None
            }
        };
        let is_active = read_flag(self.is_active, "isActive", &mut defects).unwrap_or(true);

        let income = (kind == ItemKind::Income).then(|| {
            let past_income_history = match self.past_income_history.as_ref() {
                None => Vec::new(),
                Some(payload) => parse_history(payload).unwrap_or_else(|| {
                    defects.push(RecordDefect::MalformedIncomeHistory);
                    Vec::new()
                }),
            };
            let future_milestones = match self.future_milestones.as_ref() {
                None => Vec::new(),
                Some(payload) => parse_milestones(payload).unwrap_or_else(|| {
                    defects.push(RecordDefect::MalformedMilestones);
                    Vec::new()
                }),
            };
            let employee_cpf_contribution = match self.employee_cpf_contribution {
                Some(Stored::Unreadable(_)) => {
                    defects.push(RecordDefect::MalformedField("employeeCpfContribution".into()));
                    None
                }
                Some(Stored::Value(value)) => Some(value),
                None => None,
            };
            IncomeDetails {
                subject_to_cpf: read_flag(self.subject_to_cpf, "subjectToCpf", &mut defects)
                    .unwrap_or(false),
                employee_cpf_contribution,
                past_income_history,
                future_milestones,
                account_for_future_change: read_flag(
                    self.account_for_future_change,
                    "accountForFutureChange",
                    &mut defects,
                )
                .unwrap_or(false),
            }
        });

        let investment = (kind == ItemKind::Investment).then(|| InvestmentDetails {
            current_capital: read_amount(self.current_capital, "currentCapital", &mut defects)
                .unwrap_or_default(),
            projected_yield: read_amount(self.projected_yield, "projectedYield", &mut defects)
                .unwrap_or_default(),
            contribution_amount: read_amount(
                self.contribution_amount,
                "contributionAmount",
                &mut defects,
            )
            .unwrap_or(amount),
            contribution_frequency: read_text(self.contribution_frequency)
                .as_deref()
                .map_or(frequency, Frequency::parse_lenient),
        });

        for defect in &defects {
            tracing::warn!(item = %id, name = %name, ?defect, "degraded stored record");
        }

        FinancialItem {
            id,
            name,
            category: read_text(self.category).filter(|label| !label.trim().is_empty()),
            kind,
            amount,
            frequency,
            custom_months,
            start_date,
            end_date,
            is_active,
            income,
            investment,
            defects,
        }
    }
}

// Text fields take scalars of any type at face value (`42` reads as "42").
fn read_text(field: Option<Stored<String>>) -> Option<String> {
    field.map(|stored| match stored {
        Stored::Value(text) => text,
        Stored::Unreadable(raw) => raw_text(&raw),
    })
}

fn raw_text(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn read_amount(
    field: Option<Stored<Decimal>>,
    name: &str,
    defects: &mut Vec<RecordDefect>,
) -> Option<Decimal> {
    match field? {
        Stored::Value(value) => Some(value),
        Stored::Unreadable(raw) => {
            defects.push(RecordDefect::MalformedAmount {
                field: name.to_string(),
                raw: raw_text(&raw),
            });
            None
        }
    }
}

fn read_flag(
    field: Option<Stored<bool>>,
    name: &str,
    defects: &mut Vec<RecordDefect>,
) -> Option<bool> {
    match field? {
        Stored::Value(flag) => Some(flag),
        Stored::Unreadable(_) => {
            defects.push(RecordDefect::MalformedField(name.to_string()));
            None
        }
    }
}

// Non-UUID identifiers (numeric row ids) map to a stable name-based UUID.
fn parse_id(raw: Option<&str>) -> Uuid {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Uuid::parse_str(raw)
            .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.as_bytes())),
        None => Uuid::new_v4(),
    }
}

fn parse_custom_months(payload: &Value) -> CustomMonths {
    match payload {
        Value::Null => CustomMonths::Unset,
        Value::String(text) => CustomMonths::from_json(text),
        Value::Array(_) => CustomMonths::from_json(&payload.to_string()),
        _ => CustomMonths::Malformed,
    }
}

/// `Ok(None)` for absent or blank values, `Err(raw)` when the text is not a date.
fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    let date_part = text.split('T').next().unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| text.to_string())
}

// Accepts the JSON-in-string form and the decoded form alike.
fn decode_payload(payload: &Value) -> Option<Vec<Value>> {
    match payload {
        Value::Null => Some(Vec::new()),
        Value::Array(entries) => Some(entries.clone()),
        Value::String(text) if text.trim().is_empty() => Some(Vec::new()),
        Value::String(text) => match serde_json::from_str::<Value>(text).ok()? {
            Value::Null => Some(Vec::new()),
            Value::Array(entries) => Some(entries),
            _ => None,
        },
        _ => None,
    }
}

/// Entries whose period does not match their granularity are dropped; a payload that
/// is not a list at all yields `None`.
fn parse_history(payload: &Value) -> Option<Vec<PastIncomeEntry>> {
    let entries = decode_payload(payload)?;
    let parsed = entries
        .into_iter()
        .filter_map(|entry| {
            let raw: RawHistoryEntry = match serde_json::from_value(entry) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unreadable income history entry");
                    return None;
                }
            };
            let granularity = match raw.granularity.trim().to_ascii_lowercase().as_str() {
                "monthly" | "month" => Granularity::Monthly,
                "yearly" | "year" | "annual" => Granularity::Yearly,
                other => {
                    tracing::warn!(
                        granularity = other,
                        "dropping history entry with unknown granularity"
                    );
                    return None;
                }
            };
            let period_text = match &raw.period {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                _ => return None,
            };
            match IncomePeriod::parse(&period_text, granularity) {
                Some(period) => Some(PastIncomeEntry {
                    period,
                    amount: raw.amount,
                }),
                None => {
                    tracing::warn!(
                        period = %period_text,
                        ?granularity,
                        "dropping history entry with unreadable period"
                    );
                    None
                }
            }
        })
        .collect();
    Some(parsed)
}

fn parse_milestones(payload: &Value) -> Option<Vec<FutureMilestone>> {
    let entries = decode_payload(payload)?;
    let parsed = entries
        .into_iter()
        .filter_map(|entry| {
            let raw: RawMilestone = match serde_json::from_value(entry) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unreadable milestone entry");
                    return None;
                }
            };
            match raw.target_month.parse::<YearMonth>() {
                Ok(target_month) => Some(FutureMilestone::new(target_month, raw.amount)),
                Err(err) => {
                    tracing::warn!(error = %err, "dropping milestone with unreadable target month");
                    None
                }
            }
        })
        .collect();
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn raw(value: Value) -> RawFinancialItem {
        serde_json::from_value(value).expect("record")
    }

    #[test]
    fn reads_json_string_payloads() {
        let item = raw(json!({
            "id": "3f0c1f9e-4d7a-4f43-9a53-2f7e0b3a1c11",
            "name": "Salary",
            "amount": "5000",
            "frequency": "Monthly",
            "startDate": "2024-01-01T00:00:00.000Z",
            "subjectToCpf": true,
            "employeeCpfContribution": 1000,
            "pastIncomeHistory": "[{\"period\":\"2024-03\",\"granularity\":\"monthly\",\"amount\":5200}]",
            "futureMilestones": "[{\"targetMonth\":\"2025-06\",\"amount\":6000}]",
            "accountForFutureChange": true
        }))
        .into_item(ItemKind::Income);

        assert!(item.defects.is_empty());
        assert_eq!(item.frequency, Frequency::Monthly);
        assert_eq!(item.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        let income = item.income.expect("income details");
        assert!(income.subject_to_cpf);
        assert_eq!(income.employee_cpf_contribution, Some(dec!(1000)));
        assert_eq!(income.past_income_history.len(), 1);
        assert_eq!(income.future_milestones[0].amount, dec!(6000));
    }

    #[test]
    fn malformed_payloads_become_defects() {
        let item = raw(json!({
            "name": "Broken",
            "amount": 10,
            "frequency": "fortnightly-ish",
            "customMonths": "[3, oops]",
            "endDate": "31/12/2024",
            "pastIncomeHistory": "{not json",
        }))
        .into_item(ItemKind::Income);

        assert!(item.custom_months.is_malformed());
        assert!(item.defects.contains(&RecordDefect::MalformedCustomMonths));
        assert!(item
            .defects
            .contains(&RecordDefect::UnrecognizedFrequency("fortnightly-ish".into())));
        assert!(item
            .defects
            .contains(&RecordDefect::MalformedEndDate("31/12/2024".into())));
        assert!(item.defects.contains(&RecordDefect::MalformedIncomeHistory));
        assert!(item.has_blocking_defect());
    }

    #[test]
    fn history_entries_with_bad_periods_are_dropped() {
        let item = raw(json!({
            "name": "Salary",
            "amount": 4000,
            "frequency": "monthly",
            "pastIncomeHistory": [
                {"period": "2024-13", "granularity": "monthly", "amount": 1},
                {"period": "2023", "granularity": "yearly", "amount": 48000},
                {"period": "2024-02", "granularity": "weekly", "amount": 1}
            ]
        }))
        .into_item(ItemKind::Income);
        let history = item.income.expect("income").past_income_history;
        assert_eq!(history, vec![PastIncomeEntry::yearly(2023, dec!(48000))]);
        assert!(item.defects.is_empty());
    }

    #[test]
    fn numeric_ids_map_to_stable_uuids() {
        let first = raw(json!({"id": "42", "name": "Rent", "amount": 1, "frequency": "monthly"}))
            .into_item(ItemKind::Expense);
        let second = raw(json!({"id": "42", "name": "Rent", "amount": 1, "frequency": "monthly"}))
            .into_item(ItemKind::Expense);
        assert_eq!(first.id, second.id);
        assert!(first.income.is_none());
    }

    #[test]
    fn investment_contribution_falls_back_to_base_fields() {
        let item = raw(json!({
            "name": "ETF",
            "amount": 500,
            "frequency": "custom",
            "customMonths": "[6, 12]",
            "currentCapital": 20000,
            "projectedYield": 6
        }))
        .into_item(ItemKind::Investment);
        let details = item.investment.expect("investment details");
        assert_eq!(details.contribution_amount, dec!(500));
        assert_eq!(details.contribution_frequency, Frequency::Custom);
        assert!(item.custom_months.contains(12));
    }

    #[test]
    fn unreadable_milestone_entries_are_dropped() {
        let item = raw(json!({
            "name": "Salary",
            "amount": 4000,
            "frequency": "monthly",
            "futureMilestones": [
                {"targetMonth": "2026-01", "amount": "lots"},
                {"amount": 5000},
                {"targetMonth": "2026-07", "amount": 5500}
            ]
        }))
        .into_item(ItemKind::Income);
        let milestones = item.income.expect("income").future_milestones;
        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].amount, dec!(5500));
        assert!(item.defects.is_empty());
    }

    #[test]
    fn mistyped_fields_degrade_only_their_record() {
        let item = raw(json!({
            "id": 17,
            "name": "Fund",
            "amount": 250,
            "frequency": "monthly",
            "currentCapital": {"value": 1000},
            "projectedYield": 5,
            "isActive": null
        }))
        .into_item(ItemKind::Investment);

        assert_eq!(item.id, parse_id(Some("17")));
        assert!(item.is_active);
        assert_eq!(
            item.defects,
            vec![RecordDefect::MalformedAmount {
                field: "currentCapital".into(),
                raw: r#"{"value":1000}"#.into(),
            }]
        );
        assert!(item.has_blocking_defect());
    }

    #[test]
    fn income_flags_of_the_wrong_type_fall_back() {
        let item = raw(json!({
            "name": "Salary",
            "amount": 5000,
            "frequency": "monthly",
            "subjectToCpf": "true",
            "employeeCpfContribution": "unknown"
        }))
        .into_item(ItemKind::Income);

        let income = item.income.as_ref().expect("income");
        assert!(!income.subject_to_cpf);
        assert_eq!(income.employee_cpf_contribution, None);
        assert_eq!(item.defects.len(), 2);
        assert!(!item.has_blocking_defect());
    }
}

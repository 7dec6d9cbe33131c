//! # Bill Input Shapes
//!
//! Adapters from the two external bill shapes into one canonical
//! [`BillSubmission`].
//!
//! ## Accepted Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. ITEMIZED (group already resolved)                                   │
//! │  {                                                                      │
//! │    "items": [{"person": "John", "item": "Pasta", "cost": 12.0}],        │
//! │    "splitwise_group_id": 123456                                         │
//! │  }                                                                      │
//! │                                                                         │
//! │  2. DECLARATIVE EQUAL SPLIT (group by name)                             │
//! │  {                                                                      │
//! │    "items": [{"item": "Pasta", "price": 12.0}],                         │
//! │    "total": 24.0,                                                       │
//! │    "splitwise_group": {                                                 │
//! │      "group_name": "Test", "expense_date": "2024-11-23",                │
//! │      "split_equally": true, "each_share": 12.0                          │
//! │    }                                                                    │
//! │  }                                                                      │
//! │                                                                         │
//! │  Both ──► BillInput (picked by group field) ──► BillSubmission          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{BillLineItem, GroupId};

/// Date format of `expense_date`.
pub const EXPENSE_DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Canonical Representation
// =============================================================================

/// How the submission names its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    Id(GroupId),
    Name(String),
}

/// Requested split method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Everyone owes the same share. `None` derives it from the total.
    Equal { each_share: Option<Money> },
    /// Each person owes what they consumed.
    Itemized,
}

/// A bill ready for reconciliation, whatever shape it arrived in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillSubmission {
    pub items: Vec<BillLineItem>,
    /// Total printed on the bill. Itemized bills without one use the sum
    /// of their items.
    pub declared_total: Option<Money>,
    pub group: GroupRef,
    /// Expense date; `None` means "today" at submission time.
    pub date: Option<NaiveDate>,
    pub mode: SplitMode,
    /// Display name of the member who paid, if known.
    pub paid_by: Option<String>,
}

impl BillSubmission {
    /// Sum of every line item's cost.
    pub fn items_total(&self) -> CoreResult<Money> {
        Money::checked_sum(self.items.iter().map(|i| i.cost))
            .ok_or_else(|| ValidationError::overflow("items").into())
    }
}

// =============================================================================
// External Shapes
// =============================================================================

/// Either accepted bill shape.
///
/// The group field decides the shape: `splitwise_group_id` is itemized,
/// `splitwise_group` is declared. The body is then parsed as that shape
/// only, so errors name the missing or malformed field.
#[derive(Debug, Clone)]
pub enum BillInput {
    Itemized(ItemizedBill),
    Declared(DeclaredBill),
}

impl BillInput {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let (by_id, by_name) = match value.as_object() {
            Some(object) => (
                object.contains_key("splitwise_group_id"),
                object.contains_key("splitwise_group"),
            ),
            None => return Err(de::Error::custom("bill must be a JSON object")),
        };

        match (by_id, by_name) {
            (true, false) => serde_json::from_value(value).map(BillInput::Itemized),
            (false, true) => serde_json::from_value(value).map(BillInput::Declared),
            (true, true) => Err(de::Error::custom(
                "bill has both `splitwise_group_id` and `splitwise_group`",
            )),
            (false, false) => Err(de::Error::custom(
                "bill needs either `splitwise_group_id` or `splitwise_group`",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for BillInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        BillInput::from_value(value).map_err(de::Error::custom)
    }
}

/// Shape 1: per-person items, group given by id.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemizedBill {
    pub items: Vec<ItemizedLine>,
    pub splitwise_group_id: GroupId,
    #[serde(default)]
    pub total: Option<Money>,
    #[serde(default)]
    pub expense_date: Option<String>,
    #[serde(default)]
    pub paid_by: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemizedLine {
    /// Optional on the wire so a missing person surfaces as a
    /// reconciliation failure rather than a parse error.
    #[serde(default)]
    pub person: Option<String>,
    pub item: String,
    pub cost: Money,
}

/// Shape 2: unattributed items, group given by name, equal split declared.
#[derive(Debug, Clone, Deserialize)]
pub struct DeclaredBill {
    pub items: Vec<PricedLine>,
    pub total: Money,
    pub splitwise_group: DeclaredGroup,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricedLine {
    pub item: String,
    pub price: Money,
    #[serde(default)]
    pub person: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeclaredGroup {
    pub group_name: String,
    pub expense_date: String,
    #[serde(default = "default_true")]
    pub split_equally: bool,
    #[serde(default)]
    pub each_share: Option<Money>,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Adapters
// =============================================================================

impl TryFrom<BillInput> for BillSubmission {
    type Error = crate::error::CoreError;

    fn try_from(input: BillInput) -> CoreResult<Self> {
        match input {
            BillInput::Itemized(bill) => bill.try_into(),
            BillInput::Declared(bill) => bill.try_into(),
        }
    }
}

impl TryFrom<ItemizedBill> for BillSubmission {
    type Error = crate::error::CoreError;

    fn try_from(bill: ItemizedBill) -> CoreResult<Self> {
        let items = bill
            .items
            .into_iter()
            .map(|line| line_item(line.person, line.item, line.cost, "cost"))
            .collect::<Result<Vec<_>, _>>()?;
        require_items(&items)?;
        if let Some(total) = bill.total {
            require_non_negative(total, "total")?;
        }

        let date = bill.expense_date.as_deref().map(parse_expense_date).transpose()?;

        Ok(BillSubmission {
            items,
            declared_total: bill.total,
            group: GroupRef::Id(bill.splitwise_group_id),
            date,
            mode: SplitMode::Itemized,
            paid_by: non_blank(bill.paid_by),
        })
    }
}

impl TryFrom<DeclaredBill> for BillSubmission {
    type Error = crate::error::CoreError;

    fn try_from(bill: DeclaredBill) -> CoreResult<Self> {
        let items = bill
            .items
            .into_iter()
            .map(|line| line_item(line.person, line.item, line.price, "price"))
            .collect::<Result<Vec<_>, _>>()?;
        require_items(&items)?;

        let group_name = bill.splitwise_group.group_name.trim();
        if group_name.is_empty() {
            return Err(ValidationError::required("group_name").into());
        }
        require_non_negative(bill.total, "total")?;
        if let Some(each_share) = bill.splitwise_group.each_share {
            require_non_negative(each_share, "each_share")?;
        }

        let mode = if bill.splitwise_group.split_equally {
            SplitMode::Equal {
                each_share: bill.splitwise_group.each_share,
            }
        } else {
            SplitMode::Itemized
        };

        Ok(BillSubmission {
            items,
            declared_total: Some(bill.total),
            group: GroupRef::Name(group_name.to_string()),
            date: Some(parse_expense_date(&bill.splitwise_group.expense_date)?),
            mode,
            paid_by: None,
        })
    }
}

fn line_item(
    person: Option<String>,
    item: String,
    cost: Money,
    cost_field: &str,
) -> Result<BillLineItem, ValidationError> {
    let item_name = item.trim();
    if item_name.is_empty() {
        return Err(ValidationError::required("item"));
    }
    require_non_negative(cost, cost_field)?;
    Ok(BillLineItem {
        person: non_blank(person),
        item_name: item_name.to_string(),
        cost,
    })
}

fn require_non_negative(amount: Money, field: &str) -> Result<(), ValidationError> {
    if amount.is_negative() {
        return Err(ValidationError::negative(field));
    }
    Ok(())
}

fn require_items(items: &[BillLineItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::required("items"));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_expense_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), EXPENSE_DATE_FORMAT).map_err(|e| {
        ValidationError::InvalidFormat {
            field: "expense_date".to_string(),
            reason: format!("expected YYYY-MM-DD ({e})"),
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> CoreResult<BillSubmission> {
        let input: BillInput = serde_json::from_value(value).unwrap();
        BillSubmission::try_from(input)
    }

    fn parse_error(value: serde_json::Value) -> String {
        serde_json::from_value::<BillInput>(value)
            .unwrap_err()
            .to_string()
    }

    #[test]
    fn test_itemized_shape() {
        let submission = parse(json!({
            "items": [
                {"person": "John", "item": "Pasta", "cost": 12.0},
                {"person": "Mary", "item": "Salad", "cost": 9.0},
                {"person": "John", "item": "Soda", "cost": 1.5},
                {"person": "Mary", "item": "Soda", "cost": 1.5}
            ],
            "splitwise_group_id": 123456
        }))
        .unwrap();

        assert_eq!(submission.group, GroupRef::Id(123456));
        assert_eq!(submission.mode, SplitMode::Itemized);
        assert_eq!(submission.items.len(), 4);
        assert_eq!(submission.items[0].person.as_deref(), Some("John"));
        assert_eq!(submission.items_total().unwrap(), Money::from_cents(2400));
        assert_eq!(submission.declared_total, None);
        assert_eq!(submission.date, None);
    }

    #[test]
    fn test_declared_shape() {
        let submission = parse(json!({
            "items": [
                {"item": "Pasta", "price": 12.0},
                {"item": "Salad", "price": 9.0},
                {"item": "Soda", "price": 3.0}
            ],
            "total": 24.0,
            "splitwise_group": {
                "group_name": "Test",
                "expense_date": "2024-11-23",
                "split_equally": true,
                "each_share": 12.0
            }
        }))
        .unwrap();

        assert_eq!(submission.group, GroupRef::Name("Test".to_string()));
        assert_eq!(
            submission.mode,
            SplitMode::Equal {
                each_share: Some(Money::from_cents(1200))
            }
        );
        assert_eq!(submission.declared_total, Some(Money::from_cents(2400)));
        assert_eq!(submission.date, NaiveDate::from_ymd_opt(2024, 11, 23));
        assert!(submission.items.iter().all(|i| i.person.is_none()));
    }

    #[test]
    fn test_declared_unequal_becomes_itemized() {
        let submission = parse(json!({
            "items": [{"item": "Pasta", "price": 12.0}],
            "total": 12.0,
            "splitwise_group": {
                "group_name": "Test",
                "expense_date": "2024-11-23",
                "split_equally": false,
                "each_share": 12.0
            }
        }))
        .unwrap();
        assert_eq!(submission.mode, SplitMode::Itemized);
    }

    #[test]
    fn test_missing_person_is_not_a_parse_error() {
        let submission = parse(json!({
            "items": [{"item": "Pasta", "cost": 12.0}],
            "splitwise_group_id": 1
        }))
        .unwrap();
        assert_eq!(submission.items[0].person, None);
    }

    #[test]
    fn test_bad_date_rejected() {
        let err = parse(json!({
            "items": [{"item": "Pasta", "price": 12.0}],
            "total": 12.0,
            "splitwise_group": {
                "group_name": "Test",
                "expense_date": "23/11/2024",
                "split_equally": true,
                "each_share": 12.0
            }
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_empty_items_rejected() {
        let err = parse(json!({
            "items": [],
            "splitwise_group_id": 1
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: items is required");
    }

    #[test]
    fn test_blank_group_name_rejected() {
        let err = parse(json!({
            "items": [{"item": "Pasta", "price": 12.0}],
            "total": 12.0,
            "splitwise_group": {
                "group_name": "  ",
                "expense_date": "2024-11-23",
                "split_equally": true,
                "each_share": 12.0
            }
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: group_name is required");
    }

    #[test]
    fn test_declared_shape_names_missing_field() {
        let message = parse_error(json!({
            "items": [{"item": "Pasta", "price": 12.0}],
            "splitwise_group": {
                "group_name": "Test",
                "expense_date": "2024-11-23",
                "split_equally": true
            }
        }));
        assert!(message.contains("missing field `total`"), "{message}");
    }

    #[test]
    fn test_itemized_shape_names_bad_field() {
        let message = parse_error(json!({
            "items": [{"person": "John", "item": "Pasta", "cost": "twelve"}],
            "splitwise_group_id": 123456
        }));
        assert!(!message.contains("untagged"), "{message}");

        let message = parse_error(json!({
            "items": [{"person": "John", "cost": 12.0}],
            "splitwise_group_id": 123456
        }));
        assert!(message.contains("missing field `item`"), "{message}");
    }

    #[test]
    fn test_shape_needs_exactly_one_group_field() {
        let message = parse_error(json!({"items": []}));
        assert!(message.contains("splitwise_group_id"), "{message}");

        let message = parse_error(json!({
            "items": [],
            "splitwise_group_id": 1,
            "splitwise_group": {"group_name": "Test", "expense_date": "2024-11-23"}
        }));
        assert!(message.contains("both"), "{message}");

        let message = parse_error(json!([1, 2, 3]));
        assert!(message.contains("JSON object"), "{message}");
    }

    #[test]
    fn test_negative_amounts_rejected_in_both_shapes() {
        let err = parse(json!({
            "items": [{"person": "John", "item": "Refund", "cost": -5.0}],
            "splitwise_group_id": 1
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: cost must not be negative");

        let err = parse(json!({
            "items": [{"person": "John", "item": "Pasta", "cost": 12.0}],
            "splitwise_group_id": 1,
            "total": -12.0
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: total must not be negative");

        let err = parse(json!({
            "items": [{"item": "Pasta", "price": -12.0}],
            "total": 12.0,
            "splitwise_group": {"group_name": "Test", "expense_date": "2024-11-23"}
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: price must not be negative");

        let err = parse(json!({
            "items": [{"item": "Pasta", "price": 12.0}],
            "total": -12.0,
            "splitwise_group": {"group_name": "Test", "expense_date": "2024-11-23"}
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: total must not be negative");
    }
}

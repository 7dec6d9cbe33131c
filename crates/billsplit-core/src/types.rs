//! # Domain Types
//!
//! Core domain types shared by every reconciliation step.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌─────────────────┐  │
//! │  │  BillLineItem   │   │ AggregatedPersonTotal│   │ GroupMembership │  │
//! │  │  ─────────────  │   │  ──────────────────  │   │  ─────────────  │  │
//! │  │  person?        │──►│  person              │   │  group_id       │  │
//! │  │  item_name      │   │  items (in order)    │   │  group_name     │  │
//! │  │  cost           │   │  total               │   │  members        │  │
//! │  └─────────────────┘   └──────────────────────┘   └─────────────────┘  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   SplitPlan     │   │ ExpenseRequest  │  ← boundary object sent     │
//! │  │  ─────────────  │   │  ─────────────  │    to the ledger            │
//! │  │  Equal          │──►│  cost, date     │                             │
//! │  │  Itemized       │   │  shares?        │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! BillLineItem and GroupMembership live for one request; only the
//! group-id cache (in billsplit-ledger) outlives a reconciliation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;

/// Ledger-side group identifier.
pub type GroupId = i64;

/// Ledger-side member (user) identifier.
pub type MemberId = i64;

/// Member id returned by a soft member lookup that found no match.
pub const UNRESOLVED_MEMBER_ID: MemberId = 0;

// =============================================================================
// Bill Line Item
// =============================================================================

/// One charge extracted from a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLineItem {
    /// Who consumed the item. Required for itemized splits.
    pub person: Option<String>,

    /// Name as printed on the bill.
    pub item_name: String,

    /// Item cost.
    pub cost: Money,
}

impl BillLineItem {
    pub fn new(person: Option<&str>, item_name: &str, cost: Money) -> Self {
        BillLineItem {
            person: person.map(str::to_string),
            item_name: item_name.to_string(),
            cost,
        }
    }
}

// =============================================================================
// Aggregated Person Total
// =============================================================================

/// Per-person rollup of the line items they consumed.
///
/// Invariant: `total` equals the sum of the costs of the items in `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedPersonTotal {
    pub person: String,

    /// Item names in the order they appeared on the bill.
    pub items: Vec<String>,

    pub total: Money,
}

// =============================================================================
// Group Membership
// =============================================================================

/// A group as listed by the group directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
}

/// A member of a ledger group.
///
/// `display_name` is a case-sensitive identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: MemberId,
    pub display_name: String,
}

impl Member {
    pub fn new(member_id: MemberId, display_name: impl Into<String>) -> Self {
        Member {
            member_id,
            display_name: display_name.into(),
        }
    }
}

/// A resolved group with its roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub group_name: String,
    pub members: Vec<Member>,
}

impl GroupMembership {
    /// Number of members an equal split is divided across.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

// =============================================================================
// Split Plan
// =============================================================================

/// How a bill total is divided among group members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitPlan {
    /// Every member owes the same share.
    Equal { each_share: Money, member_count: usize },

    /// Each member owes an explicit amount.
    Itemized { shares: BTreeMap<MemberId, Money> },
}

impl SplitPlan {
    /// The amount the plan adds up to.
    ///
    /// ## Errors
    /// `Validation` when the total leaves the decimal range.
    pub fn planned_total(&self) -> CoreResult<Money> {
        let total = match self {
            SplitPlan::Equal {
                each_share,
                member_count,
            } => each_share.checked_multiply_count(*member_count),
            SplitPlan::Itemized { shares } => Money::checked_sum(shares.values().copied()),
        };
        total.ok_or_else(|| ValidationError::overflow("planned total").into())
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, SplitPlan::Equal { .. })
    }
}

// =============================================================================
// Expense Request
// =============================================================================

/// What one member paid and owes for an expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberShare {
    pub paid_share: Money,
    pub owed_share: Money,
}

/// The exact object handed to the ledger collaborator.
///
/// `shares` is `None` for equal splits; the ledger divides the cost itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseRequest {
    pub cost: Money,
    pub description: String,
    pub date: NaiveDate,
    pub group_id: GroupId,
    pub split_equally: bool,
    pub shares: Option<BTreeMap<MemberId, MemberShare>>,
}

/// Namespace for submission fingerprints.
const FINGERPRINT_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_2c3a_9d4e_4f50_8a61_b7c8_d9e0_f1a2);

impl ExpenseRequest {
    /// Deterministic identifier derived from the bill content and date.
    ///
    /// Two submissions of the same bill produce the same fingerprint, which
    /// lets callers spot duplicates after an ambiguous ledger response.
    pub fn fingerprint(&self) -> Uuid {
        let mut material = format!(
            "{}|{}|{}|{}|{}",
            self.group_id,
            self.date,
            self.cost.to_ledger_string(),
            self.split_equally,
            self.description
        );
        if let Some(shares) = &self.shares {
            for (member_id, share) in shares {
                material.push_str(&format!(
                    "|{}:{}:{}",
                    member_id,
                    share.paid_share.to_ledger_string(),
                    share.owed_share.to_ledger_string()
                ));
            }
        }
        Uuid::new_v5(&FINGERPRINT_NAMESPACE, material.as_bytes())
    }
}

// =============================================================================
// Policies and Capabilities
// =============================================================================

/// What to do when an aggregated person has no roster match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberPolicy {
    /// Fail the reconciliation with `UnresolvedMember`.
    #[default]
    Strict,

    /// Attribute the share to `UNRESOLVED_MEMBER_ID`.
    Sentinel,
}

/// What the ledger contract supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerCapabilities {
    /// Whether per-member paid/owed shares can be submitted.
    pub supports_itemized_shares: bool,
}

impl Default for LedgerCapabilities {
    fn default() -> Self {
        LedgerCapabilities {
            supports_itemized_shares: true,
        }
    }
}

//! # Expense Payload Builder
//!
//! Turns a validated split plan into the [`ExpenseRequest`] the ledger
//! accepts.
//!
//! ## Output by Mode
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EQUAL                               │  ITEMIZED                        │
//! │  ─────                               │  ────────                        │
//! │  cost          = declared total      │  cost          = Σ owed shares   │
//! │  split_equally = true                │  split_equally = false           │
//! │  shares        = None                │  shares        = one entry per   │
//! │  (the ledger divides it)             │                  member          │
//! │                                      │  paid_share    = 0 unless payer  │
//! │                                      │                                  │
//! │  description = "Bill split: " + item names joined by ", "               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::aggregation::Aggregation;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    BillLineItem, ExpenseRequest, GroupId, LedgerCapabilities, MemberId, MemberShare, SplitPlan,
};

/// Prefix of every expense description.
pub const DESCRIPTION_PREFIX: &str = "Bill split: ";

/// Where the description's item names come from.
#[derive(Debug, Clone, Copy)]
pub enum DescriptionSource<'a> {
    /// Bill order (equal splits, where items need no person).
    Bill(&'a [BillLineItem]),

    /// Aggregation order: person by person, items in insertion order.
    Aggregation(&'a Aggregation),
}

impl DescriptionSource<'_> {
    /// Builds `"Bill split: Pasta, Salad, ..."`.
    pub fn describe(&self) -> String {
        let names: Vec<&str> = match self {
            DescriptionSource::Bill(items) => items.iter().map(|i| i.item_name.as_str()).collect(),
            DescriptionSource::Aggregation(aggregation) => aggregation.item_names().collect(),
        };
        format!("{}{}", DESCRIPTION_PREFIX, names.join(", "))
    }
}

/// Everything the builder needs for one expense.
#[derive(Debug, Clone)]
pub struct PayloadInput<'a> {
    /// A plan that already passed validation.
    pub plan: &'a SplitPlan,
    pub source: DescriptionSource<'a>,
    pub declared_total: Money,
    pub group_id: GroupId,
    pub date: NaiveDate,
    /// Member who paid the bill, if known. Only used for itemized splits.
    pub payer: Option<MemberId>,
}

/// Builds expense requests for one ledger contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpensePayloadBuilder {
    capabilities: LedgerCapabilities,
}

impl ExpensePayloadBuilder {
    pub fn new(capabilities: LedgerCapabilities) -> Self {
        ExpensePayloadBuilder { capabilities }
    }

    pub fn capabilities(&self) -> LedgerCapabilities {
        self.capabilities
    }

    /// Builds the request for `input.plan`.
    ///
    /// ## Errors
    /// `UnsupportedSplit` for an itemized plan when the ledger contract
    /// cannot take per-member shares.
    pub fn build(&self, input: PayloadInput<'_>) -> CoreResult<ExpenseRequest> {
        let description = input.source.describe();

        match input.plan {
            SplitPlan::Equal { .. } => Ok(ExpenseRequest {
                cost: input.declared_total,
                description,
                date: input.date,
                group_id: input.group_id,
                split_equally: true,
                shares: None,
            }),
            SplitPlan::Itemized { shares } => {
                if !self.capabilities.supports_itemized_shares {
                    return Err(CoreError::UnsupportedSplit);
                }
                let cost = Money::checked_sum(shares.values().copied())
                    .ok_or_else(|| ValidationError::overflow("cost"))?;
                Ok(ExpenseRequest {
                    cost,
                    description,
                    date: input.date,
                    group_id: input.group_id,
                    split_equally: false,
                    shares: Some(member_shares(shares, cost, input.payer)),
                })
            }
        }
    }
}

fn member_shares(
    owed: &BTreeMap<MemberId, Money>,
    cost: Money,
    payer: Option<MemberId>,
) -> BTreeMap<MemberId, MemberShare> {
    let mut shares: BTreeMap<MemberId, MemberShare> = owed
        .iter()
        .map(|(&member_id, &owed_share)| {
            (
                member_id,
                MemberShare {
                    paid_share: Money::zero(),
                    owed_share,
                },
            )
        })
        .collect();

    if let Some(payer) = payer {
        shares
            .entry(payer)
            .or_insert(MemberShare {
                paid_share: Money::zero(),
                owed_share: Money::zero(),
            })
            .paid_share = cost;
    }

    shares
}

// =============================================================================
// Unit Tests
// =============================================================================

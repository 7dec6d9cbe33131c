//! Split plan construction.
//!
//! Turns a submission's split mode plus the resolved roster into a
//! [`SplitPlan`] the validator can check.

use std::collections::BTreeMap;

use crate::aggregation::Aggregation;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::roster::find_member_id;
use crate::types::{GroupMembership, MemberPolicy, SplitPlan, UNRESOLVED_MEMBER_ID};

/// Equal plan across every member of the roster.
///
/// With no declared per-member share, the total is divided evenly and
/// rounded to cents.
pub fn equal_plan(
    each_share: Option<Money>,
    declared_total: Money,
    membership: &GroupMembership,
) -> CoreResult<SplitPlan> {
    let member_count = membership.member_count();
    let each_share = match each_share {
        Some(share) => share,
        None => declared_total
            .split_evenly(member_count)
            .ok_or(CoreError::NoMembers)?,
    };
    Ok(SplitPlan::Equal {
        each_share,
        member_count,
    })
}

/// Itemized plan: each aggregated person owes their own total.
///
/// People are matched to members by exact display name. Under
/// [`MemberPolicy::Sentinel`] unmatched people are booked against
/// [`UNRESOLVED_MEMBER_ID`]; two people resolving to the same id share
/// one entry holding the sum.
pub fn itemized_plan(
    aggregation: &Aggregation,
    membership: &GroupMembership,
    policy: MemberPolicy,
) -> CoreResult<SplitPlan> {
    let mut shares: BTreeMap<_, Money> = BTreeMap::new();

    for person in aggregation {
        let member_id = match find_member_id(&person.person, membership) {
            Some(id) => id,
            None => match policy {
                MemberPolicy::Strict => {
                    return Err(CoreError::UnresolvedMember {
                        name: person.person.clone(),
                    })
                }
                MemberPolicy::Sentinel => UNRESOLVED_MEMBER_ID,
            },
        };
        let share = shares.entry(member_id).or_default();
        *share = share
            .checked_add(person.total)
            .ok_or_else(|| ValidationError::overflow("share"))?;
    }

    Ok(SplitPlan::Itemized { shares })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregate;
    use crate::types::{BillLineItem, Member};

    fn roster(names: &[(i64, &str)]) -> GroupMembership {
        GroupMembership {
            group_id: 123456,
            group_name: "Test".to_string(),
            members: names.iter().map(|(id, n)| Member::new(*id, *n)).collect(),
        }
    }

    fn dinner() -> Aggregation {
        aggregate(&[
            BillLineItem::new(Some("John"), "Pasta", Money::from_cents(1200)),
            BillLineItem::new(Some("Mary"), "Salad", Money::from_cents(900)),
            BillLineItem::new(Some("John"), "Soda", Money::from_cents(150)),
            BillLineItem::new(Some("Mary"), "Soda", Money::from_cents(150)),
        ])
        .unwrap()
    }

    #[test]
    fn test_equal_plan_uses_roster_size() {
        let plan = equal_plan(
            Some(Money::from_cents(1200)),
            Money::from_cents(2400),
            &roster(&[(1, "A"), (2, "B")]),
        )
        .unwrap();
        assert_eq!(
            plan,
            SplitPlan::Equal {
                each_share: Money::from_cents(1200),
                member_count: 2
            }
        );
    }

    #[test]
    fn test_equal_plan_derives_share_when_absent() {
        let plan = equal_plan(None, Money::from_cents(1000), &roster(&[(1, "A"), (2, "B"), (3, "C")]))
            .unwrap();
        assert_eq!(
            plan,
            SplitPlan::Equal {
                each_share: Money::from_cents(333),
                member_count: 3
            }
        );
        assert!(matches!(
            equal_plan(None, Money::from_cents(1000), &roster(&[])),
            Err(CoreError::NoMembers)
        ));
    }

    #[test]
    fn test_itemized_plan_maps_people_to_members() {
        let plan = itemized_plan(
            &dinner(),
            &roster(&[(11, "John"), (22, "Mary")]),
            MemberPolicy::Strict,
        )
        .unwrap();
        assert_eq!(
            plan,
            SplitPlan::Itemized {
                shares: BTreeMap::from([
                    (11, Money::from_cents(1350)),
                    (22, Money::from_cents(1050))
                ])
            }
        );
    }

    #[test]
    fn test_strict_policy_rejects_unknown_person() {
        let err = itemized_plan(&dinner(), &roster(&[(11, "John")]), MemberPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedMember { ref name } if name == "Mary"));
    }

    #[test]
    fn test_sentinel_policy_books_unknown_person_to_zero() {
        let plan = itemized_plan(&dinner(), &roster(&[(11, "John")]), MemberPolicy::Sentinel)
            .unwrap();
        assert_eq!(
            plan,
            SplitPlan::Itemized {
                shares: BTreeMap::from([
                    (0, Money::from_cents(1050)),
                    (11, Money::from_cents(1350))
                ])
            }
        );
    }
}

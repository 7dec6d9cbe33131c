//! Member lookups against a resolved roster.
//!
//! Display names are matched case-sensitively and exactly. `find_member_id`
//! reports a miss as `None`; `resolve_member_id` keeps the soft-fail
//! contract and returns [`UNRESOLVED_MEMBER_ID`].

use crate::types::{GroupMembership, MemberId, UNRESOLVED_MEMBER_ID};

/// Returns the id of the member whose display name is exactly `display_name`.
pub fn find_member_id(display_name: &str, membership: &GroupMembership) -> Option<MemberId> {
    membership
        .members
        .iter()
        .find(|m| m.display_name == display_name)
        .map(|m| m.member_id)
}

/// Like [`find_member_id`] but never fails: a miss yields
/// [`UNRESOLVED_MEMBER_ID`].
pub fn resolve_member_id(display_name: &str, membership: &GroupMembership) -> MemberId {
    find_member_id(display_name, membership).unwrap_or(UNRESOLVED_MEMBER_ID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Member;

    fn roster() -> GroupMembership {
        GroupMembership {
            group_id: 123456,
            group_name: "Dinner Friends".to_string(),
            members: vec![Member::new(11, "John"), Member::new(22, "Mary")],
        }
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(find_member_id("Mary", &roster()), Some(22));
        assert_eq!(resolve_member_id("John", &roster()), 11);
    }

    #[test]
    fn test_unresolved_returns_sentinel() {
        assert_eq!(resolve_member_id("Bob", &roster()), UNRESOLVED_MEMBER_ID);
        assert_eq!(resolve_member_id("Bob", &roster()), 0);
        assert_eq!(find_member_id("Bob", &roster()), None);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert_eq!(find_member_id("john", &roster()), None);
        assert_eq!(resolve_member_id("MARY", &roster()), 0);
    }
}

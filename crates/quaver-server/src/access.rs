//! Authorization gate for media reads.
//!
//! A pure decision function over the quiz-derived [`AccessAttributes`]
//! view: no I/O, no partial results. Every media read goes through
//! [`evaluate`] before any bytes are streamed.

use quaver_core::UserId;
use quaver_db::queries::quizzes::AccessAttributes;

/// Outcome of an access evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    /// Denied, with the reason that is logged (never sent to the client).
    Denied(&'static str),
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

/// Decide whether `principal` may read media owned by the quiz described by
/// `attrs`.
///
/// Short-circuit order, first match wins:
/// 1. no owning quiz -> denied
/// 2. quiz is public -> granted
/// 3. principal owns the quiz -> granted
/// 4. principal has a recorded attempt -> granted
/// 5. otherwise -> denied
pub fn evaluate(principal: UserId, attrs: Option<&AccessAttributes>) -> AccessDecision {
    let Some(attrs) = attrs else {
        return AccessDecision::Denied("not associated with a quiz");
    };

    if attrs.public {
        return AccessDecision::Granted;
    }

    if attrs.owner == principal {
        return AccessDecision::Granted;
    }

    if attrs.prior_attempt_principals.contains(&principal) {
        return AccessDecision::Granted;
    }

    AccessDecision::Denied("access denied")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn attrs(public: bool, owner: UserId, attempted: &[UserId]) -> AccessAttributes {
        AccessAttributes {
            public,
            owner,
            prior_attempt_principals: attempted.iter().copied().collect::<HashSet<_>>(),
        }
    }

    #[test]
    fn orphaned_media_is_denied() {
        let decision = evaluate(UserId::new(), None);
        assert_eq!(decision, AccessDecision::Denied("not associated with a quiz"));
    }

    #[test]
    fn public_quiz_grants_anyone() {
        let stranger = UserId::new();
        let a = attrs(true, UserId::new(), &[]);
        assert!(evaluate(stranger, Some(&a)).is_granted());
    }

    #[test]
    fn owner_grants_on_private_quiz() {
        let owner = UserId::new();
        let a = attrs(false, owner, &[]);
        assert!(evaluate(owner, Some(&a)).is_granted());
    }

    #[test]
    fn prior_attempt_grants_on_private_quiz() {
        let player = UserId::new();
        let a = attrs(false, UserId::new(), &[player]);
        assert!(evaluate(player, Some(&a)).is_granted());
    }

    #[test]
    fn stranger_denied_on_private_quiz() {
        let a = attrs(false, UserId::new(), &[UserId::new()]);
        let decision = evaluate(UserId::new(), Some(&a));
        assert_eq!(decision, AccessDecision::Denied("access denied"));
    }

    #[test]
    fn evaluation_is_pure() {
        let principal = UserId::new();
        let a = attrs(false, UserId::new(), &[principal]);
        let first = evaluate(principal, Some(&a));
        let second = evaluate(principal, Some(&a));
        assert_eq!(first, second);
    }

    #[test]
    fn public_wins_before_ownership_check() {
        // A public quiz grants even when the owner and attempt set are
        // unrelated to the principal.
        let a = attrs(true, UserId::new(), &[UserId::new()]);
        assert!(evaluate(UserId::new(), Some(&a)).is_granted());
    }
}

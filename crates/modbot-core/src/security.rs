use crate::domain::UserId;

/// Reply sent when a non-admin invokes a privileged command.
pub const UNAUTHORIZED_REPLY: &str = "You are not authorized to use this command.";

// ============== Authorization ==============

/// Single-admin gate for privileged commands. Fails closed.
#[derive(Clone, Copy, Debug)]
pub struct AdminGate {
    admin: UserId,
}

impl AdminGate {
    pub fn new(admin: UserId) -> Self {
        Self { admin }
    }

    /// True iff the caller is exactly the configured admin. Unknown callers are rejected.
    pub fn authorize(&self, user_id: Option<UserId>) -> bool {
        user_id == Some(self.admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_configured_admin_is_authorized() {
        let gate = AdminGate::new(UserId(424242));

        assert!(gate.authorize(Some(UserId(424242))));
        for other in [0, -1, -424242, 424241, 424243, i64::MIN, i64::MAX] {
            assert!(!gate.authorize(Some(UserId(other))), "{other}");
        }
        assert!(!gate.authorize(None));
    }

    #[test]
    fn zero_admin_still_rejects_missing_user() {
        let gate = AdminGate::new(UserId(0));
        assert!(gate.authorize(Some(UserId(0))));
        assert!(!gate.authorize(None));
    }
}

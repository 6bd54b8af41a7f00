/// Role-change planning and member-removal permission checks
///
/// The decisions here are pure functions over the loaded membership
/// list, so the admin-floor and self-protection invariants can be
/// tested without a database. Handlers load the organisation's live
/// memberships once, plan, then persist the planned change.
///
/// # Invariants enforced
///
/// - **Admin floor**: once an organisation has members, it must retain
///   at least one active admin. Demotion is refused whenever the
///   pre-change count of active admins is below two. The pre-change
///   count still includes the target, so demoting one of exactly two
///   admins succeeds and leaves one.
/// - **Self-protection**: an organisation admin cannot remove their own
///   admin membership; only a global admin can.

use uuid::Uuid;

use crate::error::{MembershipError, MembershipResult};
use crate::models::membership::{Membership, MembershipRole};

/// Outcome of planning a role change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    /// Target already holds the requested role
    NoOp,

    /// Persist `role` on the membership with the given ID
    SetRole {
        /// Membership to update
        membership_id: Uuid,
        /// Role to assign
        role: MembershipRole,
    },
}

/// Plans a role change for `target_user` within one organisation
///
/// `memberships` must be the complete list of live memberships of the
/// organisation. The caller must hold an active admin membership in it;
/// the target must belong to it.
///
/// # Errors
///
/// - `AccessForbidden` if the caller is not an active admin, or the
///   change would demote the last active admin
/// - `InvalidField` if the target has no membership here
pub fn plan_role_change(
    memberships: &[Membership],
    requesting_user: Uuid,
    target_user: Uuid,
    want_admin: bool,
) -> MembershipResult<RoleChange> {
    let mut admin_check = false;
    let mut admin_count = 0usize;
    let mut target: Option<&Membership> = None;

    for membership in memberships {
        if membership.is_active_admin() {
            admin_count += 1;
            if membership.user_id == requesting_user {
                admin_check = true;
            }
        }
        if membership.user_id == target_user {
            target = Some(membership);
        }
    }

    if !admin_check {
        return Err(MembershipError::AccessForbidden(
            "Only organisation admins can change organisation roles".to_string(),
        ));
    }

    let target = target.ok_or_else(|| {
        MembershipError::invalid_field("user_id", "User doesn't belong to the organisation")
    })?;

    if want_admin {
        if target.role == MembershipRole::Admin {
            return Ok(RoleChange::NoOp);
        }
        Ok(RoleChange::SetRole {
            membership_id: target.id,
            role: MembershipRole::Admin,
        })
    } else {
        if target.role != MembershipRole::Admin {
            return Ok(RoleChange::NoOp);
        }
        // Pre-change count, still including the target.
        if admin_count < 2 {
            return Err(MembershipError::AccessForbidden(
                "Can't unset the last organisation admin".to_string(),
            ));
        }
        Ok(RoleChange::SetRole {
            membership_id: target.id,
            role: MembershipRole::User,
        })
    }
}

/// Checks whether the caller may remove `target` from the organisation
///
/// Global admins may remove anyone. Organisation admins may remove any
/// member except their own admin membership. Everyone else is refused.
pub fn check_member_removal(
    is_global_admin: bool,
    requester_membership: Option<&Membership>,
    target: &Membership,
    requesting_user: Uuid,
) -> MembershipResult<()> {
    if is_global_admin {
        return Ok(());
    }

    let requester = requester_membership.ok_or_else(|| {
        MembershipError::AccessForbidden(
            "No access rights for the organisation".to_string(),
        )
    })?;

    if !requester.is_active_admin() {
        return Err(MembershipError::AccessForbidden(
            "Only organisation admins can remove members".to_string(),
        ));
    }

    if target.role == MembershipRole::Admin && target.user_id == requesting_user {
        return Err(MembershipError::AccessForbidden(
            "Organisation admins can't remove their own admin membership".to_string(),
        ));
    }

    Ok(())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Identity;
use crate::invitation::Invitation;

/// Confirmed association between an identity and a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub joined_at: DateTime<Utc>,
    /// The invitation whose acceptance created this membership.
    pub invitation_id: String,
}

impl Membership {
    /// Build the membership created by `actor` accepting `invitation`.
    ///
    /// Team and role come from the invitation; user fields from the actor.
    pub fn from_acceptance(invitation: &Invitation, actor: &Identity, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            team_id: invitation.team_id.clone(),
            user_id: actor.uid.clone(),
            email: actor.email.clone(),
            name: actor.name.clone(),
            role: invitation.role.clone(),
            joined_at: now,
            invitation_id: invitation.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invitation::NewInvitation;

    #[test]
    fn from_acceptance_copies_team_role_and_actor() {
        let now = Utc::now();
        let inv = NewInvitation::new("teamA", "Tigres", "u1@x.com", "coach")
            .with_id("inv1")
            .into_invitation(now)
            .unwrap();
        let actor = Identity::new("u1", "u1@x.com", "U1");

        let m = Membership::from_acceptance(&inv, &actor, now);
        assert_eq!(m.team_id, "teamA");
        assert_eq!(m.user_id, "u1");
        assert_eq!(m.email, "u1@x.com");
        assert_eq!(m.name, "U1");
        assert_eq!(m.role, "coach");
        assert_eq!(m.invitation_id, "inv1");
        assert_eq!(m.joined_at, now);
        assert!(Uuid::parse_str(&m.id).is_ok());
    }

    #[test]
    fn each_acceptance_gets_a_fresh_id() {
        let now = Utc::now();
        let inv = NewInvitation::new("teamA", "Tigres", "u1@x.com", "coach")
            .into_invitation(now)
            .unwrap();
        let actor = Identity::new("u1", "u1@x.com", "U1");
        let a = Membership::from_acceptance(&inv, &actor, now);
        let b = Membership::from_acceptance(&inv, &actor, now);
        assert_ne!(a.id, b.id);
    }
}

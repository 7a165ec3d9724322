use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// Organization scope carried by a session.
///
/// Only a super_admin session ever leaves `Global`; for every other role the
/// scope is ignored and the home organization applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "organization_id", rename_all = "snake_case")]
pub enum OrganizationScope {
    #[default]
    Global,
    Scoped(Uuid),
}

impl OrganizationScope {
    /// Maps the nullable storage column onto the scope states.
    pub fn from_selected(selected: Option<Uuid>) -> Self {
        match selected {
            Some(org) => OrganizationScope::Scoped(org),
            None => OrganizationScope::Global,
        }
    }

    pub fn selected(&self) -> Option<Uuid> {
        match self {
            OrganizationScope::Global => None,
            OrganizationScope::Scoped(org) => Some(*org),
        }
    }

    /// Global -> Scoped(org), Scoped(a) -> Scoped(org).
    pub fn select(self, organization_id: Uuid) -> Self {
        OrganizationScope::Scoped(organization_id)
    }

    /// Scoped(_) -> Global.
    pub fn clear(self) -> Self {
        OrganizationScope::Global
    }

    pub fn is_global(&self) -> bool {
        matches!(self, OrganizationScope::Global)
    }
}

/// The resolved, authenticated actor of one request.
///
/// Fields are private so the effective organization cannot drift from the
/// role rules; build one with [`Principal::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: Uuid,
    email: String,
    role: Role,
    home_organization_id: Option<Uuid>,
    effective_organization_id: Option<Uuid>,
}

impl Principal {
    /// Returns `None` for a tenant-bound role without a home organization.
    pub fn resolve(
        user_id: Uuid,
        role: Role,
        home_organization_id: Option<Uuid>,
        scope: OrganizationScope,
    ) -> Option<Self> {
        let effective_organization_id = if role.is_cross_tenant() {
            scope.selected()
        } else {
            Some(home_organization_id?)
        };

        Some(Self {
            user_id,
            email: String::new(),
            role,
            home_organization_id,
            effective_organization_id,
        })
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn home_organization_id(&self) -> Option<Uuid> {
        self.home_organization_id
    }

    /// `None` only for a super_admin in the Global scope.
    pub fn effective_organization_id(&self) -> Option<Uuid> {
        self.effective_organization_id
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn is_global(&self) -> bool {
        self.effective_organization_id.is_none()
    }

    pub fn can_switch_organization(&self) -> bool {
        self.role.is_cross_tenant()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_roles_always_use_home_organization() {
        let home = Uuid::new_v4();
        let elsewhere = Uuid::new_v4();

        for role in [Role::User, Role::Manager, Role::Admin] {
            let principal =
                Principal::resolve(Uuid::new_v4(), role, Some(home), OrganizationScope::Scoped(elsewhere))
                    .expect("principal");
            assert_eq!(principal.effective_organization_id(), Some(home), "{role}");
            assert!(!principal.can_switch_organization());
        }
    }

    #[test]
    fn tenant_role_without_home_is_rejected() {
        assert!(Principal::resolve(Uuid::new_v4(), Role::Admin, None, OrganizationScope::Global).is_none());
    }

    #[test]
    fn super_admin_follows_session_scope() {
        let org = Uuid::new_v4();

        let global = Principal::resolve(Uuid::new_v4(), Role::SuperAdmin, None, OrganizationScope::Global).unwrap();
        assert!(global.is_global());
        assert_eq!(global.effective_organization_id(), None);

        let scoped =
            Principal::resolve(Uuid::new_v4(), Role::SuperAdmin, None, OrganizationScope::Scoped(org)).unwrap();
        assert_eq!(scoped.effective_organization_id(), Some(org));
        assert_eq!(scoped.home_organization_id(), None);
    }

    #[test]
    fn scope_state_machine() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let scope = OrganizationScope::default();
        assert!(scope.is_global());

        let scope = scope.select(a);
        assert_eq!(scope, OrganizationScope::Scoped(a));

        let scope = scope.select(b);
        assert_eq!(scope.selected(), Some(b));

        let scope = scope.clear();
        assert_eq!(scope, OrganizationScope::Global);
        assert_eq!(OrganizationScope::from_selected(Some(a)), OrganizationScope::Scoped(a));
    }
}

use serde::Serialize;
use uuid::Uuid;

use super::principal::Principal;
use super::role::Role;
use crate::errors::{AppError, AppResult};

/// What a caller wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "role")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Create or change a user so that it holds the given role.
    AssignRole(Role),
    SwitchOrganization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Staff,
    ShiftType,
    Team,
    Schedule,
    Request,
    User,
    Organization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capability {
    Read,
    Create,
    Update,
    Delete,
    AssignRole,
    Switch,
}

impl Action {
    fn capability(&self) -> Capability {
        match self {
            Action::Read => Capability::Read,
            Action::Create => Capability::Create,
            Action::Update => Capability::Update,
            Action::Delete => Capability::Delete,
            Action::AssignRole(_) => Capability::AssignRole,
            Action::SwitchOrganization => Capability::Switch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The resource lives in another organization.
    TenantMismatch,
    /// The role lacks the capability for this resource.
    MissingCapability,
    /// The role may not hand out the requested role.
    RoleEscalation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
    Unauthenticated,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts a decision into the error the HTTP layer renders. Messages
    /// never mention the resource or its tenant.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(_) => Err(AppError::forbidden("you do not have permission to perform this action")),
            Decision::Unauthenticated => Err(AppError::unauthenticated("authentication required")),
        }
    }
}

const READ: &[Capability] = &[Capability::Read];
const CRUD: &[Capability] = &[Capability::Read, Capability::Create, Capability::Update, Capability::Delete];
const SCHEDULE_WRITER: &[Capability] = &[Capability::Read, Capability::Create, Capability::Update];
const USER_ADMIN: &[Capability] = &[
    Capability::Read,
    Capability::Create,
    Capability::Update,
    Capability::Delete,
    Capability::AssignRole,
];
const ORGANIZATION_ADMIN: &[Capability] = &[
    Capability::Read,
    Capability::Create,
    Capability::Update,
    Capability::Delete,
    Capability::Switch,
];

/// (role, resource) -> capabilities. Absent pairs grant nothing.
const CAPABILITIES: &[(Role, ResourceKind, &[Capability])] = &[
    (Role::User, ResourceKind::Staff, READ),
    (Role::User, ResourceKind::ShiftType, READ),
    (Role::Manager, ResourceKind::Staff, READ),
    (Role::Manager, ResourceKind::ShiftType, READ),
    (Role::Manager, ResourceKind::Schedule, SCHEDULE_WRITER),
    (Role::Admin, ResourceKind::Staff, CRUD),
    (Role::Admin, ResourceKind::ShiftType, CRUD),
    (Role::Admin, ResourceKind::Team, CRUD),
    (Role::Admin, ResourceKind::Schedule, CRUD),
    (Role::Admin, ResourceKind::Request, CRUD),
    (Role::Admin, ResourceKind::User, USER_ADMIN),
    (Role::Admin, ResourceKind::Organization, READ),
    (Role::SuperAdmin, ResourceKind::Staff, CRUD),
    (Role::SuperAdmin, ResourceKind::ShiftType, CRUD),
    (Role::SuperAdmin, ResourceKind::Team, CRUD),
    (Role::SuperAdmin, ResourceKind::Schedule, CRUD),
    (Role::SuperAdmin, ResourceKind::Request, CRUD),
    (Role::SuperAdmin, ResourceKind::User, USER_ADMIN),
    (Role::SuperAdmin, ResourceKind::Organization, ORGANIZATION_ADMIN),
];

/// Highest role each role may assign to others.
const ASSIGNABLE_CEILING: &[(Role, Role)] = &[(Role::Admin, Role::Admin), (Role::SuperAdmin, Role::SuperAdmin)];

fn granted(role: Role, resource: ResourceKind, capability: Capability) -> bool {
    CAPABILITIES
        .iter()
        .any(|(r, kind, caps)| *r == role && *kind == resource && caps.contains(&capability))
}

fn may_assign(role: Role, target: Role) -> bool {
    ASSIGNABLE_CEILING
        .iter()
        .any(|(r, ceiling)| *r == role && target <= *ceiling)
}

/// Policy evaluator trait for pluggable authorization logic
pub trait PolicyEvaluator: Send + Sync {
    /// Decide whether `principal` may perform `action` on a resource of
    /// `resource` kind owned by `resource_organization_id`. `None` means a
    /// global, cross-tenant request.
    fn authorize(
        &self,
        principal: Option<&Principal>,
        action: Action,
        resource: ResourceKind,
        resource_organization_id: Option<Uuid>,
    ) -> Decision;

    /// Handler-side shorthand: authorize and convert denial into an error.
    fn require(
        &self,
        principal: &Principal,
        action: Action,
        resource: ResourceKind,
        resource_organization_id: Option<Uuid>,
    ) -> AppResult<()> {
        self.authorize(Some(principal), action, resource, resource_organization_id)
            .into_result()
    }
}

/// Table-driven evaluator.
///
/// Evaluation order:
/// 1. no principal -> unauthenticated
/// 2. tenant boundary (global requests count as crossing it, and a
///    super_admin with a selected organization is held to it) -> deny
/// 3. capability table -> deny when absent
/// 4. role ceiling for role assignment -> deny on escalation
/// 5. allow
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicyEvaluator;

impl DefaultPolicyEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn crosses_tenant(
        principal: &Principal,
        action: Action,
        resource: ResourceKind,
        resource_organization_id: Option<Uuid>,
    ) -> bool {
        if principal.role().is_cross_tenant() {
            // A super_admin with a selected organization acts inside it;
            // only choosing where to act reaches other organizations.
            let choosing = action == Action::SwitchOrganization
                || (action == Action::Read && resource == ResourceKind::Organization);
            return match (principal.effective_organization_id(), resource_organization_id) {
                (Some(selected), Some(org)) => selected != org && !choosing,
                _ => false,
            };
        }
        match resource_organization_id {
            Some(org) => principal.effective_organization_id() != Some(org),
            None => true,
        }
    }
}

impl PolicyEvaluator for DefaultPolicyEvaluator {
    fn authorize(
        &self,
        principal: Option<&Principal>,
        action: Action,
        resource: ResourceKind,
        resource_organization_id: Option<Uuid>,
    ) -> Decision {
        // 1. Authentication always comes first
        let Some(principal) = principal else {
            return Decision::Unauthenticated;
        };

        // 2. Tenant boundary
        if Self::crosses_tenant(principal, action, resource, resource_organization_id) {
            tracing::debug!(
                user_id = %principal.user_id(),
                role = %principal.role(),
                ?action,
                ?resource,
                "denied: tenant mismatch"
            );
            return Decision::Deny(DenyReason::TenantMismatch);
        }

        // 3. Capability table
        if !granted(principal.role(), resource, action.capability()) {
            tracing::debug!(
                user_id = %principal.user_id(),
                role = %principal.role(),
                ?action,
                ?resource,
                "denied: missing capability"
            );
            return Decision::Deny(DenyReason::MissingCapability);
        }

        // 4. Role assignment ceiling
        if let Action::AssignRole(target) = action {
            if !may_assign(principal.role(), target) {
                tracing::debug!(
                    user_id = %principal.user_id(),
                    role = %principal.role(),
                    target = %target,
                    "denied: role escalation"
                );
                return Decision::Deny(DenyReason::RoleEscalation);
            }
        }

        tracing::debug!(
            user_id = %principal.user_id(),
            role = %principal.role(),
            ?action,
            ?resource,
            "allowed"
        );
        Decision::Allow
    }
}

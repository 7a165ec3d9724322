use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::session::{Session, SessionManager};
use crate::authz::{Action, PolicyEvaluator, Principal, ResourceKind};
use crate::errors::{AppError, AppResult};
use crate::events::{publish, DomainEvent, EventBus, Severity};

/// Moves a super_admin session into one organization's view.
///
/// The account's home organization is never touched; only the session
/// scope changes.
pub async fn switch_organization(
    pool: &SqlitePool,
    policy: &dyn PolicyEvaluator,
    sessions: &SessionManager,
    events: &EventBus,
    principal: &Principal,
    session: &Session,
    target_organization_id: Uuid,
) -> AppResult<Session> {
    policy.require(
        principal,
        Action::SwitchOrganization,
        ResourceKind::Organization,
        Some(target_organization_id),
    )?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM organizations WHERE id = ?")
        .bind(target_organization_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::not_found("organization not found"));
    }

    let updated = sessions
        .set_scope(session.id, session.scope.select(target_organization_id))
        .await?;

    tracing::info!(
        user_id = %principal.user_id(),
        session_id = %session.id,
        organization_id = %target_organization_id,
        "organization selected"
    );
    publish(
        events,
        DomainEvent::new(
            "session.organization_switched",
            Some(principal.user_id()),
            Some(session.id),
            json!({ "from": session.scope.selected(), "to": target_organization_id }),
        )
        .in_organization(Some(target_organization_id))
        .with_severity(Severity::Critical),
    );

    Ok(updated)
}

/// Returns a super_admin session to the global view.
pub async fn clear_organization_override(
    policy: &dyn PolicyEvaluator,
    sessions: &SessionManager,
    events: &EventBus,
    principal: &Principal,
    session: &Session,
) -> AppResult<Session> {
    policy.require(principal, Action::SwitchOrganization, ResourceKind::Organization, None)?;

    let updated = sessions.set_scope(session.id, session.scope.clear()).await?;

    tracing::info!(user_id = %principal.user_id(), session_id = %session.id, "organization selection cleared");
    publish(
        events,
        DomainEvent::new(
            "session.organization_cleared",
            Some(principal.user_id()),
            Some(session.id),
            json!({ "from": session.scope.selected() }),
        )
        .with_severity(Severity::Critical),
    );

    Ok(updated)
}

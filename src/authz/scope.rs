use uuid::Uuid;

use super::principal::Principal;
use crate::errors::{AppError, AppResult};

/// Anything partitioned by organization.
pub trait TenantScoped {
    /// Owning organization. `None` rows (super_admin accounts) are visible
    /// only from the global scope.
    fn organization_id(&self) -> Option<Uuid>;
}

/// Restricts data to a principal's effective organization.
///
/// Every read and listing path passes its rows through this filter, even
/// when the query already constrained `organization_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantFilter {
    organization_id: Option<Uuid>,
}

impl TenantFilter {
    pub fn for_principal(principal: &Principal) -> Self {
        Self {
            organization_id: principal.effective_organization_id(),
        }
    }

    /// Filter pinned to one organization, used to resolve references
    /// between rows of the same tenant.
    pub fn for_organization(organization_id: Uuid) -> Self {
        Self {
            organization_id: Some(organization_id),
        }
    }

    /// Unrestricted filter for callers allowed to see every organization.
    pub fn global() -> Self {
        Self { organization_id: None }
    }

    /// The organization rows must belong to, `None` for the global view.
    pub fn organization_id(&self) -> Option<Uuid> {
        self.organization_id
    }

    pub fn is_global(&self) -> bool {
        self.organization_id.is_none()
    }

    pub fn admits<T: TenantScoped>(&self, item: &T) -> bool {
        match self.organization_id {
            None => true,
            Some(org) => item.organization_id() == Some(org),
        }
    }

    pub fn apply<T: TenantScoped>(&self, items: Vec<T>) -> Vec<T> {
        let total = items.len();
        let kept: Vec<T> = items.into_iter().filter(|item| self.admits(item)).collect();

        if kept.len() != total {
            tracing::warn!(
                organization_id = ?self.organization_id,
                dropped = total - kept.len(),
                "tenant filter removed rows the query returned"
            );
        }

        kept
    }

    /// Absent and foreign rows are indistinguishable to the caller.
    pub fn visible<T: TenantScoped>(&self, item: Option<T>, what: &str) -> AppResult<T> {
        item.filter(|item| self.admits(item))
            .ok_or_else(|| AppError::not_found(format!("{what} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{OrganizationScope, Role};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        org: Option<Uuid>,
    }

    impl TenantScoped for Row {
        fn organization_id(&self) -> Option<Uuid> {
            self.org
        }
    }

    fn rows(a: Uuid, b: Uuid) -> Vec<Row> {
        vec![
            Row { name: "山田 花子", org: Some(a) },
            Row { name: "鈴木 一郎", org: Some(b) },
            Row { name: "root", org: None },
        ]
    }

    #[test]
    fn member_sees_only_own_tenant() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let admin = Principal::resolve(Uuid::new_v4(), Role::Admin, Some(a), OrganizationScope::Global).unwrap();

        let names: Vec<_> = TenantFilter::for_principal(&admin)
            .apply(rows(a, b))
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["山田 花子"]);
    }

    #[test]
    fn global_super_admin_sees_everything() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let root = Principal::resolve(Uuid::new_v4(), Role::SuperAdmin, None, OrganizationScope::Global).unwrap();

        let filter = TenantFilter::for_principal(&root);
        assert!(filter.is_global());
        assert_eq!(filter.apply(rows(a, b)).len(), 3);
    }

    #[test]
    fn scoped_super_admin_sees_selected_tenant() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let root = Principal::resolve(Uuid::new_v4(), Role::SuperAdmin, None, OrganizationScope::Scoped(b)).unwrap();

        let kept = TenantFilter::for_principal(&root).apply(rows(a, b));
        assert_eq!(kept, vec![Row { name: "鈴木 一郎", org: Some(b) }]);
    }

    #[test]
    fn foreign_row_reads_as_not_found() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let user = Principal::resolve(Uuid::new_v4(), Role::User, Some(a), OrganizationScope::Global).unwrap();
        let filter = TenantFilter::for_principal(&user);

        let foreign = Row { name: "鈴木 一郎", org: Some(b) };
        assert!(matches!(filter.visible(Some(foreign), "staff"), Err(AppError::NotFound(_))));
        assert!(matches!(filter.visible(None::<Row>, "staff"), Err(AppError::NotFound(_))));

        let own = Row { name: "山田 花子", org: Some(a) };
        assert_eq!(filter.visible(Some(own.clone()), "staff").unwrap(), own);
    }
}

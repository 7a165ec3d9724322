//! Authorization module - policy engine and tenant isolation
//!
//! This module implements:
//! - A closed role set with an explicit capability table
//! - Principals resolved per request with their effective organization
//! - The two-state organization scope used by super_admin impersonation
//! - A single tenant filter shared by every tenant-scoped resource

mod evaluator;
mod principal;
mod role;
mod scope;

pub use evaluator::{Action, Decision, DefaultPolicyEvaluator, DenyReason, PolicyEvaluator, ResourceKind};
pub use principal::{OrganizationScope, Principal};
pub use role::{Role, UnknownRole};
pub use scope::{TenantFilter, TenantScoped};

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{IdentityResolver, SessionConfig, SessionManager, SqliteCredentialVerifier, SqliteSessionStore};
use crate::authz::{DefaultPolicyEvaluator, PolicyEvaluator};
use crate::errors::AppError;
use crate::events::{init_event_bus, start_audit_listener, EventBus};
use crate::routes::{auth, health, organizations, requests, schedules, shift_types, staffs, switch, teams, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub sessions: SessionManager,
    pub resolver: IdentityResolver,
    pub policy: Arc<dyn PolicyEvaluator>,
    pub config: Arc<SessionConfig>,
    pub events: EventBus,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: SessionConfig, events: EventBus) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(SqliteSessionStore::new(pool.clone()));
        let verifier = Arc::new(SqliteCredentialVerifier::new(pool.clone()));

        Self {
            sessions: SessionManager::new(store.clone(), verifier, config.clone()),
            resolver: IdentityResolver::new(pool.clone(), store),
            policy: Arc::new(DefaultPolicyEvaluator::new()),
            config,
            events,
            pool,
        }
    }

    /// Reads session settings from the environment and starts the audit
    /// listener. Must be called inside a tokio runtime.
    pub fn from_env(pool: SqlitePool) -> Result<Self, AppError> {
        let config = SessionConfig::from_env()?;
        let (events, rx) = init_event_bus();
        tokio::spawn(start_audit_listener(rx, pool.clone()));

        Ok(Self::new(pool, config, events))
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    Ok(router(AppState::from_env(pool)?))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/password", put(auth::change_password));

    let staff_routes = Router::new()
        .route("/", get(staffs::list_staffs).post(staffs::create_staff))
        .route(
            "/:id",
            get(staffs::get_staff).put(staffs::update_staff).delete(staffs::delete_staff),
        );

    let shift_routes = Router::new()
        .route("/", get(shift_types::list_shift_types).post(shift_types::create_shift_type))
        .route(
            "/:id",
            get(shift_types::get_shift_type)
                .put(shift_types::update_shift_type)
                .delete(shift_types::delete_shift_type),
        );

    let team_routes = Router::new()
        .route("/", get(teams::list_teams).post(teams::create_team))
        .route("/:id", get(teams::get_team).delete(teams::delete_team));

    let schedule_routes = Router::new()
        .route("/", get(schedules::list_schedules).post(schedules::create_schedule))
        .route(
            "/:id",
            get(schedules::get_schedule)
                .put(schedules::update_schedule)
                .delete(schedules::delete_schedule),
        );

    let request_routes = Router::new()
        .route("/", get(requests::list_requests).post(requests::create_request))
        .route("/:id", get(requests::get_request).delete(requests::delete_request));

    let admin_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", put(users::update_user))
        .route(
            "/organizations",
            get(organizations::list_organizations).post(organizations::create_organization),
        )
        .route("/switch-organization", axum::routing::delete(switch::clear_organization))
        .route("/switch-organization/:org_id", post(switch::switch_organization));

    let api = Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth_routes)
        .nest("/staffs", staff_routes)
        .nest("/shifts", shift_routes)
        .nest("/teams", team_routes)
        .nest("/schedules", schedule_routes)
        .nest("/requests", request_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::SessionView;
use crate::authz::Role;
use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::login,
		routes::auth::logout,
		routes::auth::me,
		routes::auth::change_password,
		routes::staffs::list_staffs,
		routes::staffs::create_staff,
		routes::staffs::get_staff,
		routes::staffs::update_staff,
		routes::staffs::delete_staff,
		routes::shift_types::list_shift_types,
		routes::shift_types::create_shift_type,
		routes::shift_types::get_shift_type,
		routes::shift_types::update_shift_type,
		routes::shift_types::delete_shift_type,
		routes::teams::list_teams,
		routes::teams::create_team,
		routes::teams::get_team,
		routes::teams::delete_team,
		routes::schedules::list_schedules,
		routes::schedules::create_schedule,
		routes::schedules::get_schedule,
		routes::schedules::update_schedule,
		routes::schedules::delete_schedule,
		routes::requests::list_requests,
		routes::requests::create_request,
		routes::requests::get_request,
		routes::requests::delete_request,
		routes::users::list_users,
		routes::users::create_user,
		routes::users::update_user,
		routes::organizations::list_organizations,
		routes::organizations::create_organization,
		routes::switch::switch_organization,
		routes::switch::clear_organization
	),
	components(
		schemas(
			Role,
			SessionView,
			routes::health::HealthResponse,
			routes::auth::PrincipalView,
			routes::auth::LoginResponse,
			routes::auth::MessageResponse,
			routes::auth::ChangePasswordRequest,
			routes::switch::SwitchResponse,
			models::user::User,
			models::user::LoginRequest,
			models::user::UserCreateRequest,
			models::user::UserUpdateRequest,
			models::organization::Organization,
			models::organization::OrganizationCreateRequest,
			models::staff::Staff,
			models::staff::StaffCreateRequest,
			models::staff::StaffUpdateRequest,
			models::shift_type::ShiftType,
			models::shift_type::ShiftTypeCreateRequest,
			models::shift_type::ShiftTypeUpdateRequest,
			models::team::Team,
			models::team::TeamCreateRequest,
			models::schedule::Schedule,
			models::schedule::ScheduleStatus,
			models::schedule::ScheduleCreateRequest,
			models::schedule::ScheduleUpdateRequest,
			models::request::ShiftRequest,
			models::request::RequestType,
			models::request::ShiftRequestCreateRequest
		)
	),
	modifiers(&SecurityAddon),
	tags(
		(name = "Auth", description = "Sessions and the current principal"),
		(name = "Staffs", description = "Staff of the effective organization"),
		(name = "Shifts", description = "Shift types"),
		(name = "Teams", description = "Teams and wards"),
		(name = "Schedules", description = "Duty rosters"),
		(name = "Requests", description = "Day-off and shift preference requests"),
		(name = "Admin", description = "Users, organizations and the super_admin organization switch"),
		(name = "Health", description = "Liveness")
	)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		if let Some(components) = openapi.components.as_mut() {
			components.add_security_scheme(
				"bearerAuth",
				SecurityScheme::Http(
					HttpBuilder::new()
						.scheme(HttpAuthScheme::Bearer)
						.bearer_format("JWT")
						.build(),
				),
			);
		}
	}
}

pub fn build_openapi(port: u16) -> utoipa::openapi::OpenApi {
	let mut doc = ApiDoc::openapi();
	doc.servers = Some(vec![Server::new(format!("http://localhost:{port}"))]);
	doc
}

/// Swagger UI at `/docs`, raw document at `/api-docs/openapi.json`.
pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
	let config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	Router::new().merge(
		SwaggerUi::new("/docs")
			.url("/api-docs/openapi.json", doc)
			.config(config),
	)
}

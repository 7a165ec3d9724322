pub mod organization;
pub mod request;
pub mod schedule;
pub mod shift_type;
pub mod staff;
pub mod team;
pub mod user;

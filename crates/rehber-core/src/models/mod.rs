//! Data models for the counseling dashboard API.
//!
//! This module contains the records the remote API returns:
//!
//! - `User`, `LoginData`: The signed-in counselor and the login payload
//! - `DashboardStats`: Aggregate counters shown on the dashboard
//! - `Student`, `Meeting`, `Activity`: Records behind the CRUD screens
//!
//! Wire names follow the API (Turkish field names); Rust names are English.

pub mod activity;
pub mod dashboard;
pub mod meeting;
pub mod student;
pub mod user;

pub use activity::{Activity, ActivityFilter, ActivityInput};
pub use dashboard::DashboardStats;
pub use meeting::{Meeting, MeetingFilter, MeetingInput};
pub use student::{Student, StudentInput};
pub use user::{LoginData, LoginRequest, User};

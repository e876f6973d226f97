//! CropDoctor backend access: gateway, services and wire types.

mod admin;
mod advisory;
pub mod api_types;
mod auth;
mod cache;
mod client;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

pub use admin::AdminService;
pub use advisory::AdvisoryService;
pub use auth::AuthService;
#[cfg(test)]
pub use cache::AdvisoryKey;
pub use client::Gateway;

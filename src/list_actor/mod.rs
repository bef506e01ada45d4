//! The user listing actor: reconciled collection, filter, pagination and
//! mutations of one console context.

pub mod client;
pub mod messages;
pub mod service;

pub use client::UserListClient;
pub use messages::{ListRequest, ServiceResponse, ServiceResult};
pub use service::{ListDeps, ListSettings, ListingSnapshot, LoadState, UserListService};

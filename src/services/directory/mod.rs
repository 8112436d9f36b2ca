pub mod cache;
pub mod client;
pub mod error;
pub mod factory;
pub mod fixture;
pub mod membership;
#[cfg(test)]
pub mod testing;

pub use cache::DirectoryCache;
pub use client::{BindCredentials, UserRecord};
pub use error::MembershipError;
pub use factory::build_directory_client;
pub use membership::MembershipService;

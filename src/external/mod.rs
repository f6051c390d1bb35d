//! Clients for services outside this process: the identity provider and
//! the user-service.

mod client;
pub mod jwks;
pub mod token;
pub mod user_service;

pub use client::{USER_AGENT, build_http_client};
pub use jwks::JwksCache;
pub use token::{AccessTokenProvider, TokenService};
pub use user_service::{
    BasicUser, MemberDirectory, MembershipCounters, UserQuery, UserServiceClient,
    WalletPassStatus,
};

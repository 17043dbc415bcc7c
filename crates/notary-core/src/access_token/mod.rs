//! Access token domain module.

mod model;
mod repository;

pub use model::{AccessToken, TokenGrant, TokenRejection};
pub use repository::AccessTokenRepository;

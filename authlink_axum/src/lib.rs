//! Axum integration for authlink
//!
//! [`authlink_router`] serves the login, signup, account and provider
//! sign-in pages. [`is_authenticated`] and [`is_authorized`] gate
//! application routes, and [`AuthUser`] extracts the signed-in user.

mod error;
mod middleware;
mod pages;
mod redirect;
mod router;
mod session;

pub use error::IntoResponseError;
pub use middleware::{is_authenticated, is_authorized};
pub use router::authlink_router;
pub use session::{AuthRedirect, AuthUser};

pub use authlink::{
    AccessToken, AuthConfig, AuthRegistry, Flash, FlashMessage, InitError, ProviderKind,
    ProviderRegistry, User, UserStore,
};

mod account;
mod credential;
mod errors;
mod link;

pub use account::{
    ProfileUpdate, change_password, register_local_user, unlink_provider, update_profile,
};
pub use credential::verify_credentials;
pub use errors::CoordinationError;
pub use link::{LinkAction, LinkOutcome, resolve_provider_callback};

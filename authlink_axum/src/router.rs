use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use authlink::AuthRegistry;

use super::middleware::is_authenticated;
use super::pages;

/// Routes for login, signup, account management and provider sign-in.
///
/// The returned router carries its own state and can be merged into an
/// application router of any state type.
pub fn authlink_router<S>(registry: Arc<AuthRegistry>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let account = Router::new()
        .route("/account", get(pages::account_page))
        .route("/account/profile", post(pages::update_profile))
        .route("/account/password", post(pages::change_password))
        .route("/account/unlink/{provider}", get(pages::unlink))
        .route_layer(from_fn_with_state(registry.clone(), is_authenticated));

    Router::new()
        .route("/login", get(pages::login_page).post(pages::login))
        .route("/logout", get(pages::logout))
        .route("/signup", get(pages::signup_page).post(pages::signup))
        .route("/auth/{provider}", get(pages::auth_start))
        .route("/auth/{provider}/callback", get(pages::auth_callback))
        .merge(account)
        .with_state(registry)
}

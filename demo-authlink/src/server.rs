use std::{net::SocketAddr, sync::Arc};

use axum::{Router, middleware::from_fn_with_state, routing::get};
use http::{HeaderName, HeaderValue, header};
use tower_http::{
    compression::CompressionLayer, services::ServeDir, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use authlink_axum::{AuthRegistry, authlink_router, is_authenticated, is_authorized};

use crate::handlers::{api, index};

pub(crate) fn app(registry: Arc<AuthRegistry>) -> Router {
    let api_routes = Router::new()
        .route("/api/{provider}", get(api))
        .route_layer(from_fn_with_state(registry.clone(), is_authorized))
        .route_layer(from_fn_with_state(registry.clone(), is_authenticated));

    Router::new()
        .route("/", get(index))
        .merge(api_routes)
        .with_state(registry.clone())
        .merge(authlink_router(registry))
        .fallback_service(ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/public")))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-xss-protection"),
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

pub(crate) async fn serve(port: u16, app: Router) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
}

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace,
};

/// Configures middleware for the application
///
/// Adds a permissive CORS layer and request tracing.
///
/// # Parameters
/// - `app` - The application to configure the middleware for
///
/// # Returns
/// The application with the configured middleware
pub fn configure_middleware(app: Router) -> Router {
    app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any),
    )
    .layer(
        ServiceBuilder::new().layer(
            trace::TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new())
                .on_response(trace::DefaultOnResponse::new()),
        ),
    )
}

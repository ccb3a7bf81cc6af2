mod handlers;
pub mod middleware;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::repo::Repository;
use middleware::{antiforgery_middleware, auth_middleware, SecurityConfig};

pub fn create_router(repo: Repository, security: SecurityConfig) -> Router {
    let app_development = Router::new()
        // Form layouts
        .route("/form-layouts", get(handlers::get_form_layouts))
        .route(
            "/form-layouts/internal",
            get(handlers::get_internal_form_layouts),
        )
        .route(
            "/form-layout/{layout_name}",
            post(handlers::save_form_layout).delete(handlers::delete_form_layout),
        )
        .route(
            "/form-layout-name/{layout_name}",
            post(handlers::update_form_layout_name),
        )
        // Layout settings
        .route(
            "/layout-settings",
            get(handlers::get_layout_settings).post(handlers::save_layout_settings),
        )
        // Layout sets
        .route(
            "/layout-sets",
            get(handlers::get_layout_sets)
                .post(handlers::configure_layout_set)
                .put(handlers::add_layout_set),
        )
        // Rules
        .route(
            "/rule-handler",
            get(handlers::get_rule_handler).post(handlers::save_rule_handler),
        )
        .route(
            "/rule-config",
            get(handlers::get_rule_config).post(handlers::save_rule_config),
        )
        // App information
        .route("/widget-settings", get(handlers::get_widget_settings))
        .route("/option-list-ids", get(handlers::get_option_list_ids))
        .route("/app-version", get(handlers::get_app_version));

    let resources = Router::new()
        .route("/resourcelist", get(handlers::list_resources))
        .route("/addresource", post(handlers::add_resource))
        .route(
            "/{repository}/resource/{id}",
            get(handlers::get_resource).put(handlers::update_resource),
        )
        .route(
            "/{repository}/resource/{id}/validate",
            get(handlers::validate_resource_by_id),
        )
        .route(
            "/{repository}/policy/{id}",
            get(handlers::get_policy).put(handlers::save_policy),
        );

    let designer = Router::new()
        .nest("/designer/api/{org}/{app}/app-development", app_development)
        .nest("/designer/api/{org}/resources/repository", resources)
        .route_layer(from_fn_with_state(security.clone(), antiforgery_middleware))
        .route_layer(from_fn_with_state(security.clone(), auth_middleware));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(designer)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&security)),
        )
        .with_state(repo)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let Some(origins) = &security.cors_origins else {
        return CorsLayer::permissive();
    };
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-xsrf-token"),
            HeaderName::from_static("x-designer-developer"),
        ])
        .allow_credentials(true)
}

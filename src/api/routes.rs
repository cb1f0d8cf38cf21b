use crate::api::handlers::{auth, posts, users};
use crate::api::openapi::ApiDoc;
use crate::api::pipeline::Pipeline;
use crate::AppState;
use axum::{
    routing::{delete, get, post, put, MethodRouter},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// One entry of the route table.
pub struct Route {
    pub path: &'static str,
    pub endpoint: MethodRouter<AppState>,
    pub requires_auth: bool,
}

impl Route {
    fn public(path: &'static str, endpoint: MethodRouter<AppState>) -> Self {
        Self {
            path,
            endpoint,
            requires_auth: false,
        }
    }

    fn protected(path: &'static str, endpoint: MethodRouter<AppState>) -> Self {
        Self {
            path,
            endpoint,
            requires_auth: true,
        }
    }
}

/// Every API route with its method handler and auth requirement.
pub fn route_table() -> Vec<Route> {
    vec![
        // Authentication
        Route::public("/login", post(auth::login)),
        // Users
        Route::public("/users", post(users::create_user)),
        Route::protected("/users", get(users::search_users)),
        Route::protected("/users/{userId}", get(users::get_user)),
        Route::protected("/users/{userId}", put(users::update_user)),
        Route::protected("/users/{userId}", delete(users::delete_user)),
        Route::protected("/users/{userId}/follow", post(users::follow_user)),
        Route::protected("/users/{userId}/unfollow", post(users::unfollow_user)),
        Route::protected("/users/{userId}/followers", get(users::followers)),
        Route::protected("/users/{userId}/following", get(users::following)),
        Route::protected(
            "/users/{userId}/update-password",
            post(users::update_password),
        ),
        // Posts
        Route::protected("/posts", post(posts::create_post)),
        Route::protected("/posts", get(posts::feed)),
        Route::protected("/posts/{postId}", get(posts::get_post)),
        Route::protected("/posts/{postId}", put(posts::update_post)),
        Route::protected("/posts/{postId}", delete(posts::delete_post)),
        Route::protected("/users/{userId}/posts", get(posts::posts_by_user)),
        Route::protected("/posts/{postId}/like", post(posts::like_post)),
        Route::protected("/posts/{postId}/unlike", post(posts::unlike_post)),
    ]
}

/// Builds the API router, wrapping each route in its interceptor pipeline.
///
/// Routes sharing a path are merged, so each method keeps its own pipeline.
pub fn create_router(state: &AppState) -> Router<AppState> {
    route_table()
        .into_iter()
        .fold(Router::new(), |router, route| {
            let pipeline = Pipeline::for_route(route.requires_auth);
            router.route(route.path, pipeline.wrap(route.endpoint, state))
        })
}

async fn health() -> &'static str {
    "OK"
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// The complete application: API routes, health check, OpenAPI document,
/// request tracing and CORS.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(create_router(&state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

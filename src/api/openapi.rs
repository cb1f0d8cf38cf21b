use crate::api::handlers::{auth, posts, users};
use crate::types::{
    ErrorBody, LoginRequest, LoginResponse, NewUser, PasswordChange, Post, PostInput, User,
    UserUpdate,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// Registers the bearer token scheme referenced by protected routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Token returned by `POST /login`, sent as `Authorization: Bearer <token>`",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "DevBook API", description = "Users, posts, likes and a follow graph"),
    modifiers(&SecurityAddon),
    paths(
        auth::login,
        users::create_user,
        users::search_users,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::follow_user,
        users::unfollow_user,
        users::followers,
        users::following,
        users::update_password,
        posts::create_post,
        posts::feed,
        posts::get_post,
        posts::update_post,
        posts::delete_post,
        posts::posts_by_user,
        posts::like_post,
        posts::unlike_post,
    ),
    components(schemas(
        User,
        NewUser,
        UserUpdate,
        PasswordChange,
        Post,
        PostInput,
        LoginRequest,
        LoginResponse,
        ErrorBody,
    )),
    tags(
        (name = "auth", description = "Token issuance"),
        (name = "users", description = "Accounts and follow graph"),
        (name = "posts", description = "Posts, feed and likes")
    )
)]
pub struct ApiDoc;

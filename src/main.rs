use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use moviecircle_backend::{
    AppState,
    config::Config,
    middleware::{auth_middleware, log_errors},
    routes,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'moviecircle_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let state = AppState {
        pool,
        config: config.clone(),
    };

    let public_routes = Router::new()
        .route("/health", get(routes::health::ping))
        // auth
        .route("/auth/register", post(routes::user::handler::register))
        .route("/auth/login", post(routes::user::handler::login))
        // movie catalogue reads
        .route("/movies", get(routes::movie::handler::list_movies))
        .route("/movies/{id}", get(routes::movie::handler::get_movie))
        // reviews and comments are readable without a token
        .route(
            "/ratings/movie/{movie_id}",
            get(routes::rating::handler::get_movie_ratings),
        )
        .route(
            "/comments/movie/{movie_id}",
            get(routes::comment::handler::movie_comments),
        )
        .route(
            "/comments/list/{list_id}",
            get(routes::comment::handler::list_comments),
        )
        // share-token access to public lists
        .route(
            "/lists/shared/{share_id}",
            get(routes::list::handler::get_shared_list),
        )
        // group directory
        .route("/groups", get(routes::group::handler::list_groups))
        .route("/groups/{id}", get(routes::group::handler::get_group));

    let protected_routes = Router::new()
        // current user
        .route(
            "/users/me",
            get(routes::user::handler::me)
                .patch(routes::user::handler::update_profile)
                .delete(routes::user::handler::delete_account),
        )
        .route(
            "/users/me/password",
            put(routes::user::handler::update_password),
        )
        .route("/users/{id}", get(routes::user::handler::get_profile))
        // movie catalogue mutations
        .route("/movies", post(routes::movie::handler::create_movie))
        .route(
            "/movies/{id}",
            put(routes::movie::handler::replace_movie)
                .patch(routes::movie::handler::patch_movie)
                .delete(routes::movie::handler::delete_movie),
        )
        // ratings
        .route("/ratings", post(routes::rating::handler::create_rating))
        .route("/ratings/me", get(routes::rating::handler::my_ratings))
        .route(
            "/ratings/{movie_id}",
            delete(routes::rating::handler::delete_rating),
        )
        // favourites
        .route(
            "/favourites",
            post(routes::favourite::handler::add_favourite)
                .get(routes::favourite::handler::my_favourites),
        )
        .route(
            "/favourites/{movie_id}",
            delete(routes::favourite::handler::remove_favourite),
        )
        // lists
        .route(
            "/lists",
            post(routes::list::handler::create_list).get(routes::list::handler::my_lists),
        )
        .route(
            "/lists/{id}",
            get(routes::list::handler::get_list)
                .patch(routes::list::handler::patch_list)
                .delete(routes::list::handler::delete_list),
        )
        .route(
            "/lists/{id}/movies",
            post(routes::list::handler::add_list_movie),
        )
        .route(
            "/lists/{id}/movies/{movie_id}",
            delete(routes::list::handler::remove_list_movie),
        )
        // groups
        .route("/groups", post(routes::group::handler::create_group))
        .route(
            "/groups/{id}",
            patch(routes::group::handler::patch_group)
                .delete(routes::group::handler::delete_group),
        )
        .route(
            "/groups/{id}/members",
            get(routes::group::handler::get_members),
        )
        .route(
            "/groups/{id}/members/{user_id}",
            delete(routes::group::handler::kick_member),
        )
        .route("/groups/{id}/leave", post(routes::group::handler::leave_group))
        .route(
            "/groups/{id}/transfer",
            post(routes::group::handler::transfer_ownership),
        )
        // join requests
        .route("/groups/{id}/join", post(routes::invitation::handler::join_group))
        .route(
            "/groups/{id}/requests",
            get(routes::invitation::handler::group_join_requests),
        )
        .route(
            "/groups/requests/{id}/accept",
            post(routes::invitation::handler::accept_join_request),
        )
        .route(
            "/groups/requests/{id}/decline",
            post(routes::invitation::handler::decline_join_request),
        )
        // invitations
        .route(
            "/groups/invitations",
            get(routes::invitation::handler::my_invitations),
        )
        .route(
            "/groups/{id}/invitations",
            post(routes::invitation::handler::invite_user)
                .get(routes::invitation::handler::group_invitations),
        )
        .route(
            "/groups/invitations/{id}/accept",
            post(routes::invitation::handler::accept_invitation),
        )
        .route(
            "/groups/invitations/{id}/decline",
            post(routes::invitation::handler::decline_invitation),
        )
        // group favourites
        .route(
            "/groups/{id}/favourites",
            post(routes::group::handler::add_group_favourite)
                .get(routes::group::handler::list_group_favourites),
        )
        .route(
            "/groups/{id}/favourites/{movie_id}",
            delete(routes::group::handler::remove_group_favourite),
        )
        // group comments
        .route(
            "/groups/{id}/comments",
            post(routes::comment::handler::create_group_comment)
                .get(routes::comment::handler::group_comments),
        )
        .route(
            "/groups/comments/{id}",
            patch(routes::comment::handler::patch_group_comment)
                .delete(routes::comment::handler::delete_group_comment),
        )
        // movie/list comments
        .route("/comments", post(routes::comment::handler::create_comment))
        .route(
            "/comments/{id}",
            patch(routes::comment::handler::patch_comment)
                .delete(routes::comment::handler::delete_comment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new().nest(
        &config.api_base_uri.clone(),
        Router::new().merge(public_routes).merge(protected_routes),
    );

    let router = router.layer(axum::middleware::from_fn(log_errors));

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    let app = router.with_state(state.clone());

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

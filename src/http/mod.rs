use std::{sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, Method},
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

pub mod identity;
pub mod payload;
pub mod routes;

use crate::store::Store;

use identity::USER_ID_HEADER;
use routes::{
    add_favorite, add_to_cart, create_recipe, delete_recipe, download_shopping_cart,
    get_current_user, get_ingredient, get_recipe, get_tag, get_user, health_check,
    list_ingredients, list_recipes, list_subscriptions, list_tags, remove_favorite,
    remove_from_cart, subscribe, unsubscribe, update_recipe,
};

pub fn create_router<S: Store + 'static>(store: Arc<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/tags/", get(list_tags::<S>))
        .route("/tags/:id/", get(get_tag::<S>))
        .route("/ingredients/", get(list_ingredients::<S>))
        .route("/ingredients/:id/", get(get_ingredient::<S>))
        .route(
            "/recipes/",
            get(list_recipes::<S>).post(create_recipe::<S>),
        )
        .route(
            "/recipes/download_shopping_cart/",
            get(download_shopping_cart::<S>),
        )
        .route(
            "/recipes/:id/",
            get(get_recipe::<S>)
                .patch(update_recipe::<S>)
                .delete(delete_recipe::<S>),
        )
        .route(
            "/recipes/:id/favorite/",
            post(add_favorite::<S>).delete(remove_favorite::<S>),
        )
        .route(
            "/recipes/:id/shopping_cart/",
            post(add_to_cart::<S>).delete(remove_from_cart::<S>),
        )
        .route("/users/me/", get(get_current_user::<S>))
        .route("/users/subscriptions/", get(list_subscriptions::<S>))
        .route("/users/:id/", get(get_user::<S>))
        .route(
            "/users/:id/subscribe/",
            post(subscribe::<S>).delete(unsubscribe::<S>),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(store)
}

pub async fn start_server<S: Store + 'static>(store: Arc<S>, port: u16) -> std::io::Result<()> {
    let app = create_router(store);

    let address = format!("0.0.0.0:{port}");
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => error!("Failed to listen for Ctrl+C: {e}"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

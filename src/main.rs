use std::sync::Arc;

use authbridge::{AuthConfig, HttpAuthBackend, ProxyState};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let config = AuthConfig::from_env().expect("invalid auth configuration");
    let backend = HttpAuthBackend::new(&config).expect("auth backend client init failed");
    tracing::info!(
        backend = %config.private.api_base_url,
        cookie = %config.public.cookie_name,
        "auth proxy configured"
    );

    let app = authbridge::app(ProxyState::new(config, Arc::new(backend)));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "authbridge listening");
    axum::serve(listener, app).await.expect("server failed");
}

#[tokio::main]
async fn main() {
    concours_observability::init();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let services = match std::env::var("DATABASE_URL") {
        Ok(url) => concours_api::app::services::build_postgres_services(&jwt_secret, &url)
            .await
            .expect("failed to connect to postgres"),
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory store with dev seed data");
            concours_api::app::services::build_dev_services(&jwt_secret)
                .await
                .expect("failed to build dev services")
        }
    };

    let app = concours_api::app::build_app(services);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

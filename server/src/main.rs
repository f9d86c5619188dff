use actix_web::{App, HttpServer};

use server::handlers;
use server::server::spawn_server;
use system::RelayPolicy;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let policy = RelayPolicy::from_env();
    let srv_tx = spawn_server(policy);

    let bind = std::env::var("CHAT_RELAY_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("Listening on {} with {:?}", bind, policy);

    HttpServer::new(move || App::new().data(srv_tx.clone()).configure(handlers::root))
        .bind(bind)?
        .run()
        .await
}

pub mod error;
pub mod routes;

use std::net::TcpListener;

use actix_web::dev::{Server, ServerHandle};
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::{info, warn};

use crate::config::settings::Settings;
use crate::core::scanner::Scanner;

pub struct AppState {
    pub scanner: Scanner,
}

/// Serve `/files` until SIGINT/SIGTERM, then stop accepting connections and
/// drain in-flight requests for at most `settings.shutdown_timeout`.
pub async fn serve(settings: Settings, host: &str, port: u16) -> std::io::Result<()> {
    let shutdown_timeout = settings.shutdown_timeout.as_secs();
    let shared_state = web::Data::new(AppState {
        scanner: Scanner::new(settings),
    });

    let listener = TcpListener::bind((host, port))?;
    info!(host = %host, port, "starting dirsize server");
    println!("Listening on http://{host}:{port}");

    let server = build_server(shared_state, listener, shutdown_timeout)?;
    actix_web::rt::spawn(stop_on_signal(server.handle()));
    server.await?;

    info!("server stopped");
    Ok(())
}

/// Build the server without actix's own signal handling, which turns Ctrl-C
/// into a forced stop. Callers stop it through [`Server::handle`].
pub fn build_server(
    state: web::Data<AppState>,
    listener: TcpListener,
    shutdown_timeout: u64,
) -> std::io::Result<Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::register)
    })
    .disable_signals()
    .shutdown_timeout(shutdown_timeout)
    .listen(listener)?
    .run())
}

async fn stop_on_signal(handle: ServerHandle) {
    wait_for_shutdown_signal().await;
    info!("shutdown signal received, draining in-flight requests");
    handle.stop(true).await;
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => warn!("cannot listen for SIGTERM: {e}"),
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use peerlink_relay::config::RelayConfig;
use peerlink_relay::{Registry, StaticTokenProvider, TcpServer};

fn main() {
    let (config, notes) =
        RelayConfig::resolve(std::env::var("CONFIG").ok(), std::env::args().nth(1));

    let logger = initialize_logger(&config);
    for note in &notes {
        logger.info(note);
    }
    logger.info("PeerLink relay starting...");

    let identity = StaticTokenProvider::new(config.auth.tokens.clone());
    if identity.is_empty() {
        logger.warn("No auth tokens configured; every connection will be rejected");
    }

    run_tcp_server(&config, Registry::new(), Arc::new(identity), logger);
}

fn initialize_logger(config: &RelayConfig) -> logging::Logger {
    let log_path = Path::new(&config.logging.log_file_path);
    match logging::Logger::new(log_path, config.logging.log_level, config.logging.enable_console) {
        Ok(logger) => logger.for_component("Main"),
        Err(e) => {
            eprintln!("Failed to create logger at {}: {}", log_path.display(), e);
            eprintln!("Cannot continue without logging system.");
            std::process::exit(1);
        }
    }
}

fn run_tcp_server(
    config: &RelayConfig,
    registry: Registry,
    identity: Arc<StaticTokenProvider>,
    main_logger: logging::Logger,
) {
    let bind_addr = config.server.bind_addr();
    let tcp_logger = main_logger.for_component("TCP");

    let tcp_server = TcpServer::new(registry, identity, tcp_logger.clone())
        .with_max_connections(config.server.max_connections)
        .with_poll_interval(Duration::from_millis(config.server.poll_interval_ms));

    let tcp_server = if config.server.enable_tls {
        let Some(pkcs12_path) = &config.server.pkcs12_path else {
            tcp_logger.error("TLS enabled but pkcs12_path not set in config");
            std::process::exit(1);
        };
        let password = config.server.pkcs12_password.as_deref().unwrap_or("");

        match tcp_server.with_tls(pkcs12_path, password) {
            Ok(server) => server,
            Err(e) => {
                tcp_logger.error(&format!("Failed to enable TLS: {}", e));
                tcp_logger.error("Relay will NOT start without a valid TLS certificate");
                std::process::exit(1);
            }
        }
    } else {
        tcp_logger.warn("TLS is DISABLED - connections will not be encrypted!");
        tcp_server
    };

    if let Err(e) = tcp_server.start(&bind_addr) {
        tcp_logger.error(&format!("TCP server error: {}", e));
        std::process::exit(1);
    }
}

use tlsmint::cli;

fn install_rustls_provider() {
    use rustls::crypto::{ring, CryptoProvider};

    if CryptoProvider::get_default().is_none() {
        // Losing the race to another installer is fine; a provider is set either way.
        let _ = ring::default_provider().install_default();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_rustls_provider();

    // Load .env before any configuration is read from the environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    cli::run_cli().await
}

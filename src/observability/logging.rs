//! # Structured Logging
//!
//! Span macros for the two entry points of the crate. Every span carries a
//! fresh `request_id` so the lines of one issuance can be grouped.

/// Span around one certificate issuance.
///
/// ```rust,ignore
/// let span = issuance_span!(request.authority(), request.common_name());
/// ```
#[macro_export]
macro_rules! issuance_span {
    ($authority:expr, $common_name:expr) => {
        tracing::info_span!(
            "issuance",
            authority = %$authority,
            common_name = %$common_name,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($authority:expr, $common_name:expr, $($field:tt)*) => {
        tracing::info_span!(
            "issuance",
            authority = %$authority,
            common_name = %$common_name,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Span around one plugin protocol call.
#[macro_export]
macro_rules! plugin_span {
    ($operation:expr) => {
        tracing::info_span!(
            "plugin_call",
            operation = %$operation,
            secret = tracing::field::Empty,
            request_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $secret:expr) => {
        tracing::info_span!(
            "plugin_call",
            operation = %$operation,
            secret = %$secret,
            request_id = %uuid::Uuid::new_v4()
        )
    };
}

/// Log configuration at startup. Tokens are never logged.
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        backend = %config.backend.kind,
        vault_address = %config.backend.vault.address,
        vault_mount_path = %config.backend.vault.mount_path,
        path_prefix = %config.backend.path_prefix,
        cache_ttl_secs = config.backend.cache_ttl.map(|ttl| ttl.as_secs()),
        plugin_socket = %config.plugin.socket_path,
        docker_socket = %config.plugin.docker_socket,
        "tlsmint configuration"
    );
}

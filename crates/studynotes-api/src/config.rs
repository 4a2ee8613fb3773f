//! Environment-driven server configuration.
//!
//! Variables:
//!   STUDYNOTES_BACKEND          - "memory" or "postgres" (default: memory)
//!   STUDYNOTES_BIND             - bind address (default: 127.0.0.1:3000)
//!   STUDYNOTES_MAX_UPLOAD_BYTES - upload size limit (default: 10 MiB)
//!   DATABASE_URL                - required for the postgres backend

use std::net::SocketAddr;

use studynotes_core::{defaults, Error, Result};

/// Which storage backend the repositories run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub backend: BackendKind,
    pub bind: SocketAddr,
    pub database_url: Option<String>,
    pub max_upload_bytes: u64,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let backend = match std::env::var("STUDYNOTES_BACKEND").as_deref() {
            Ok("postgres") => BackendKind::Postgres,
            Ok("memory") | Err(_) => BackendKind::Memory,
            Ok(other) => {
                return Err(Error::Config(format!(
                    "STUDYNOTES_BACKEND must be 'memory' or 'postgres', got '{other}'"
                )))
            }
        };

        let bind_raw =
            std::env::var("STUDYNOTES_BIND").unwrap_or_else(|_| defaults::DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .map_err(|_| Error::Config(format!("STUDYNOTES_BIND is not an address: {bind_raw}")))?;

        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == BackendKind::Postgres && database_url.is_none() {
            return Err(Error::Config(
                "DATABASE_URL is required when STUDYNOTES_BACKEND=postgres".into(),
            ));
        }

        let max_upload_bytes = match std::env::var("STUDYNOTES_MAX_UPLOAD_BYTES") {
            Ok(raw) => raw.parse().map_err(|_| {
                Error::Config(format!(
                    "STUDYNOTES_MAX_UPLOAD_BYTES is not a number: {raw}"
                ))
            })?,
            Err(_) => defaults::MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            backend,
            bind,
            database_url,
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // Only checks the fallback values; env vars are not set in tests.
        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.max_upload_bytes, defaults::MAX_UPLOAD_BYTES);
    }
}

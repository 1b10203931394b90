use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedLink";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;
/// Accepted range for `MEDLINK_SESSION_TTL_SECS`: one minute to 30 days.
pub const SESSION_TTL_RANGE: std::ops::RangeInclusive<u64> = 60..=2_592_000;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medlink_lib=info,tower_http=warn"
}

/// Get the application data directory.
/// ~/MedLink/ on all platforms, falling back to the working directory
/// when no home directory can be resolved.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the local backend database.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("medlink.db")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
    #[error("{0} is required when MEDLINK_BACKEND=supabase")]
    Missing(&'static str),
}

/// Which pair of identity provider + store the portal talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Embedded SQLite database with local accounts.
    Local { db_path: PathBuf },
    /// Hosted GoTrue + PostgREST backend.
    Supabase { url: String, anon_key: String },
}

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub bind: SocketAddr,
    pub backend: Backend,
    pub session_ttl_secs: u64,
}

impl PortalConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment in production,
    /// a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup("MEDLINK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            var: "MEDLINK_BIND",
            value: bind_raw.clone(),
        })?;

        let session_ttl_secs = match lookup("MEDLINK_SESSION_TTL_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if SESSION_TTL_RANGE.contains(&secs) => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "MEDLINK_SESSION_TTL_SECS",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_SESSION_TTL_SECS,
        };

        let backend = match lookup("MEDLINK_BACKEND").as_deref().unwrap_or("local") {
            "local" => Backend::Local {
                db_path: lookup("MEDLINK_DB_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_db_path),
            },
            "supabase" => Backend::Supabase {
                url: lookup("MEDLINK_SUPABASE_URL")
                    .filter(|v| !v.is_empty())
                    .ok_or(ConfigError::Missing("MEDLINK_SUPABASE_URL"))?,
                anon_key: lookup("MEDLINK_SUPABASE_ANON_KEY")
                    .filter(|v| !v.is_empty())
                    .ok_or(ConfigError::Missing("MEDLINK_SUPABASE_ANON_KEY"))?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    var: "MEDLINK_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind,
            backend,
            session_ttl_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("MedLink"));
        assert!(default_db_path().starts_with(app_data_dir()));
    }

    #[test]
    fn defaults_to_local_backend() {
        let config = PortalConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert!(matches!(config.backend, Backend::Local { .. }));
    }

    #[test]
    fn local_backend_honors_db_path() {
        let config =
            PortalConfig::from_lookup(lookup_from(&[("MEDLINK_DB_PATH", "/tmp/portal.db")]))
                .unwrap();
        assert_eq!(
            config.backend,
            Backend::Local {
                db_path: PathBuf::from("/tmp/portal.db")
            }
        );
    }

    #[test]
    fn supabase_backend_requires_url_and_key() {
        let err = PortalConfig::from_lookup(lookup_from(&[("MEDLINK_BACKEND", "supabase")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MEDLINK_SUPABASE_URL")));

        let config = PortalConfig::from_lookup(lookup_from(&[
            ("MEDLINK_BACKEND", "supabase"),
            ("MEDLINK_SUPABASE_URL", "https://demo.supabase.co"),
            ("MEDLINK_SUPABASE_ANON_KEY", "anon"),
        ]))
        .unwrap();
        assert_eq!(
            config.backend,
            Backend::Supabase {
                url: "https://demo.supabase.co".into(),
                anon_key: "anon".into()
            }
        );
    }

    #[test]
    fn rejects_unknown_backend_and_bad_bind() {
        assert!(matches!(
            PortalConfig::from_lookup(lookup_from(&[("MEDLINK_BACKEND", "firebase")])),
            Err(ConfigError::Invalid { var: "MEDLINK_BACKEND", .. })
        ));
        assert!(matches!(
            PortalConfig::from_lookup(lookup_from(&[("MEDLINK_BIND", "not-an-addr")])),
            Err(ConfigError::Invalid { var: "MEDLINK_BIND", .. })
        ));
    }

    #[test]
    fn session_ttl_must_be_in_range() {
        for raw in ["59", "2592001", "18446744073709551615", "-1", "soon"] {
            assert!(
                matches!(
                    PortalConfig::from_lookup(lookup_from(&[("MEDLINK_SESSION_TTL_SECS", raw)])),
                    Err(ConfigError::Invalid { var: "MEDLINK_SESSION_TTL_SECS", .. })
                ),
                "accepted {raw}"
            );
        }
        for (raw, secs) in [("60", 60), ("3600", 3600), ("2592000", 2_592_000)] {
            let config =
                PortalConfig::from_lookup(lookup_from(&[("MEDLINK_SESSION_TTL_SECS", raw)]))
                    .unwrap();
            assert_eq!(config.session_ttl_secs, secs);
        }
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}

//! Workspace-server selection for target-scoped operations.
//!
//! # Design
//! Commands, library and dataset listings, and data access can run against
//! a server addressed three ways: by metadata name, by host and port, or by
//! whatever default the proxy has configured. `Target` makes that choice
//! explicit. `Target::resolve` applies the proxy's precedence to loosely
//! specified arguments: a name wins over a url/port pair, and the pair is
//! only used when both halves are present.

use crate::types::DEFAULT_REPOSITORY;

/// The workspace server an operation runs against.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    /// A server registered in metadata, looked up in `repository`.
    Server { name: String, repository: String },
    /// A server addressed directly.
    Address { url: String, port: u16 },
    /// The server named in the proxy's configuration file.
    #[default]
    Default,
}

impl Target {
    /// A named server in the default repository.
    pub fn server(name: impl Into<String>) -> Self {
        Target::Server {
            name: name.into(),
            repository: DEFAULT_REPOSITORY.to_string(),
        }
    }

    pub fn address(url: impl Into<String>, port: u16) -> Self {
        Target::Address {
            url: url.into(),
            port,
        }
    }

    /// Replace the repository of a `Server` target. Other targets carry no
    /// repository and are returned unchanged.
    pub fn with_repository(self, repository: impl Into<String>) -> Self {
        match self {
            Target::Server { name, .. } => Target::Server {
                name,
                repository: repository.into(),
            },
            other => other,
        }
    }

    /// Pick a target from optional arguments.
    ///
    /// `server_name` takes precedence; otherwise `server_url` and
    /// `server_port` are used if both are given; otherwise the proxy default.
    pub fn resolve(
        server_name: Option<&str>,
        repository: &str,
        server_url: Option<&str>,
        server_port: Option<u16>,
    ) -> Self {
        match (server_name, server_url, server_port) {
            (Some(name), _, _) => Target::Server {
                name: name.to_string(),
                repository: repository.to_string(),
            },
            (None, Some(url), Some(port)) => Target::address(url, port),
            _ => Target::Default,
        }
    }

    /// Server name used to scope the request path, if any.
    pub fn server_name(&self) -> Option<&str> {
        match self {
            Target::Server { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_wins_over_address() {
        let target = Target::resolve(Some("SASApp"), "Foundation", Some("sas.local"), Some(8591));
        assert_eq!(target, Target::server("SASApp"));
    }

    #[test]
    fn address_needs_both_halves() {
        assert_eq!(
            Target::resolve(None, "Foundation", Some("sas.local"), Some(8591)),
            Target::address("sas.local", 8591)
        );
        assert_eq!(
            Target::resolve(None, "Foundation", Some("sas.local"), None),
            Target::Default
        );
        assert_eq!(Target::resolve(None, "Foundation", None, Some(8591)), Target::Default);
    }

    #[test]
    fn nothing_given_is_default() {
        assert_eq!(Target::resolve(None, "Foundation", None, None), Target::Default);
        assert_eq!(Target::default(), Target::Default);
    }

    #[test]
    fn resolve_keeps_repository_for_named_server() {
        let target = Target::resolve(Some("SASApp"), "Custom", None, None);
        assert_eq!(
            target,
            Target::Server {
                name: "SASApp".to_string(),
                repository: "Custom".to_string()
            }
        );
    }

    #[test]
    fn with_repository_only_touches_named_servers() {
        assert_eq!(
            Target::server("SASApp").with_repository("Project").server_name(),
            Some("SASApp")
        );
        assert_eq!(
            Target::address("sas.local", 8591).with_repository("Project"),
            Target::address("sas.local", 8591)
        );
        assert_eq!(Target::Default.server_name(), None);
    }
}

//! Host location and base URL resolution.
//!
//! The client targets one of three API origins depending on where the hosting
//! application runs: a fixed local development origin when loaded from disk,
//! the same host on the API port when on a loopback or private network, and
//! the configured production origin otherwise.

use std::net::Ipv4Addr;

use reqwest::Url;

/// Origin used when the host location is a local file.
pub const LOCAL_DEV_BASE_URL: &str = "http://localhost:8000/api";

/// Placeholder production origin; real deployments override it in config.
pub const DEFAULT_PRODUCTION_BASE_URL: &str = "https://api.tasktrack.example/api";

/// Origin returned by [`derive_origin`] when the base URL cannot be parsed.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";

/// Port the backend listens on when served next to the frontend.
const API_PORT: u16 = 8000;

/// Path prefix of every API route.
const API_PREFIX: &str = "/api";

/// Where the hosting application currently "is": the scheme and hostname it
/// was loaded from plus the page path it is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLocation {
    pub scheme: String,
    pub hostname: String,
    pub path: String,
}

impl HostLocation {
    pub fn new(scheme: &str, hostname: &str, path: &str) -> Self {
        Self {
            scheme: scheme.trim_end_matches(':').to_ascii_lowercase(),
            hostname: hostname.to_ascii_lowercase(),
            path: path.to_string(),
        }
    }

    /// A location loaded from the local filesystem.
    pub fn file(path: &str) -> Self {
        Self::new("file", "", path)
    }

    /// Parse a page URL such as `http://192.168.1.20/tasks`.
    ///
    /// Unparseable input is treated as a local file location so resolution
    /// still lands on the development origin.
    pub fn parse(url: &str) -> Self {
        match Url::parse(url) {
            Ok(parsed) => Self::new(
                parsed.scheme(),
                parsed.host_str().unwrap_or_default(),
                parsed.path(),
            ),
            Err(_) => Self::file(url),
        }
    }

    /// True when there is no network protocol behind this location.
    pub fn is_local_file(&self) -> bool {
        self.scheme == "file" || self.hostname.is_empty()
    }
}

impl Default for HostLocation {
    fn default() -> Self {
        Self::file("/")
    }
}

/// Pick the API base URL for a host location.
pub fn resolve_base_url(location: &HostLocation, production_origin: &str) -> String {
    if location.is_local_file() {
        return LOCAL_DEV_BASE_URL.to_string();
    }

    if is_development_host(&location.hostname) {
        return format!("http://{}:{}{}", location.hostname, API_PORT, API_PREFIX);
    }

    production_origin.to_string()
}

/// Loopback names and RFC 1918 private IPv4 ranges.
pub fn is_development_host(hostname: &str) -> bool {
    if hostname == "localhost" || hostname == "127.0.0.1" {
        return true;
    }

    match hostname.parse::<Ipv4Addr>() {
        Ok(ip) => {
            let [a, b, _, _] = ip.octets();
            a == 10 || (a == 192 && b == 168) || (a == 172 && (16..=31).contains(&b))
        }
        Err(_) => false,
    }
}

/// `scheme://host[:port]` of a base URL, for building non-API links.
pub fn derive_origin(base_url: &str) -> String {
    Url::parse(base_url)
        .ok()
        .and_then(|url| {
            let host = url.host_str()?.to_string();
            Some(match url.port() {
                Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
                None => format!("{}://{}", url.scheme(), host),
            })
        })
        .unwrap_or_else(|| DEFAULT_ORIGIN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web(hostname: &str) -> HostLocation {
        HostLocation::new("https", hostname, "/")
    }

    #[test]
    fn test_file_location_uses_local_dev_origin() {
        let loc = HostLocation::file("/home/me/tasktrack/index.html");
        assert_eq!(resolve_base_url(&loc, DEFAULT_PRODUCTION_BASE_URL), LOCAL_DEV_BASE_URL);

        let loc = HostLocation::new("file:", "", "/");
        assert_eq!(resolve_base_url(&loc, DEFAULT_PRODUCTION_BASE_URL), LOCAL_DEV_BASE_URL);
    }

    #[test]
    fn test_development_hosts_use_api_port() {
        let cases = [
            ("localhost", "http://localhost:8000/api"),
            ("127.0.0.1", "http://127.0.0.1:8000/api"),
            ("192.168.1.20", "http://192.168.1.20:8000/api"),
            ("10.0.0.7", "http://10.0.0.7:8000/api"),
            ("172.16.0.1", "http://172.16.0.1:8000/api"),
            ("172.20.10.5", "http://172.20.10.5:8000/api"),
            ("172.31.255.255", "http://172.31.255.255:8000/api"),
        ];
        for (host, expected) in cases {
            assert_eq!(
                resolve_base_url(&web(host), DEFAULT_PRODUCTION_BASE_URL),
                expected,
                "host {}",
                host
            );
        }
    }

    #[test]
    fn test_other_hosts_use_production_origin() {
        let prod = "https://tasks.acme.test/api";
        for host in [
            "172.15.0.1",
            "172.32.0.1",
            "192.169.0.1",
            "11.0.0.1",
            "tasks.acme.test",
            "10.example.com",
        ] {
            assert_eq!(resolve_base_url(&web(host), prod), prod, "host {}", host);
        }
    }

    #[test]
    fn test_parse_location() {
        let loc = HostLocation::parse("http://192.168.1.20:3000/tasks/5");
        assert_eq!(loc.scheme, "http");
        assert_eq!(loc.hostname, "192.168.1.20");
        assert_eq!(loc.path, "/tasks/5");

        assert!(HostLocation::parse("file:///srv/app/index.html").is_local_file());
        assert!(HostLocation::parse("not a url").is_local_file());
    }

    #[test]
    fn test_derive_origin() {
        assert_eq!(derive_origin("http://localhost:8000/api"), "http://localhost:8000");
        assert_eq!(derive_origin("https://api.tasktrack.example/api"), "https://api.tasktrack.example");
        assert_eq!(derive_origin("::garbage::"), DEFAULT_ORIGIN);
        assert_eq!(derive_origin(""), DEFAULT_ORIGIN);
    }
}

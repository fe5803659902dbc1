/// Ordered candidate endpoints with a cursor on the active one.
#[derive(Debug, Clone)]
pub struct ServerPool {
    endpoints: Vec<String>,
    cursor: usize,
}

impl ServerPool {
    /// `endpoints` must be non-empty; the first entry is the primary.
    pub fn new(endpoints: Vec<String>) -> Self {
        debug_assert!(!endpoints.is_empty(), "server pool needs at least one endpoint");
        Self {
            endpoints,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn current(&self) -> &str {
        &self.endpoints[self.cursor]
    }

    /// Moves to the next endpoint, wrapping at the end. Returns the new active URL.
    pub fn advance(&mut self) -> &str {
        self.cursor = (self.cursor + 1) % self.endpoints.len();
        self.current()
    }

    /// Manual override: selects `url`, appending it to the pool when unknown.
    pub fn select(&mut self, url: &str) {
        match self.endpoints.iter().position(|endpoint| endpoint == url) {
            Some(index) => self.cursor = index,
            None => {
                self.endpoints.push(url.to_string());
                self.cursor = self.endpoints.len() - 1;
            }
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

/// Maps an http(s) endpoint to its ws(s) socket URL. ws(s) endpoints are kept as-is.
pub fn socket_url(endpoint: &str, socket_path: &str) -> String {
    let base = if let Some(rest) = endpoint.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = endpoint.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        endpoint.to_string()
    };
    format!("{}{socket_path}", base.trim_end_matches('/'))
}

/// Maps a ws(s) endpoint to the http(s) base used by the health probe.
pub fn http_base_url(endpoint: &str) -> String {
    if let Some(rest) = endpoint.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = endpoint.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        endpoint.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(urls: &[&str]) -> ServerPool {
        ServerPool::new(urls.iter().map(|url| url.to_string()).collect())
    }

    #[test]
    fn advance_wraps_round_robin() {
        let mut pool = pool(&["http://a", "http://b", "http://c"]);
        assert_eq!(pool.current(), "http://a");
        assert_eq!(pool.advance(), "http://b");
        assert_eq!(pool.advance(), "http://c");
        assert_eq!(pool.advance(), "http://a");
    }

    #[test]
    fn single_endpoint_pool_stays_put() {
        let mut pool = pool(&["http://only"]);
        assert_eq!(pool.advance(), "http://only");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn select_known_and_unknown_urls() {
        let mut pool = pool(&["http://a", "http://b"]);
        pool.select("http://b");
        assert_eq!(pool.current(), "http://b");

        pool.select("http://manual");
        assert_eq!(pool.current(), "http://manual");
        assert_eq!(pool.endpoints(), &["http://a", "http://b", "http://manual"][..]);
        assert_eq!(pool.advance(), "http://a");
    }

    #[test]
    fn socket_url_maps_scheme_and_path() {
        assert_eq!(socket_url("http://host:3000", "/ws"), "ws://host:3000/ws");
        assert_eq!(socket_url("https://host/", "/ws"), "wss://host/ws");
        assert_eq!(socket_url("wss://host", "/stream"), "wss://host/stream");
    }

    #[test]
    fn http_base_url_maps_socket_schemes() {
        assert_eq!(http_base_url("wss://host"), "https://host");
        assert_eq!(http_base_url("ws://host:1"), "http://host:1");
        assert_eq!(http_base_url("http://host"), "http://host");
    }
}

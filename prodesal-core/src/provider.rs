use async_trait::async_trait;

pub mod news;
pub mod weather;

pub use news::NewsProvider;
pub use weather::WeatherProvider;

/// The two external data feeds the dashboard can be wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Weather,
    News,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Weather => "weather",
            Feed::News => "news",
        }
    }

    /// User-facing service name, used in setup notices.
    pub fn display_name(&self) -> &'static str {
        match self {
            Feed::Weather => "Clima",
            Feed::News => "Noticias",
        }
    }
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lightweight reachability check against a configured provider. Used by the
/// administration panel's "probar conexiones" action; must not touch any
/// stored reading.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self) -> bool;
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    // Error bodies are often Spanish text; cutting inside a multi-byte
    // character would panic, so back off to the nearest boundary.
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_names() {
        assert_eq!(Feed::Weather.to_string(), "weather");
        assert_eq!(Feed::News.display_name(), "Noticias");
    }

    #[test]
    fn truncate_body_caps_long_payloads() {
        let long = "x".repeat(500);
        let short = truncate_body(&long);
        assert!(short.len() <= 203);
        assert!(short.ends_with("..."));
        assert_eq!(truncate_body("ok"), "ok");
    }

    #[test]
    fn truncate_body_backs_off_multibyte_boundaries() {
        // Byte 200 lands inside the two-byte "é".
        let mut body = "a".repeat(199);
        body.push('é');
        body.push_str(&"x".repeat(50));

        let short = truncate_body(&body);
        assert_eq!(short, format!("{}...", "a".repeat(199)));
    }
}

//! Operator commands for the proxy toggles.
//!
//! Every command is a pure function of the current settings and its
//! arguments. It returns the new settings and the lines to print, so the
//! console only has to publish one and print the other.

use url::Url;

use crate::proxy::rules::ProxySettings;
use crate::routing::path::normalize_prefix;

/// Result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub settings: ProxySettings,
    pub lines: Vec<String>,
}

impl CommandOutcome {
    fn unchanged(settings: &ProxySettings, lines: Vec<String>) -> Self {
        Self {
            settings: settings.clone(),
            lines,
        }
    }
}

/// Run `proxy <args...>`.
pub fn execute(settings: &ProxySettings, args: &[&str]) -> CommandOutcome {
    match args {
        ["on", rest @ ..] => toggle(settings, rest.first().copied(), true),
        ["off", rest @ ..] => toggle(settings, rest.first().copied(), false),
        ["url"] => CommandOutcome::unchanged(settings, vec!["usage: proxy url <url>".into()]),
        ["url", url, ..] => set_url(settings, url),
        ["status", ..] => CommandOutcome::unchanged(settings, status(settings)),
        [] | ["help", ..] => CommandOutcome::unchanged(settings, help()),
        [other, ..] => {
            let mut lines = vec![format!("Unknown proxy command: {}", other)];
            lines.extend(help());
            CommandOutcome::unchanged(settings, lines)
        }
    }
}

fn toggle(settings: &ProxySettings, prefix: Option<&str>, enabled: bool) -> CommandOutcome {
    let prefix = normalize_prefix(prefix.unwrap_or(""));
    let shown = if prefix.is_empty() { "/" } else { prefix.as_str() };
    let url = settings.url.clone().unwrap_or_default();

    let mut lines = vec![if enabled {
        format!("Requests to {} will be proxied to {}{}", shown, url, shown)
    } else {
        format!("Requests to {} will be handled by local code", shown)
    }];
    if enabled && settings.url.is_none() {
        lines.extend(url_not_set());
    }

    CommandOutcome {
        settings: settings.clone().with_path(&prefix, enabled),
        lines,
    }
}

fn set_url(settings: &ProxySettings, raw: &str) -> CommandOutcome {
    match validate_url(raw) {
        Ok(()) => CommandOutcome {
            settings: settings.clone().with_url(raw),
            lines: vec![format!("Proxy URL set to {}", raw.trim_end_matches('/'))],
        },
        Err(reason) => CommandOutcome::unchanged(
            settings,
            vec![format!("Invalid proxy URL \"{}\": {}", raw, reason)],
        ),
    }
}

/// Accept absolute `http`/`https` URLs only.
pub fn validate_url(raw: &str) -> Result<(), String> {
    let parsed = Url::parse(raw).map_err(|e| e.to_string())?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(()),
        "http" | "https" => Err("missing host".to_string()),
        scheme => Err(format!("unsupported scheme {}", scheme)),
    }
}

/// The `proxy status` listing.
pub fn status(settings: &ProxySettings) -> Vec<String> {
    let Some(url) = &settings.url else {
        return url_not_set();
    };

    let mut lines = vec![
        "Proxy Configuration:".to_string(),
        String::new(),
        format!("The proxy URL is {}", url),
        String::new(),
        "Paths prefixed with [+] will be proxied.".to_string(),
        "Paths prefixed with [-] will not be proxied.".to_string(),
        String::new(),
    ];
    lines.extend(settings.status().into_iter().map(|(prefix, enabled)| {
        format!("[{}] {}/", if enabled { '+' } else { '-' }, prefix)
    }));
    lines
}

fn url_not_set() -> Vec<String> {
    vec![
        "The proxy URL is not set.".to_string(),
        "To set it, type \"proxy url <url>\"".to_string(),
    ]
}

pub fn help() -> Vec<String> {
    [
        "proxy on [prefix]    forward requests under prefix to the proxy URL",
        "proxy off [prefix]   handle requests under prefix locally",
        "proxy url <url>      set the proxy URL",
        "proxy status         list proxied and local prefixes",
        "proxy help           show this message",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://localhost:9000";

    #[test]
    fn test_status_listing() {
        let settings = ProxySettings::new(Some(URL.into()))
            .with_path("/foo/bar", false)
            .with_path("/foo", true);

        assert_eq!(
            execute(&settings, &["status"]).lines,
            vec![
                "Proxy Configuration:",
                "",
                "The proxy URL is http://localhost:9000",
                "",
                "Paths prefixed with [+] will be proxied.",
                "Paths prefixed with [-] will not be proxied.",
                "",
                "[+] /foo/",
                "[-] /foo/bar/",
            ]
        );
    }

    #[test]
    fn test_status_without_url() {
        let settings = ProxySettings::default().with_path("/foo", true);
        assert_eq!(
            execute(&settings, &["status"]).lines,
            vec!["The proxy URL is not set.", "To set it, type \"proxy url <url>\""]
        );
    }

    #[test]
    fn test_on_and_off() {
        let settings = ProxySettings::new(Some(URL.into()));

        let on = execute(&settings, &["on", "/foo/bar/"]);
        assert_eq!(
            on.lines,
            vec!["Requests to /foo/bar will be proxied to http://localhost:9000/foo/bar"]
        );
        assert!(on.settings.is_enabled("/foo/bar"));
        assert!(!settings.is_enabled("/foo/bar"));

        let off = execute(&on.settings, &["off", "/foo/bar"]);
        assert_eq!(off.lines, vec!["Requests to /foo/bar will be handled by local code"]);
        assert!(!off.settings.is_enabled("/foo/bar"));

        let root = execute(&settings, &["on"]);
        assert_eq!(root.settings.paths.get(""), Some(&true));
        assert!(root.settings.is_enabled("/any/path"));
    }

    #[test]
    fn test_url_command() {
        let settings = ProxySettings::default();

        assert_eq!(execute(&settings, &["url"]).lines, vec!["usage: proxy url <url>"]);

        let set = execute(&settings, &["url", "https://api.example.com/"]);
        assert_eq!(set.lines, vec!["Proxy URL set to https://api.example.com"]);
        assert_eq!(set.settings.url.as_deref(), Some("https://api.example.com"));

        let bad = execute(&settings, &["url", "not a url"]);
        assert!(bad.lines[0].starts_with("Invalid proxy URL"));
        assert_eq!(bad.settings, settings);
    }

    #[test]
    fn test_unknown_command_prints_help() {
        let outcome = execute(&ProxySettings::default(), &["sideways"]);
        assert_eq!(outcome.lines[0], "Unknown proxy command: sideways");
        assert_eq!(&outcome.lines[1..], help().as_slice());
    }
}

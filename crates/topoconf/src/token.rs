//! host group tokens
//!
//! Property values refer to host groups with one of two token forms:
//! - bare: `%HOSTGROUP::<name>%`
//! - with port: `%HOSTGROUP::<name>%:<port>` (colon and port optional)
//!
//! Exports produce bare tokens (the port stays in the surrounding text), cluster creation
//! consumes both.
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Marker shared by every token, used for cheap containment checks
pub const TOKEN_MARKER: &str = "%HOSTGROUP";

/// Literal placeholder for "the host running the component"
pub const LOCALHOST: &str = "localhost";

static HOSTGROUP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%HOSTGROUP::(\S+?)%").expect("valid host group regex"));

static HOSTGROUP_PORT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%HOSTGROUP::(\S+?)%:?(\d+)?").expect("valid host group port regex")
});

/// A bare token found in a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// the full `%HOSTGROUP::<name>%` text
    pub text: &'a str,
    pub host_group: &'a str,
}

/// A token including its optional port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortToken<'a> {
    pub host_group: &'a str,
    pub port: Option<&'a str>,
    /// byte range of the whole match, port included
    pub span: Range<usize>,
}

impl PortToken<'_> {
    /// `host` with this token's port attached
    pub fn with_port(&self, host: &str) -> String {
        match self.port {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

/// Renders the bare token for `host_group`
pub fn token_for(host_group: &str) -> String {
    format!("%HOSTGROUP::{host_group}%")
}

/// First bare token in `value`
pub fn find_token(value: &str) -> Option<Token<'_>> {
    HOSTGROUP_REGEX.captures(value).map(|captures| Token {
        text: captures.get(0).expect("group 0 is always present").as_str(),
        host_group: captures.get(1).expect("group 1 is not optional").as_str(),
    })
}

/// All tokens in `value` with their ports, left to right
pub fn find_port_tokens(value: &str) -> impl Iterator<Item = PortToken<'_>> {
    HOSTGROUP_PORT_REGEX.captures_iter(value).map(|captures| {
        let whole = captures.get(0).expect("group 0 is always present");
        PortToken {
            host_group: captures.get(1).expect("group 1 is not optional").as_str(),
            port: captures.get(2).map(|port| port.as_str()),
            span: whole.range(),
        }
    })
}

/// Byte ranges of every bare token in `value`
pub fn token_spans(value: &str) -> Vec<Range<usize>> {
    HOSTGROUP_REGEX
        .find_iter(value)
        .map(|token| token.range())
        .collect()
}

pub fn contains_token(value: &str) -> bool {
    value.contains(TOKEN_MARKER)
}

/// A value with neither a token nor `localhost` was written by the deployer and holds
/// concrete host names that must not be rewritten.
pub fn is_deployer_supplied(value: &str) -> bool {
    !contains_token(value) && !value.contains(LOCALHOST)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bare_token() {
        let token = find_token("hdfs://%HOSTGROUP::master_1%:8020").unwrap();

        assert_eq!(token.text, "%HOSTGROUP::master_1%");
        assert_eq!(token.host_group, "master_1");
        assert_eq!(find_token("hdfs://localhost:8020"), None);
    }

    #[test]
    fn bare_token_is_not_greedy() {
        let token = find_token("%HOSTGROUP::a%,%HOSTGROUP::b%").unwrap();
        assert_eq!(token.host_group, "a");
    }

    #[test]
    fn whitespace_ends_a_token() {
        assert_eq!(find_token("%HOSTGROUP::not a group%"), None);
    }

    #[test]
    fn port_tokens() {
        let value = "%HOSTGROUP::zk_1%:2181,%HOSTGROUP::zk_2%,%HOSTGROUP::zk_3%2888";
        let tokens: Vec<_> = find_port_tokens(value).collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].host_group, "zk_1");
        assert_eq!(tokens[0].port, Some("2181"));
        assert_eq!(tokens[0].span, 0..22);
        assert_eq!(tokens[1].host_group, "zk_2");
        assert_eq!(tokens[1].port, None);
        // the colon is optional
        assert_eq!(tokens[2].port, Some("2888"));
        assert_eq!(tokens[2].span.end, value.len());
    }

    #[test]
    fn with_port() {
        let token = find_port_tokens("%HOSTGROUP::g%:9083").next().unwrap();
        assert_eq!(token.with_port("c6401"), "c6401:9083");
    }

    #[test]
    fn token_round_trip() {
        let rendered = token_for("host_group_1");
        assert_eq!(rendered, "%HOSTGROUP::host_group_1%");
        assert_eq!(find_token(&rendered).unwrap().host_group, "host_group_1");
    }

    #[test]
    fn deployer_supplied() {
        assert!(is_deployer_supplied("zk1.example.com:2181,zk2.example.com:2181"));
        assert!(!is_deployer_supplied("localhost:2181"));
        assert!(!is_deployer_supplied("%HOSTGROUP::zk%:2181"));
    }
}

//! Catalog documents of a runner instance and stream-link parsing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A catalog entry is either a message id in the instance's source channel
/// or a full link to the media's original location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    MessageId(i64),
    Link(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieInfo {
    pub name: String,
    pub genre: String,
    pub language: String,
    pub duration: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadStats {
    pub downloads: u64,
}

/// Extracts `(source chat, message id)` from a stream link. Two shapes are
/// recognized: private deep links (`.../c/<internal>/<message>`, where the
/// internal id gets the `-100` prefix back) and public
/// `t.me/<handle>/<message>` links.
pub fn parse_stream_link(url: &str) -> Option<(String, i64)> {
    static PRIVATE: OnceLock<Regex> = OnceLock::new();
    static PUBLIC: OnceLock<Regex> = OnceLock::new();

    if url.contains("/c/") {
        let re = PRIVATE.get_or_init(|| Regex::new(r"/c/(\d+)/(\d+)").unwrap());
        let caps = re.captures(url)?;
        return Some((format!("-100{}", &caps[1]), caps[2].parse().ok()?));
    }
    let re = PUBLIC.get_or_init(|| Regex::new(r"t\.me/([^/]+)/(\d+)").unwrap());
    let caps = re.captures(url)?;
    Some((format!("@{}", &caps[1]), caps[2].parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn parses_private_deep_links() {
        assert_eq!(
            parse_stream_link("https://t.me/c/1234567890/42"),
            Some(("-1001234567890".to_owned(), 42))
        );
    }

    #[test]
    fn parses_public_links() {
        assert_eq!(
            parse_stream_link("https://t.me/some_channel/77"),
            Some(("@some_channel".to_owned(), 77))
        );
    }

    #[test]
    fn rejects_anything_else() {
        assert_eq!(parse_stream_link("https://example.com/video/1"), None);
        assert_eq!(parse_stream_link("not a link at all"), None);
    }

    #[test]
    fn catalog_entries_serialize_as_bare_values() {
        let mut catalog = BTreeMap::new();
        catalog.insert("123".to_owned(), CatalogEntry::MessageId(456));
        catalog.insert(
            "124".to_owned(),
            CatalogEntry::Link("https://t.me/kanal/9".to_owned()),
        );
        let json = serde_json::to_string(&catalog).unwrap();
        assert_eq!(json, r#"{"123":456,"124":"https://t.me/kanal/9"}"#);

        let back: BTreeMap<String, CatalogEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("123"), Some(&CatalogEntry::MessageId(456)));
        assert_eq!(
            back.get("124"),
            Some(&CatalogEntry::Link("https://t.me/kanal/9".to_owned()))
        );
    }
}

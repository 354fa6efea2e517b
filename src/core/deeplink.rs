use crate::core::catalog::Catalog;
use crate::{Error, Result};
use reqwest::Url;

/// `?city=<id>&topic=<id>` request carried by the page location
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeepLink {
    pub city: Option<String>,
    pub topic: Option<String>,
}

impl DeepLink {
    /// Parses a query string, with or without the leading `?`
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut link = Self::default();
        for (key, value) in url_query_pairs(query) {
            match key.as_str() {
                "city" if !value.is_empty() => link.city = Some(value),
                "topic" if !value.is_empty() => link.topic = Some(value),
                _ => {}
            }
        }
        link
    }

    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|err| Error::InvalidRequest(format!("invalid link {url}: {err}")))?;
        Ok(Self::from_query(parsed.query().unwrap_or_default()))
    }

    /// Reads `window.location.search`; empty when there is no window
    #[cfg(feature = "wasm")]
    pub fn from_location() -> Self {
        web_sys::window()
            .and_then(|window| window.location().search().ok())
            .map(|search| Self::from_query(&search))
            .unwrap_or_default()
    }

    /// City and topic ids when both are present and known to the catalogue
    pub fn resolve<'a>(&'a self, catalog: &Catalog) -> Option<(&'a str, &'a str)> {
        let city = self.city.as_deref()?;
        let topic = self.topic.as_deref()?;
        (catalog.city(city).is_some() && catalog.topic(topic).is_some()).then_some((city, topic))
    }
}

fn url_query_pairs(query: &str) -> Vec<(String, String)> {
    // Url handles percent-decoding and `+`
    match Url::parse(&format!("http://localhost/?{query}")) {
        Ok(url) => url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Link reopening a city, and its topic when one is open
pub fn share_url(base: &str, city: &str, topic: Option<&str>) -> Result<String> {
    let mut url = Url::parse(base)
        .map_err(|err| Error::InvalidRequest(format!("invalid base url {base}: {err}")))?;
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("city", city);
        if let Some(topic) = topic {
            pairs.append_pair("topic", topic);
        }
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let link = DeepLink::from_query("?city=milan&topic=visa&utm=x");
        assert_eq!(link.city.as_deref(), Some("milan"));
        assert_eq!(link.topic.as_deref(), Some("visa"));

        let link = DeepLink::from_query("city=rome");
        assert_eq!(link.topic, None);
    }

    #[test]
    fn test_resolve_requires_both_known() {
        let catalog = Catalog::seeded();
        assert_eq!(
            DeepLink::from_query("city=milan&topic=visa").resolve(&catalog),
            Some(("milan", "visa"))
        );
        assert!(DeepLink::from_query("city=milan").resolve(&catalog).is_none());
        assert!(DeepLink::from_query("city=oslo&topic=visa").resolve(&catalog).is_none());
        assert!(DeepLink::from_query("city=milan&topic=ski").resolve(&catalog).is_none());
    }

    #[test]
    fn test_from_url() {
        let link = DeepLink::from_url("https://example.org/app?topic=food&city=naples").unwrap();
        assert_eq!(link.city.as_deref(), Some("naples"));
        assert!(DeepLink::from_url("not a url").is_err());
    }

    #[test]
    fn test_share_url() {
        assert_eq!(
            share_url("https://example.org/app", "milan", None).unwrap(),
            "https://example.org/app?city=milan"
        );
        assert_eq!(
            share_url("https://example.org/app?old=1", "milan", Some("visa")).unwrap(),
            "https://example.org/app?city=milan&topic=visa"
        );
    }
}

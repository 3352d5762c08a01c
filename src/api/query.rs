//! Typed filters for the list endpoints, rendered as query strings.

use crate::api::models::Sentiment;

/// Sentinel the filter forms use for "no constraint"
pub const ALL: &str = "all";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TweetFilter {
    pub query: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub keywords: Vec<String>,
    pub min_importance: Option<f64>,
    pub sort_by: Option<String>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl TweetFilter {
    pub fn is_empty(&self) -> bool {
        self.to_pairs().is_empty()
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(query) = non_blank(self.query.as_deref()) {
            pairs.push(("query", query.to_string()));
        }
        if let Some(sentiment) = self.sentiment {
            if sentiment != Sentiment::Unknown {
                pairs.push(("sentiment", sentiment.as_str().to_string()));
            }
        }
        for keyword in &self.keywords {
            if let Some(keyword) = non_blank(Some(keyword)) {
                pairs.push(("keywords", keyword.to_string()));
            }
        }
        if let Some(min) = self.min_importance {
            pairs.push(("min_importance", min.to_string()));
        }
        if let Some(sort_by) = non_blank(self.sort_by.as_deref()) {
            pairs.push(("sort_by", sort_by.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertFilter {
    pub alert_type: Option<String>,
    pub severity: Option<String>,
    pub is_read: Option<bool>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl AlertFilter {
    /// The dashboard's "latest unread" panel
    pub fn latest_unread(limit: u32) -> Self {
        Self {
            is_read: Some(false),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(alert_type) = non_blank(self.alert_type.as_deref()) {
            pairs.push(("alert_type", alert_type.to_string()));
        }
        if let Some(severity) = non_blank(self.severity.as_deref()) {
            pairs.push(("severity", severity.to_string()));
        }
        if let Some(is_read) = self.is_read {
            pairs.push(("is_read", is_read.to_string()));
        }
        pairs
    }
}

/// Blank values and the `all` sentinel mean "no filter".
fn non_blank(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL)
}

/// Render `pairs` as `?k=v&...`, percent-encoding every value.
pub fn encode_query<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
    if pairs.is_empty() {
        return String::new();
    }

    let encoded: Vec<String> = pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect();

    format!("?{}", encoded.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_query() {
        let filter = TweetFilter::default();
        assert!(filter.is_empty());
        assert_eq!(encode_query(&filter.to_pairs()), "");
    }

    #[test]
    fn test_all_sentinel_is_dropped() {
        let filter = TweetFilter {
            query: Some("  ".to_string()),
            keywords: vec![ALL.to_string()],
            sort_by: Some(ALL.to_string()),
            ..TweetFilter::default()
        };
        assert!(filter.is_empty());
    }

    #[test]
    fn test_tweet_filter_encodes_persian_query() {
        let filter = TweetFilter {
            query: Some("قیمت دلار".to_string()),
            sentiment: Some(Sentiment::Negative),
            keywords: vec!["دلار".to_string(), "ارز".to_string()],
            min_importance: Some(3.5),
            ..TweetFilter::default()
        };

        let query = encode_query(&filter.to_pairs());
        assert!(query.starts_with("?query=%D9%82"));
        assert!(query.contains("&sentiment=negative"));
        assert_eq!(query.matches("keywords=").count(), 2);
        assert!(query.ends_with("&min_importance=3.5"));
    }

    #[test]
    fn test_alert_filter_latest_unread() {
        let query = encode_query(&AlertFilter::latest_unread(5).to_pairs());
        assert_eq!(query, "?limit=5&is_read=false");
    }

    #[test]
    fn test_alert_filter_full() {
        let filter = AlertFilter {
            alert_type: Some("volume_wave".to_string()),
            severity: Some("high".to_string()),
            is_read: Some(true),
            skip: None,
            limit: Some(10),
        };
        assert_eq!(
            encode_query(&filter.to_pairs()),
            "?limit=10&alert_type=volume_wave&severity=high&is_read=true"
        );
    }
}

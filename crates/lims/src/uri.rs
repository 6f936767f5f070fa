//! Canonical resource URI construction.
//!
//! Every resource lives under the API root (`{base}/api/v2/`). URIs are
//! deterministic: same category, segments, and parameters always produce
//! the same string, which matters because the entity cache keys on it.

use url::Url;

use crate::error::Result;

/// The API root, with `api/v2/` appended exactly once.
#[derive(Debug, Clone)]
pub struct BaseUri {
    root: Url,
}

impl BaseUri {
    /// Parses a base URL (`http://lims.example.com`) into an API root.
    /// A trailing `api/v2` in the input is accepted and not duplicated.
    pub fn new(base: &str) -> Result<BaseUri> {
        let mut text = base.trim_end_matches('/').to_string();
        if !text.ends_with("/api/v2") {
            text.push_str("/api/v2");
        }
        text.push('/');
        Ok(BaseUri {
            root: Url::parse(&text)?,
        })
    }

    /// The API root as a string, with trailing slash.
    pub fn as_str(&self) -> &str {
        self.root.as_str()
    }

    /// Builds `{root}/{category}/{segments...}`.
    pub fn uri(&self, category: &str, segments: &[&str]) -> String {
        let mut url = self.root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.push(category);
            for segment in segments {
                path.push(segment);
            }
        }
        url.to_string()
    }

    /// Builds `{root}/{category}/{segments...}?{params...}`, parameters in
    /// the given order.
    pub fn uri_with_params(
        &self,
        category: &str,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> String {
        let uri = self.uri(category, segments);
        if params.is_empty() {
            return uri;
        }
        match Url::parse(&uri) {
            Ok(mut url) => {
                url.query_pairs_mut().extend_pairs(params.iter().copied());
                url.to_string()
            }
            Err(_) => uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_api_root_once() {
        let a = BaseUri::new("http://lims.example.com:4040").unwrap();
        let b = BaseUri::new("http://lims.example.com:4040/").unwrap();
        let c = BaseUri::new("http://lims.example.com:4040/api/v2/").unwrap();
        assert_eq!(a.as_str(), "http://lims.example.com:4040/api/v2/");
        assert_eq!(b.as_str(), a.as_str());
        assert_eq!(c.as_str(), a.as_str());
    }

    #[test]
    fn test_uri_is_deterministic() {
        let base = BaseUri::new("http://lims.example.com:4040").unwrap();
        assert_eq!(
            base.uri("steps", &["s1", "actions"]),
            "http://lims.example.com:4040/api/v2/steps/s1/actions"
        );
        assert_eq!(
            base.uri("steps", &["s1", "actions"]),
            base.uri("steps", &["s1", "actions"])
        );
    }

    #[test]
    fn test_uri_with_params_encodes() {
        let base = BaseUri::new("http://lims.example.com:4040").unwrap();
        assert_eq!(
            base.uri_with_params("artifacts", &[], &[("udf.Conc", "4 2"), ("type", "Analyte")]),
            "http://lims.example.com:4040/api/v2/artifacts?udf.Conc=4+2&type=Analyte"
        );
    }
}

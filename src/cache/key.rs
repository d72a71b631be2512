use std::fmt;

/// Deterministic cache key: `op:name=value&name=value`.
///
/// Values are percent-encoded, so a query containing `&` or `=` cannot be
/// mistaken for another parameter tuple. Floats use their shortest round-trip
/// representation, so distinct coordinates never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn builder(operation: &str) -> CacheKeyBuilder {
        CacheKeyBuilder {
            operation: operation.to_string(),
            params: Vec::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct CacheKeyBuilder {
    operation: String,
    params: Vec<(&'static str, String)>,
}

impl CacheKeyBuilder {
    pub fn param(mut self, name: &'static str, value: impl fmt::Display) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    pub fn build(self) -> CacheKey {
        let params = self
            .params
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        CacheKey(format!("{}:{}", self.operation, params))
    }
}

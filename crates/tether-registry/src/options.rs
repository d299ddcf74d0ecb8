//! Registry configuration.

/// Options applied while registering modules and classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Prefix removed from exposed function names (`tether_strlen` → `strlen`).
    pub strip_prefix: Option<String>,
    /// Fall back to the lower-cased name when an exact lookup misses.
    pub case_insensitive: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            strip_prefix: Some("tether_".to_string()),
            case_insensitive: true,
        }
    }
}

impl RegistryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    pub fn keep_prefix(mut self) -> Self {
        self.strip_prefix = None;
        self
    }

    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// The guest name for a declared name.
    ///
    /// A name that is exactly the prefix is kept as is.
    pub fn exposed_name<'a>(&self, name: &'a str) -> &'a str {
        match &self.strip_prefix {
            Some(prefix) => match name.strip_prefix(prefix.as_str()) {
                Some(rest) if !rest.is_empty() => rest,
                _ => name,
            },
            None => name,
        }
    }
}

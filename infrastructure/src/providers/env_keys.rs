//! Process-environment API key lookup

use council_application::ApiKeyResolver;

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves key variables from the process environment.
///
/// Unset, non-unicode and blank values all count as missing.
pub struct EnvApiKeyResolver {
    lookup: Lookup,
}

impl EnvApiKeyResolver {
    /// Resolver reading the process environment
    pub fn from_env() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvApiKeyResolver {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ApiKeyResolver for EnvApiKeyResolver {
    fn resolve(&self, env_var: &str) -> Option<String> {
        (self.lookup)(env_var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

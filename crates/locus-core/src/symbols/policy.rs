//! Which modules get symbols loaded.
//!
//! ## Environment Variables
//!
//! - `LOCUS_LOAD_SYMBOLS`: `0`, `false`, `no` or `off` disables symbol loading entirely
//! - `LOCUS_SYMBOL_SKIP_PREFIXES`: comma separated file-name prefixes to skip
//!   (default: `System.,SOS.`; an empty value skips nothing)

use std::env;

use crate::modules::path::file_name;

/// File-name prefixes of framework assemblies we never load symbols for.
pub const DEFAULT_SKIP_PREFIXES: &[&str] = &["System.", "SOS."];

/// Default `should_load_symbols` predicate for [`crate::modules::ModuleRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLoadPolicy
{
    enabled: bool,
    skip_prefixes: Vec<String>,
}

impl Default for SymbolLoadPolicy
{
    fn default() -> Self
    {
        Self {
            enabled: true,
            skip_prefixes: DEFAULT_SKIP_PREFIXES.iter().map(|prefix| (*prefix).to_string()).collect(),
        }
    }
}

impl SymbolLoadPolicy
{
    /// Policy that loads symbols for every module.
    pub fn load_all() -> Self
    {
        Self {
            enabled: true,
            skip_prefixes: Vec::new(),
        }
    }

    /// Policy that never loads symbols.
    pub fn disabled() -> Self
    {
        Self {
            enabled: false,
            skip_prefixes: Vec::new(),
        }
    }

    /// Build a policy from `LOCUS_LOAD_SYMBOLS` and `LOCUS_SYMBOL_SKIP_PREFIXES`,
    /// falling back to [`SymbolLoadPolicy::default`] for anything unset.
    pub fn from_env() -> Self
    {
        Self::from_values(
            env::var("LOCUS_LOAD_SYMBOLS").ok().as_deref(),
            env::var("LOCUS_SYMBOL_SKIP_PREFIXES").ok().as_deref(),
        )
    }

    fn from_values(load: Option<&str>, prefixes: Option<&str>) -> Self
    {
        let mut policy = Self::default();
        if let Some(load) = load {
            policy.enabled = !matches!(load.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        if let Some(prefixes) = prefixes {
            policy.skip_prefixes = prefixes
                .split(',')
                .map(str::trim)
                .filter(|prefix| !prefix.is_empty())
                .map(str::to_string)
                .collect();
        }
        policy
    }

    /// Add another file-name prefix to skip.
    #[must_use]
    pub fn with_skip_prefix(mut self, prefix: impl Into<String>) -> Self
    {
        self.skip_prefixes.push(prefix.into());
        self
    }

    pub fn skip_prefixes(&self) -> &[String]
    {
        &self.skip_prefixes
    }

    /// Decide for a module path. Only the file-name component is matched.
    pub fn should_load(&self, module_path: &str) -> bool
    {
        if !self.enabled {
            return false;
        }
        let name = file_name(module_path);
        !self.skip_prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_default_skips_framework_assemblies()
    {
        let policy = SymbolLoadPolicy::default();
        assert!(!policy.should_load("/usr/share/dotnet/System.Private.CoreLib.dll"));
        assert!(!policy.should_load("C:\\tools\\SOS.NETCore.dll"));
        assert!(policy.should_load("/app/bin/MyApp.dll"));
        // Prefix is matched against the file name, not the directory.
        assert!(policy.should_load("/opt/System.Things/MyApp.dll"));
    }

    #[test]
    fn test_from_values_overrides_prefixes()
    {
        let policy = SymbolLoadPolicy::from_values(None, Some(" Microsoft. , Newtonsoft.,"));
        assert_eq!(policy.skip_prefixes(), ["Microsoft.".to_string(), "Newtonsoft.".to_string()]);
        assert!(policy.should_load("System.Linq.dll"));
        assert!(!policy.should_load("Newtonsoft.Json.dll"));
    }

    #[test]
    fn test_from_values_empty_prefix_list_loads_everything()
    {
        let policy = SymbolLoadPolicy::from_values(Some("1"), Some(""));
        assert_eq!(policy, SymbolLoadPolicy::load_all());
    }

    #[test]
    fn test_from_values_disable()
    {
        for value in ["0", "false", "OFF", "no"] {
            let policy = SymbolLoadPolicy::from_values(Some(value), None);
            assert!(!policy.should_load("MyApp.dll"), "{value} should disable loading");
        }
        assert!(!SymbolLoadPolicy::disabled().should_load("MyApp.dll"));
    }

    #[test]
    fn test_with_skip_prefix()
    {
        let policy = SymbolLoadPolicy::load_all().with_skip_prefix("Generated.");
        assert!(!policy.should_load("/tmp/Generated.Proxies.dll"));
        assert!(policy.should_load("/tmp/MyApp.dll"));
    }
}

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock, RwLock};

use tracing::{debug, instrument};

use crate::framework::Framework;
use crate::known::{COMPATIBILITY_MAPPINGS, CompatibilityMapping, KNOWN_FRAMEWORKS};

/// Moniker for assets that apply to every framework.
pub const ANY_FRAMEWORK: &str = "any";

static RESOLVER: LazyLock<Resolver> = LazyLock::new(Resolver::default);

/// Every moniker a project targeting `moniker` can consume, including the
/// moniker itself (canonicalised) and [`ANY_FRAMEWORK`].
///
/// Monikers that cannot be parsed resolve to themselves plus `"any"`.
///
/// ```
/// let frameworks = burrow_frameworks::compatible_frameworks("netcoreapp3.1");
/// assert!(frameworks.contains("netstandard2.1"));
/// assert!(frameworks.contains("netcoreapp2.0"));
/// assert!(frameworks.contains("any"));
/// assert!(!frameworks.contains("net472"));
/// ```
pub fn compatible_frameworks(moniker: &str) -> Arc<BTreeSet<String>> {
    RESOLVER.compatible_frameworks(moniker)
}

/// Framework resolver with a per-framework memo.
///
/// The tables are static; the cache only ever grows, so readers never observe
/// a partially computed entry.
#[derive(Default)]
pub struct Resolver {
    cache: RwLock<HashMap<Framework, Arc<BTreeSet<String>>>>,
}
impl Resolver {
    #[instrument(level = "trace", skip(self))]
    pub fn compatible_frameworks(&self, moniker: &str) -> Arc<BTreeSet<String>> {
        let Ok(framework) = Framework::parse(moniker) else {
            debug!(moniker, "unrecognised framework moniker");
            return Arc::new(BTreeSet::from([moniker.to_string(), ANY_FRAMEWORK.to_string()]));
        };
        if let Ok(cache) = self.cache.read()
            && let Some(hit) = cache.get(&framework)
        {
            return Arc::clone(hit);
        }
        let computed = Arc::new(Self::expand(&framework));
        // A poisoned lock only means another reader panicked; the memo is
        // optional so carry on without it.
        if let Ok(mut cache) = self.cache.write() {
            return Arc::clone(cache.entry(framework).or_insert(computed));
        }
        computed
    }

    fn expand(framework: &Framework) -> BTreeSet<String> {
        let rules = COMPATIBILITY_MAPPINGS
            .iter()
            .filter(|rule| rule.target.satisfies(framework))
            .collect::<Vec<&CompatibilityMapping>>();
        let mut result = BTreeSet::from([ANY_FRAMEWORK.to_string(), framework.short_folder_name()]);
        for known in KNOWN_FRAMEWORKS {
            let same_family_older = known.family == framework.family && known.version <= framework.version;
            if same_family_older || rules.iter().any(|rule| rule.supported.satisfies(known)) {
                result.insert(known.short_folder_name());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("net472", &["net472", "net471", "net45", "net20", "netstandard2.0", "netstandard1.0", "any"])]
    #[case("net45", &["net45", "net40", "netstandard1.1", "netstandard1.0"])]
    #[case("netcoreapp2.1", &["netcoreapp2.0", "netcoreapp1.0", "netstandard2.0", "netstandard1.6"])]
    #[case("net8.0", &["net8.0", "net5.0", "netcoreapp3.1", "netstandard2.1"])]
    #[case("netstandard1.3", &["netstandard1.3", "netstandard1.0"])]
    fn test_includes(#[case] moniker: &str, #[case] expected: &[&str]) {
        let frameworks = compatible_frameworks(moniker);
        for name in expected {
            assert!(frameworks.contains(*name), "{moniker} should include {name}: {frameworks:?}");
        }
    }

    #[rstest]
    #[case("net45", &["net451", "netstandard1.2", "netcoreapp1.0"])]
    #[case("netcoreapp2.1", &["netstandard2.1", "netcoreapp2.2", "net461"])]
    #[case("netstandard2.0", &["netstandard2.1", "net461", "netcoreapp2.0"])]
    #[case("net40", &["netstandard1.0"])]
    fn test_excludes(#[case] moniker: &str, #[case] unexpected: &[&str]) {
        let frameworks = compatible_frameworks(moniker);
        for name in unexpected {
            assert!(!frameworks.contains(*name), "{moniker} should not include {name}: {frameworks:?}");
        }
    }

    #[rstest]
    #[case("net472")]
    #[case("netstandard2.0")]
    #[case("net6.0")]
    #[case("net6.0-windows")]
    #[case("tizen40")]
    fn test_always_contains_self_and_any(#[case] moniker: &str) {
        let frameworks = compatible_frameworks(moniker);
        assert!(frameworks.contains(ANY_FRAMEWORK));
        assert!(frameworks.contains(moniker));
    }

    #[test]
    fn test_unknown_moniker() {
        let frameworks = compatible_frameworks("tizen40");
        assert_eq!(frameworks.iter().map(String::as_str).collect::<Vec<_>>(), ["any", "tizen40"]);
    }

    #[test]
    fn test_aliases_share_cache_entry() {
        let resolver = Resolver::default();
        let short = resolver.compatible_frameworks("net472");
        let long = resolver.compatible_frameworks(".NETFramework,Version=v4.7.2");
        assert!(Arc::ptr_eq(&short, &long));
    }

    #[test]
    fn test_monotonic_within_family() {
        // A newer framework never loses compatibility an older one had.
        let older = compatible_frameworks("net461");
        let newer = compatible_frameworks("net48");
        assert!(older.is_subset(&newer));
    }
}

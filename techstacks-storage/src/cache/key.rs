//! Cache key construction.
//!
//! Keys are `{request type}/{qualifier}` strings, except the overview which
//! uses a fixed literal. The inner representation is private so every key
//! goes through one of the named constructors below.

use std::fmt;

const GET_STACK_PREFIX: &str = "GetStack";
const FIND_STACKS_PREFIX: &str = "FindStacks";
const OVERVIEW_KEY: &str = "overview";

/// A cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    inner: CacheKeyInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct CacheKeyInner {
    encoded: String,
}

impl CacheKey {
    fn from_parts(prefix: &str, qualifier: &str) -> Self {
        Self {
            inner: CacheKeyInner {
                encoded: format!("{}/{}", prefix, qualifier),
            },
        }
    }

    /// Key for a single-stack lookup, qualified by the raw slug or id the
    /// caller asked for.
    pub fn stack(slug_or_id: &str) -> Self {
        Self::from_parts(GET_STACK_PREFIX, slug_or_id)
    }

    /// Key for a filtered listing, qualified by the full query string.
    pub fn find_stacks(raw_query: &str) -> Self {
        Self::from_parts(FIND_STACKS_PREFIX, raw_query)
    }

    /// Key for the aggregate overview.
    pub fn overview() -> Self {
        Self {
            inner: CacheKeyInner {
                encoded: OVERVIEW_KEY.to_string(),
            },
        }
    }

    /// The encoded key.
    pub fn as_str(&self) -> &str {
        &self.inner.encoded
    }

    /// Request-type component, used as a metrics label.
    pub fn kind(&self) -> &str {
        self.as_str()
            .split_once('/')
            .map_or(self.as_str(), |(prefix, _)| prefix)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_formats() {
        assert_eq!(CacheKey::stack("go-web-server").as_str(), "GetStack/go-web-server");
        assert_eq!(CacheKey::stack("42").as_str(), "GetStack/42");
        assert_eq!(
            CacheKey::find_stacks("name_contains=rust&take=5").as_str(),
            "FindStacks/name_contains=rust&take=5"
        );
        assert_eq!(CacheKey::overview().as_str(), "overview");
    }

    #[test]
    fn test_key_kind() {
        assert_eq!(CacheKey::stack("x").kind(), "GetStack");
        assert_eq!(CacheKey::find_stacks("").kind(), "FindStacks");
        assert_eq!(CacheKey::overview().kind(), "overview");
    }

    #[test]
    fn test_request_types_never_collide() {
        let keys: HashSet<CacheKey> = [
            CacheKey::stack("overview"),
            CacheKey::find_stacks("overview"),
            CacheKey::overview(),
        ]
        .into_iter()
        .collect();
        assert_eq!(keys.len(), 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_distinct_qualifiers_give_distinct_keys(a in ".{0,40}", b in ".{0,40}") {
            prop_assume!(a != b);
            prop_assert_ne!(CacheKey::stack(&a), CacheKey::stack(&b));
            prop_assert_ne!(CacheKey::find_stacks(&a), CacheKey::find_stacks(&b));
        }

        #[test]
        fn prop_stack_and_find_keys_are_disjoint(a in ".{0,40}", b in ".{0,40}") {
            prop_assert_ne!(CacheKey::stack(&a), CacheKey::find_stacks(&b));
            prop_assert_ne!(CacheKey::stack(&a), CacheKey::overview());
        }
    }
}

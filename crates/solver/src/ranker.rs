//! Candidate ranking
//!
//! Turns the unordered implementations of one interface into the order the
//! solver tries them in, dropping the ones the policy rules out entirely.

use crate::diagnostics::{RejectReason, Rejection};
use std::cmp::Ordering;
use tracing::debug;
use zi_catalog::{Candidate, Catalog};
use zi_types::{NetworkUse, Policy, Stability};

/// Ranked candidates for one interface
#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    /// Candidates to try, best first; the fallback tier comes last
    pub candidates: Vec<Candidate<'a>>,
    /// Index of the first below-threshold candidate
    pub fallback_start: usize,
    /// Candidates filtered out, with the reason
    pub excluded: Vec<Rejection>,
}

impl Ranking<'_> {
    /// Whether the catalog had nothing at all for the interface
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.candidates.is_empty() && self.excluded.is_empty()
    }
}

/// Orders candidates according to a policy
#[derive(Debug, Clone, Copy)]
pub struct Ranker<'a> {
    catalog: &'a Catalog,
    policy: &'a Policy,
}

impl<'a> Ranker<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, policy: &'a Policy) -> Self {
        Self { catalog, policy }
    }

    /// Rank every implementation the catalog knows for `interface`
    #[must_use]
    pub fn rank(&self, interface: &str) -> Ranking<'a> {
        let mut excluded = Vec::new();
        let mut primary = Vec::new();
        let mut fallback = Vec::new();

        for candidate in self.catalog.implementations_for(interface) {
            let implementation = candidate.implementation;
            let cached = self.catalog.is_cached(implementation);

            if let Some(reason) = self.exclusion(candidate, cached) {
                excluded.push(Rejection {
                    id: implementation.id.clone(),
                    version: implementation.version.clone(),
                    reason,
                });
                continue;
            }

            if implementation.stability >= self.policy.stability_threshold {
                primary.push((candidate, cached));
            } else {
                fallback.push((candidate, cached));
            }
        }

        // stable sort: ties keep catalog order
        primary.sort_by(|a, b| self.compare(a, b));
        fallback.sort_by(|a, b| self.compare(a, b));

        let fallback_start = primary.len();
        let candidates: Vec<Candidate<'a>> = primary
            .into_iter()
            .chain(fallback)
            .map(|(candidate, _)| candidate)
            .collect();

        debug!(
            interface,
            candidates = candidates.len(),
            fallback = candidates.len() - fallback_start,
            excluded = excluded.len(),
            "ranked implementations"
        );

        Ranking {
            candidates,
            fallback_start,
            excluded,
        }
    }

    fn exclusion(&self, candidate: Candidate<'_>, cached: bool) -> Option<RejectReason> {
        let implementation = candidate.implementation;
        if !self.policy.architecture.permits(&implementation.arch) {
            return Some(RejectReason::IncompatibleArch {
                arch: implementation.arch.clone(),
            });
        }
        if self.policy.network_use == NetworkUse::Offline && !cached {
            return Some(RejectReason::NotCachedOffline);
        }
        if implementation.stability == Stability::Insecure {
            return Some(RejectReason::Insecure);
        }
        None
    }

    /// Best first
    fn compare(&self, a: &(Candidate<'_>, bool), b: &(Candidate<'_>, bool)) -> Ordering {
        let (a, a_cached) = (a.0.implementation, a.1);
        let (b, b_cached) = (b.0.implementation, b.1);

        let cached = if self.policy.ranks_cached_first() {
            b_cached.cmp(&a_cached)
        } else {
            Ordering::Equal
        };

        cached
            .then_with(|| b.stability.cmp(&a.stability))
            .then_with(|| b.version.cmp(&a.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zi_catalog::CachedSet;
    use zi_types::{ArchPolicy, Feed, Implementation, Version};

    const LIB: &str = "http://example.com/lib";

    fn implementation(id: &str, version: &str, stability: Stability) -> Implementation {
        Implementation::new(id, Version::parse(version).unwrap()).with_stability(stability)
    }

    fn catalog(implementations: Vec<Implementation>, cached: &[&str]) -> Catalog {
        let mut catalog = Catalog::new(cached.iter().copied().collect::<CachedSet>());
        let feed = implementations
            .into_iter()
            .fold(Feed::new(LIB), Feed::with_implementation);
        catalog.register_feed(LIB, feed);
        catalog
    }

    fn ids(ranking: &Ranking<'_>) -> Vec<String> {
        ranking
            .candidates
            .iter()
            .map(|candidate| candidate.implementation.id.clone())
            .collect()
    }

    fn policy() -> Policy {
        Policy::default().with_architecture(ArchPolicy::for_platform("linux", "x86_64"))
    }

    #[test]
    fn test_stability_then_version() {
        let catalog = catalog(
            vec![
                implementation("stable-1", "1.0", Stability::Stable),
                implementation("stable-2", "2.0", Stability::Stable),
                implementation("packaged-1", "1.5", Stability::Packaged),
                implementation("testing-3", "3.0", Stability::Testing),
            ],
            &[],
        );
        let policy = policy();
        let ranking = Ranker::new(&catalog, &policy).rank(LIB);
        assert_eq!(ids(&ranking), vec!["packaged-1", "stable-2", "stable-1", "testing-3"]);
        assert_eq!(ranking.fallback_start, 3);
    }

    #[test]
    fn test_cached_first_only_when_asked() {
        let catalog = catalog(
            vec![
                implementation("old", "1.0", Stability::Stable),
                implementation("new", "2.0", Stability::Stable),
            ],
            &["old"],
        );

        let full = policy();
        assert_eq!(ids(&Ranker::new(&catalog, &full).rank(LIB)), vec!["new", "old"]);

        let minimal = policy().with_network_use(NetworkUse::Minimal);
        assert_eq!(ids(&Ranker::new(&catalog, &minimal).rank(LIB)), vec!["old", "new"]);

        let prefer = policy().with_prefer_cached(true);
        assert_eq!(ids(&Ranker::new(&catalog, &prefer).rank(LIB)), vec!["old", "new"]);
    }

    #[test]
    fn test_hard_filters() {
        let catalog = catalog(
            vec![
                implementation("arm", "3.0", Stability::Stable)
                    .with_arch("Linux-aarch64".parse().unwrap()),
                implementation("bad", "2.5", Stability::Insecure),
                implementation("remote", "2.0", Stability::Stable),
                implementation("local", "1.0", Stability::Stable).with_local_path("/opt/lib"),
            ],
            &[],
        );
        let offline = policy().with_network_use(NetworkUse::Offline);
        let ranking = Ranker::new(&catalog, &offline).rank(LIB);

        assert_eq!(ids(&ranking), vec!["local"]);
        let reasons: Vec<&RejectReason> = ranking.excluded.iter().map(|r| &r.reason).collect();
        assert!(matches!(reasons[0], RejectReason::IncompatibleArch { .. }));
        assert_eq!(reasons[1], &RejectReason::NotCachedOffline);
        assert_eq!(reasons[2], &RejectReason::NotCachedOffline);
        assert!(!ranking.is_missing());
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let catalog = catalog(
            vec![
                implementation("first", "1.0", Stability::Stable),
                implementation("second", "1.0", Stability::Stable),
            ],
            &[],
        );
        let policy = policy();
        assert_eq!(
            ids(&Ranker::new(&catalog, &policy).rank(LIB)),
            vec!["first", "second"]
        );
    }

    #[test]
    fn test_unknown_interface_is_missing() {
        let catalog = Catalog::default();
        let policy = policy();
        assert!(Ranker::new(&catalog, &policy).rank(LIB).is_missing());
    }
}

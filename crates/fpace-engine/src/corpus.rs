//! Case corpus builder.
//!
//! Expands the curated case catalog into the ordered-then-shuffled corpus
//! for one run: normalize the requested kind tokens through the synonym
//! table, repeat each catalog entry `replicates` times, then apply one
//! run-scoped Fisher-Yates shuffle. The same (kinds, replicates) pair
//! always yields the same multiset of cases; only the order is sampled per
//! run.

use std::collections::BTreeMap;

use fpace_error::{PaceError, Result};
use fpace_types::{ContentKind, TestCase};

use crate::rng::XorShift64;

/// Curated per-kind case tables.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<ContentKind, Vec<TestCase>>,
}

impl Catalog {
    /// An empty catalog, for tests that build their own tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one case to the table for its kind.
    pub fn push(&mut self, case: TestCase) {
        self.entries.entry(case.kind).or_default().push(case);
    }

    /// Cases for one kind, in catalog order.
    #[must_use]
    pub fn cases_for(&self, kind: ContentKind) -> &[TestCase] {
        self.entries.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Total entries across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Whether the catalog has no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed production catalog: 20 microcopy cases (buttons, errors,
    /// tooltips), 7 internal-comms cases, 6 press-release cases.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        // Microcopy: CTA buttons.
        for intent in [
            "verify code",
            "confirm details",
            "resend_code",
            "upload file",
            "pay now",
            "back",
            "next",
            "submit",
            "save",
            "agree",
            "decline",
        ] {
            catalog.push(TestCase::new(
                ContentKind::Microcopy,
                &[
                    ("uiContext", "button"),
                    ("surface", "button"),
                    ("intent", intent),
                ],
            ));
        }

        // Microcopy: error strings.
        for intent in [
            "server offline",
            "rate_limited",
            "maintenance_window",
            "dns_error",
            "timeout_error",
            "server error",
        ] {
            catalog.push(TestCase::new(
                ContentKind::Microcopy,
                &[
                    ("uiContext", "error"),
                    ("surface", "error"),
                    ("intent", intent),
                ],
            ));
        }

        // Microcopy: tooltips.
        for intent in [
            "explain coverage limit",
            "why we need this info",
            "password rules",
        ] {
            catalog.push(TestCase::new(
                ContentKind::Microcopy,
                &[
                    ("uiContext", "tooltip"),
                    ("surface", "tooltip"),
                    ("intent", intent),
                ],
            ));
        }

        // Internal comms: Slack and email updates.
        for (channel, title, key_update) in [
            (
                "Slack",
                "roadmap sync moved",
                "product roadmap sync moved to Tuesdays 11:00",
            ),
            (
                "Slack",
                "db maintenance",
                "analytics warehouse maintenance Friday 22:00-23:00 UTC",
            ),
            (
                "Slack",
                "phishing drills",
                "phishing simulation next week; report suspicious emails",
            ),
            (
                "Slack",
                "office policy refresh",
                "quiet rooms first-come; new booking rules apply",
            ),
            (
                "Email",
                "holiday coverage",
                "reduced coverage on national holiday; escalation as usual",
            ),
            (
                "Email",
                "design crit changes",
                "weekly crit now pairs; submit figs by EOD Monday",
            ),
            (
                "Email",
                "company event",
                "all-hands offsite confirmed for next month, details soon",
            ),
        ] {
            catalog.push(TestCase::new(
                ContentKind::InternalComms,
                &[
                    ("channel", channel),
                    ("title", title),
                    ("key_update", key_update),
                ],
            ));
        }

        // Press releases and external notes, per audience.
        for (audience, headline, key_message) in [
            (
                "press",
                "Lemonade reports strong Q2 growth",
                "accelerating growth with healthy underwriting and expense discipline",
            ),
            (
                "press",
                "Lemonade renews reinsurance program",
                "supports growth while reducing earnings volatility",
            ),
            (
                "customers",
                "Pet Wellness expands in EU",
                "simpler care and instant everything for your furry family",
            ),
            (
                "customers",
                "Faster claim decisions",
                "more customers get paid in minutes with zero paperwork",
            ),
            (
                "investors",
                "Q2 2025 results posted",
                "growth, underwriting health, and continued operating efficiency",
            ),
            (
                "investors",
                "Unit economics update",
                "loss ratio trends and disciplined growth across geos",
            ),
        ] {
            catalog.push(TestCase::new(
                ContentKind::PressRelease,
                &[
                    ("audience", audience),
                    ("headline", headline),
                    ("key_message", key_message),
                ],
            ));
        }

        catalog
    }
}

/// Normalize user-supplied kind tokens into a deduplicated, order-preserving
/// kind list. Blank tokens are dropped; tokens that match no synonym fall
/// back to [`ContentKind::Microcopy`].
#[must_use]
pub fn normalize_kinds(tokens: &[String]) -> Vec<ContentKind> {
    let mut kinds = Vec::new();
    for token in tokens {
        if token.trim().is_empty() {
            continue;
        }
        let kind = ContentKind::normalize(token).unwrap_or(ContentKind::Microcopy);
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

/// Expand the catalog into the run corpus: each catalog entry for each
/// requested kind repeated `replicates` times, then one shuffle over the
/// whole combined list using the run RNG.
pub fn build_corpus(
    catalog: &Catalog,
    kinds: &[ContentKind],
    replicates: u32,
    rng: &mut XorShift64,
) -> Result<Vec<TestCase>> {
    if replicates == 0 {
        return Err(PaceError::invalid_config("replicates must be >= 1"));
    }

    let mut corpus = Vec::new();
    for &kind in kinds {
        for _ in 0..replicates {
            corpus.extend(catalog.cases_for(kind).iter().cloned());
        }
    }

    if corpus.is_empty() {
        return Err(PaceError::EmptyCorpus);
    }

    rng.shuffle(&mut corpus);
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use fpace_error::PaceError;
    use proptest::prelude::*;

    use super::*;

    fn rng() -> XorShift64 {
        XorShift64::new(0xC0FF_EE00)
    }

    /// A catalog of exactly 11 microcopy entries, distinguishable by intent.
    fn eleven_microcopy() -> Catalog {
        let mut catalog = Catalog::new();
        for i in 0..11 {
            catalog.push(TestCase::new(
                ContentKind::Microcopy,
                &[("intent", format!("intent-{i}").as_str())],
            ));
        }
        catalog
    }

    #[test]
    fn builtin_catalog_sizes() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.cases_for(ContentKind::Microcopy).len(), 20);
        assert_eq!(catalog.cases_for(ContentKind::InternalComms).len(), 7);
        assert_eq!(catalog.cases_for(ContentKind::PressRelease).len(), 6);
        assert_eq!(catalog.len(), 33);
    }

    #[test]
    fn normalize_dedups_and_preserves_order() {
        let tokens: Vec<String> = ["press", "micro", "external", "internal"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        assert_eq!(
            normalize_kinds(&tokens),
            vec![
                ContentKind::PressRelease,
                ContentKind::Microcopy,
                ContentKind::InternalComms,
            ]
        );
    }

    #[test]
    fn unknown_tokens_fall_back_to_microcopy() {
        let tokens = vec!["sonnet".to_owned(), "haiku".to_owned()];
        assert_eq!(normalize_kinds(&tokens), vec![ContentKind::Microcopy]);
    }

    #[test]
    fn eleven_cases_twice_replicated_yields_twenty_two() {
        let catalog = eleven_microcopy();
        let corpus =
            build_corpus(&catalog, &[ContentKind::Microcopy], 2, &mut rng()).unwrap();
        assert_eq!(corpus.len(), 22);

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for case in &corpus {
            *counts.entry(case.params["intent"].as_str()).or_default() += 1;
        }
        assert_eq!(counts.len(), 11);
        assert!(counts.values().all(|&n| n == 2), "counts={counts:?}");
    }

    #[test]
    fn empty_expansion_is_an_error() {
        let catalog = Catalog::new();
        let err =
            build_corpus(&catalog, &[ContentKind::PressRelease], 1, &mut rng()).unwrap_err();
        assert!(matches!(err, PaceError::EmptyCorpus));

        let err = build_corpus(&Catalog::builtin(), &[], 1, &mut rng()).unwrap_err();
        assert!(matches!(err, PaceError::EmptyCorpus));
    }

    #[test]
    fn zero_replicates_is_a_config_error() {
        let err =
            build_corpus(&Catalog::builtin(), &[ContentKind::Microcopy], 0, &mut rng())
                .unwrap_err();
        assert!(matches!(err, PaceError::InvalidConfig { .. }));
    }

    #[test]
    fn shuffle_keeps_the_multiset() {
        let catalog = Catalog::builtin();
        let kinds = [ContentKind::Microcopy, ContentKind::PressRelease];
        let corpus = build_corpus(&catalog, &kinds, 1, &mut rng()).unwrap();

        let mut expected: Vec<TestCase> = Vec::new();
        for &kind in &kinds {
            expected.extend(catalog.cases_for(kind).iter().cloned());
        }
        assert_eq!(corpus.len(), expected.len());
        for case in &expected {
            let have = corpus.iter().filter(|c| *c == case).count();
            let want = expected.iter().filter(|c| *c == case).count();
            assert_eq!(have, want, "case={case:?}");
        }
    }

    #[test]
    fn same_seed_same_order() {
        let catalog = Catalog::builtin();
        let a = build_corpus(
            &catalog,
            &ContentKind::ALL,
            1,
            &mut XorShift64::new(1234),
        )
        .unwrap();
        let b = build_corpus(
            &catalog,
            &ContentKind::ALL,
            1,
            &mut XorShift64::new(1234),
        )
        .unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn corpus_size_is_replicates_times_catalog(
            replicates in 1_u32..=4,
            seed in any::<u64>(),
            pick_micro in any::<bool>(),
            pick_internal in any::<bool>(),
        ) {
            let mut kinds = Vec::new();
            if pick_micro {
                kinds.push(ContentKind::Microcopy);
            }
            if pick_internal {
                kinds.push(ContentKind::InternalComms);
            }
            kinds.push(ContentKind::PressRelease);

            let catalog = Catalog::builtin();
            let expected: usize = kinds
                .iter()
                .map(|&k| catalog.cases_for(k).len() * replicates as usize)
                .sum();

            let corpus = build_corpus(
                &catalog,
                &kinds,
                replicates,
                &mut XorShift64::new(seed),
            )
            .unwrap();
            prop_assert_eq!(corpus.len(), expected);
        }
    }
}

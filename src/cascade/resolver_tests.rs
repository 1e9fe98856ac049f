//! Scenario and property tests for cascade resolution.

use proptest::prelude::*;

use super::*;
use crate::types::{BranchCatalog, MergeEvent, RepoId, Tier, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn merge_into(destination: &str, title: &str) -> MergeEvent {
    MergeEvent {
        repo: RepoId::new("acme", "portal"),
        source_branch: "feature/x".to_string(),
        destination_branch: destination.to_string(),
        author: UserId::new("{author}"),
        title: title.to_string(),
    }
}

fn pairs(candidates: &[PropagationCandidate]) -> Vec<(&str, &str)> {
    candidates
        .iter()
        .map(|c| (c.source.as_str(), c.destination.as_str()))
        .collect()
}

fn team_a_catalog() -> BranchCatalog {
    BranchCatalog::new(["dev/teamA", "qa/teamA", "uat/teamA", "release/teamA"])
}

fn two_site_catalog() -> BranchCatalog {
    BranchCatalog::new([
        "develop",
        "main",
        "feature/login",
        "dev/teamA",
        "dev/teamB_eu",
        "qa/teamA",
        "qa/teamB_eu",
        "uat/teamA",
        "uat/teamB_eu",
        "release/teamA",
        "release/teamB_eu",
    ])
}

// ─────────────────────────────────────────────────────────────────────────────
// Mode selection
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn original_merge_into_tier_is_site_scoped() {
    let policy = CascadePolicy::default();
    assert_eq!(
        propagation_mode(&merge_into("dev/teamA", "Fix login"), &policy),
        PropagationMode::SiteScoped
    );
}

#[test]
fn merge_into_development_is_broadcast() {
    let policy = CascadePolicy::default();
    assert_eq!(
        propagation_mode(&merge_into("develop", "Fix login"), &policy),
        PropagationMode::Broadcast
    );
}

#[test]
fn propagated_merge_is_broadcast() {
    let policy = CascadePolicy::default();
    assert_eq!(
        propagation_mode(&merge_into("qa/teamA", "#AutoCascade Fix login"), &policy),
        PropagationMode::Broadcast
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Site-scoped tiers
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn dev_merge_resolves_to_matching_qa() {
    let policy = CascadePolicy::new("release/", "develop");
    let candidates = resolve_cascade(
        &merge_into("dev/teamA", "Fix login"),
        &team_a_catalog(),
        &policy,
    );

    assert_eq!(pairs(&candidates), vec![("dev/teamA", "qa/teamA")]);
    assert_eq!(candidates[0].title, "Fix login");
}

#[test]
fn develop_merge_fans_out_to_every_dev_branch() {
    let policy = CascadePolicy::new("release/", "develop");
    let candidates = resolve_cascade(
        &merge_into("develop", "Shared change"),
        &two_site_catalog(),
        &policy,
    );

    assert_eq!(
        pairs(&candidates),
        vec![("develop", "dev/teamA"), ("develop", "dev/teamB_eu")]
    );
}

#[test]
fn develop_merge_with_single_site_catalog() {
    let policy = CascadePolicy::new("release/", "develop");
    let candidates = resolve_cascade(
        &merge_into("develop", "Shared change"),
        &team_a_catalog(),
        &policy,
    );

    assert_eq!(pairs(&candidates), vec![("develop", "dev/teamA")]);
}

#[test]
fn cascade_never_crosses_sites() {
    let policy = CascadePolicy::default();
    let candidates = resolve_cascade(
        &merge_into("qa/teamB_eu", "Fix"),
        &two_site_catalog(),
        &policy,
    );

    assert_eq!(pairs(&candidates), vec![("qa/teamB_eu", "uat/teamB_eu")]);
}

#[test]
fn propagated_merge_keeps_site_and_strips_sentinel() {
    let policy = CascadePolicy::default();
    let candidates = resolve_cascade(
        &merge_into("dev/teamA", "#AutoCascade #AutoCascade Shared change"),
        &two_site_catalog(),
        &policy,
    );

    assert_eq!(pairs(&candidates), vec![("dev/teamA", "qa/teamA")]);
    assert_eq!(candidates[0].title, "Shared change");
}

#[test]
fn release_tier_terminates() {
    let policy = CascadePolicy::default();
    let candidates = resolve_cascade(
        &merge_into("release/teamA", "Ship it"),
        &two_site_catalog(),
        &policy,
    );

    assert!(candidates.is_empty());
}

#[test]
fn missing_downstream_branch_terminates() {
    let policy = CascadePolicy::default();
    let catalog = BranchCatalog::new(["dev/teamA", "qa/teamA", "release/teamA"]);
    let candidates = resolve_cascade(&merge_into("qa/teamA", "Fix"), &catalog, &policy);

    // No uat/teamA: no skipping straight to release.
    assert!(candidates.is_empty());
}

#[test]
fn untiered_destination_resolves_to_nothing() {
    let policy = CascadePolicy::default();
    for destination in ["main", "feature/login", "hotfix/urgent"] {
        let candidates =
            resolve_cascade(&merge_into(destination, "Fix"), &two_site_catalog(), &policy);
        assert!(candidates.is_empty(), "{destination} should not cascade");
    }
}

#[test]
fn site_scoped_uses_first_of_duplicate_next_hops() {
    let policy = CascadePolicy::default();
    let catalog = BranchCatalog::new(["dev/teamA", "qa/teamA_2", "qa/teamA_1"]);
    let candidates = resolve_cascade(&merge_into("dev/teamA", "Fix"), &catalog, &policy);

    assert_eq!(pairs(&candidates), vec![("dev/teamA", "qa/teamA_1")]);
}

#[test]
fn broadcast_emits_every_same_site_next_hop() {
    let policy = CascadePolicy::default();
    let catalog = BranchCatalog::new(["dev/teamA", "qa/teamA_2", "qa/teamA_1", "qa/teamB"]);
    let candidates = resolve_cascade(
        &merge_into("dev/teamA", "#AutoCascade Fix"),
        &catalog,
        &policy,
    );

    assert_eq!(
        pairs(&candidates),
        vec![("dev/teamA", "qa/teamA_1"), ("dev/teamA", "qa/teamA_2")]
    );
}

#[test]
fn empty_catalog_resolves_to_nothing() {
    let policy = CascadePolicy::default();
    let candidates = resolve_cascade(
        &merge_into("develop", "Fix"),
        &BranchCatalog::default(),
        &policy,
    );
    assert!(candidates.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Version-ordered releases
// ─────────────────────────────────────────────────────────────────────────────

fn release_policy() -> CascadePolicy {
    CascadePolicy::new("release/", "develop").with_strategy(CascadeStrategy::VersionOrderedReleases)
}

fn release_catalog() -> BranchCatalog {
    BranchCatalog::new([
        "develop",
        "release/1.2.0",
        "release/1.10.0",
        "release/1.3.0",
        "release/notes",
    ])
}

#[test]
fn release_cascades_to_next_version() {
    let candidates = resolve_cascade(
        &merge_into("release/1.2.0", "Hotfix"),
        &release_catalog(),
        &release_policy(),
    );
    assert_eq!(pairs(&candidates), vec![("release/1.2.0", "release/1.3.0")]);
}

#[test]
fn release_ordering_is_numeric() {
    let candidates = resolve_cascade(
        &merge_into("release/1.3.0", "Hotfix"),
        &release_catalog(),
        &release_policy(),
    );
    assert_eq!(pairs(&candidates), vec![("release/1.3.0", "release/1.10.0")]);
}

#[test]
fn newest_release_cascades_to_development() {
    let candidates = resolve_cascade(
        &merge_into("release/1.10.0", "#AutoCascade Hotfix"),
        &release_catalog(),
        &release_policy(),
    );
    assert_eq!(pairs(&candidates), vec![("release/1.10.0", "develop")]);
    assert_eq!(candidates[0].title, "Hotfix");
}

#[test]
fn development_merge_ends_release_cascade() {
    let candidates = resolve_cascade(
        &merge_into("develop", "Hotfix"),
        &release_catalog(),
        &release_policy(),
    );
    assert!(candidates.is_empty());
}

#[test]
fn unversioned_release_branch_does_not_cascade() {
    let candidates = resolve_cascade(
        &merge_into("release/notes", "Docs"),
        &release_catalog(),
        &release_policy(),
    );
    assert!(candidates.is_empty());
}

#[test]
fn newest_release_without_development_branch_stops() {
    let catalog = BranchCatalog::new(["release/1.0", "release/2.0"]);
    let candidates = resolve_cascade(
        &merge_into("release/2.0", "Hotfix"),
        &catalog,
        &release_policy(),
    );
    assert!(candidates.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

fn arb_branch() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("develop".to_string()),
        Just("main".to_string()),
        ("(dev|qa|uat|release|feature)", "(/[a-cA-C]{1,3}(_[0-9]{1,2})?)?")
            .prop_map(|(prefix, rest)| format!("{prefix}{rest}")),
    ]
}

proptest! {
    #[test]
    fn candidates_step_exactly_one_tier(
        branches in prop::collection::vec(arb_branch(), 0..20),
        destination in arb_branch(),
        title in "(#AutoCascade )?[a-z ]{0,12}",
    ) {
        let policy = CascadePolicy::default();
        let catalog = BranchCatalog::new(branches);
        let candidates = resolve_cascade(&merge_into(&destination, &title), &catalog, &policy);

        for candidate in &candidates {
            let from = policy.tier_of(&candidate.source);
            let to = policy.tier_of(&candidate.destination);
            prop_assert!(from.is_some());
            prop_assert_eq!(from.and_then(Tier::next), to);
            prop_assert!(catalog.contains(&candidate.destination));
            prop_assert!(!candidate.title.starts_with(SENTINEL));
        }
    }

    #[test]
    fn site_scoped_yields_at_most_one(
        branches in prop::collection::vec(arb_branch(), 0..20),
        destination in arb_branch(),
        title in "[a-z ]{0,12}",
    ) {
        let policy = CascadePolicy::default();
        let event = merge_into(&destination, &title);
        let candidates = resolve_cascade(&event, &BranchCatalog::new(branches), &policy);

        if propagation_mode(&event, &policy) == PropagationMode::SiteScoped {
            prop_assert!(candidates.len() <= 1);
        }
    }

    #[test]
    fn non_development_candidates_share_the_site(
        branches in prop::collection::vec(arb_branch(), 0..20),
        destination in arb_branch(),
    ) {
        let policy = CascadePolicy::default();
        let candidates =
            resolve_cascade(&merge_into(&destination, "#AutoCascade x"), &BranchCatalog::new(branches), &policy);

        for candidate in candidates.iter().filter(|c| !policy.is_development(&c.source)) {
            prop_assert_eq!(
                crate::types::site_token(&candidate.source),
                crate::types::site_token(&candidate.destination)
            );
        }
    }

    #[test]
    fn release_candidates_are_strictly_newer_or_development(
        versions in prop::collection::vec((0u64..5, 0u64..5), 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut names: Vec<String> = versions
            .iter()
            .map(|(major, minor)| format!("release/{major}.{minor}"))
            .collect();
        let destination = names[pick.index(names.len())].clone();
        names.push("develop".to_string());
        let policy = release_policy();
        let candidates =
            resolve_cascade(&merge_into(&destination, "x"), &BranchCatalog::new(names), &policy);

        prop_assert_eq!(candidates.len(), 1);
        let target = &candidates[0].destination;
        if !policy.is_development(target) {
            let current = ReleaseVersion::parse(policy.release_suffix(&destination).unwrap()).unwrap();
            let next = ReleaseVersion::parse(policy.release_suffix(target).unwrap()).unwrap();
            prop_assert!(next > current);
        }
    }
}

//! Matching tests over real directory listings.

use relink_catalog::{CatalogOptions, DecorationRules, FileCatalog, ListedFile, Matcher};
use relink_core::{MatchTier, ResolutionResult};
use std::fs;
use tempfile::TempDir;

fn listing(names: &[&str]) -> FileCatalog {
    let files = names
        .iter()
        .map(|name| ListedFile::new(format!("/export/Files and images/{name}"), 10))
        .collect();
    FileCatalog::from_listing(files, DecorationRules::default())
}

fn tier_of(result: &ResolutionResult) -> Option<MatchTier> {
    match result {
        ResolutionResult::Resolved { tier, .. } | ResolutionResult::Ambiguous { tier, .. } => {
            Some(*tier)
        }
        ResolutionResult::Unresolved => None,
    }
}

#[test]
fn test_exact_match_on_decoded_key() {
    let catalog = listing(&["My Photo.png", "other.png"]);
    let mut matcher = Matcher::new(&catalog);

    let result = matcher.resolve("My%20Photo.png");
    assert_eq!(tier_of(&result), Some(MatchTier::Exact));
    assert_eq!(result.entry().unwrap().display_name(), "My Photo.png");
}

#[test]
fn test_normalized_match_ignores_case_and_separators() {
    let catalog = listing(&["My_Photo_Final.PNG"]);
    let mut matcher = Matcher::new(&catalog);

    let result = matcher.resolve("my photo final.png");
    assert_eq!(tier_of(&result), Some(MatchTier::Normalized));
    assert!(result.is_resolved());
}

#[test]
fn test_suffix_stripped_key_resolves_plain_file() {
    let catalog = listing(&["photo.png", "diagram.png"]);
    let mut matcher = Matcher::new(&catalog);

    let result = matcher.resolve("photo-image-44306.png");
    assert_eq!(tier_of(&result), Some(MatchTier::SuffixStripped));
    assert_eq!(result.entry().unwrap().display_name(), "photo.png");
}

#[test]
fn test_decorated_file_resolves_plain_key() {
    let catalog = listing(&["-MabcXYZ123-image.png", "unrelated.jpg"]);
    let mut matcher = Matcher::new(&catalog);

    let result = matcher.resolve("-MabcXYZ123.png");
    assert_eq!(tier_of(&result), Some(MatchTier::SuffixStripped));
    assert_eq!(result.entry().unwrap().display_name(), "-MabcXYZ123-image.png");
}

#[test]
fn test_dedup_counter_in_parentheses_resolves() {
    let catalog = listing(&["scan (1).pdf"]);
    let mut matcher = Matcher::new(&catalog);

    let result = matcher.resolve("scan.pdf");
    assert!(result.is_resolved());
    assert_eq!(tier_of(&result), Some(MatchTier::SuffixStripped));
}

#[test]
fn test_colliding_normalized_names_are_ambiguous() {
    let catalog = listing(&["my_photo.png", "my-photo.png"]);
    assert_eq!(catalog.ambiguous_keys().len(), 1);

    let mut matcher = Matcher::new(&catalog);
    let result = matcher.resolve("My Photo.png");
    assert!(result.is_ambiguous());
    assert!(result.entry().is_none());
    match result {
        ResolutionResult::Ambiguous { candidates, tier } => {
            assert_eq!(candidates.len(), 2);
            assert_eq!(tier, MatchTier::Normalized);
        }
        other => panic!("expected ambiguous, got {other:?}"),
    }
}

#[test]
fn test_stripped_collision_is_ambiguous() {
    let catalog = listing(&["chart-1.png", "chart-2.png"]);
    let mut matcher = Matcher::new(&catalog);

    assert!(matcher.resolve("chart-image.png").is_ambiguous());
}

#[test]
fn test_containment_requires_unique_candidate() {
    let catalog = listing(&["meeting-notes-whiteboard.jpg", "budget.jpg"]);
    let mut matcher = Matcher::new(&catalog);

    let result = matcher.resolve("whiteboard.jpg");
    assert_eq!(tier_of(&result), Some(MatchTier::Containment));

    let catalog = listing(&["whiteboard-left.jpg", "whiteboard-right.jpg"]);
    let mut matcher = Matcher::new(&catalog);
    assert!(matcher.resolve("whiteboard.jpg").is_ambiguous());
}

#[test]
fn test_empty_catalog_is_unresolved() {
    let catalog = listing(&[]);
    let mut matcher = Matcher::new(&catalog);
    assert_eq!(matcher.resolve("photo.png"), ResolutionResult::Unresolved);
}

#[test]
fn test_build_skips_hidden_and_nested_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("photo.png"), b"png").unwrap();
    fs::write(temp_dir.path().join(".DS_Store"), b"junk").unwrap();
    fs::create_dir(temp_dir.path().join("nested")).unwrap();
    fs::write(temp_dir.path().join("nested").join("deep.png"), b"deep").unwrap();

    let flat = FileCatalog::build(
        temp_dir.path(),
        &CatalogOptions::default(),
        DecorationRules::default(),
    )
    .unwrap();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat.entries()[0].display_name(), "photo.png");
    assert_eq!(*flat.entries()[0].size_bytes(), 3);

    let recursive = FileCatalog::build(
        temp_dir.path(),
        &CatalogOptions {
            recursive: true,
            include_hidden: false,
        },
        DecorationRules::default(),
    )
    .unwrap();
    assert_eq!(recursive.len(), 2);
}

#[test]
fn test_build_rejects_missing_root() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist");

    let result = FileCatalog::build(&missing, &CatalogOptions::default(), DecorationRules::default());
    assert!(result.is_err());
    assert!(matches!(
        result.unwrap_err().kind(),
        relink_error::RelinkErrorKind::Catalog(_)
    ));
}

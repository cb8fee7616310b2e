//! Builds playlists from tag selections.
//!
//! The catalog is walked in insertion order for every mode, so output order
//! is deterministic and never depends on set iteration. The caller (the
//! engine facade) validates that every filter tag exists before building.

use crate::catalog::Catalog;
use crate::model::{FilterMode, Song, TagId};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

pub fn build(catalog: &Catalog, filter_tags: &BTreeSet<TagId>, mode: FilterMode) -> Vec<PathBuf> {
    if filter_tags.is_empty() {
        return catalog.songs().iter().map(|song| song.path.clone()).collect();
    }

    let qualifies: Box<dyn Fn(&Song) -> bool + '_> = match mode {
        FilterMode::Or => Box::new(|song| filter_tags.iter().any(|id| song.tags.contains(id))),
        FilterMode::And => Box::new(|song| filter_tags.iter().all(|id| song.tags.contains(id))),
        FilterMode::Standard => {
            let groups = group_by_category(catalog, filter_tags);
            Box::new(move |song| {
                // Every category group must be satisfied; no early exit
                // after the first group.
                groups
                    .values()
                    .all(|group| group.iter().any(|id| song.tags.contains(id)))
            })
        }
    };

    catalog
        .songs()
        .iter()
        .filter(|song| qualifies(song))
        .map(|song| song.path.clone())
        .collect()
}

fn group_by_category(catalog: &Catalog, filter_tags: &BTreeSet<TagId>) -> BTreeMap<String, Vec<TagId>> {
    let mut groups: BTreeMap<String, Vec<TagId>> = BTreeMap::new();
    for &id in filter_tags {
        if let Some(tag) = catalog.tag(id) {
            groups.entry(tag.category.clone()).or_default().push(id);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Songs `a,b,c`; `Rock(Genre)` on `{a,b}`, `Pop(Genre)` on `{c}`,
    /// `Happy(Mood)` on `{b,c}`.
    fn fixture() -> (Catalog, TagId, TagId, TagId) {
        let mut catalog = Catalog::new();
        let a = catalog.add_song(Path::new("a.mp3"), true).expect("add");
        let b = catalog.add_song(Path::new("b.mp3"), true).expect("add");
        let c = catalog.add_song(Path::new("c.mp3"), true).expect("add");

        let rock = catalog.create_tag("Rock", "Genre").expect("create");
        let pop = catalog.create_tag("Pop", "Genre").expect("create");
        let happy = catalog.create_tag("Happy", "Mood").expect("create");

        catalog
            .assign_tags(&[a.clone(), b.clone()], &[rock], false)
            .expect("assign");
        catalog.assign_tags(&[c.clone()], &[pop], false).expect("assign");
        catalog.assign_tags(&[b, c], &[happy], false).expect("assign");
        (catalog, rock, pop, happy)
    }

    fn names(playlist: &[PathBuf]) -> Vec<String> {
        playlist
            .iter()
            .map(|path| crate::model::display_name(path))
            .collect()
    }

    #[test]
    fn empty_filter_returns_catalog_in_order() {
        let (catalog, ..) = fixture();
        for mode in [FilterMode::Standard, FilterMode::And, FilterMode::Or] {
            let playlist = build(&catalog, &BTreeSet::new(), mode);
            assert_eq!(names(&playlist), vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn or_filter_is_union_in_catalog_order() {
        let (catalog, rock, pop, _) = fixture();
        let playlist = build(&catalog, &BTreeSet::from([rock]), FilterMode::Or);
        assert_eq!(names(&playlist), vec!["a", "b"]);

        let playlist = build(&catalog, &BTreeSet::from([rock, pop]), FilterMode::Or);
        assert_eq!(names(&playlist), vec!["a", "b", "c"]);
    }

    #[test]
    fn and_filter_requires_every_tag() {
        let (catalog, rock, _, happy) = fixture();
        let playlist = build(&catalog, &BTreeSet::from([rock, happy]), FilterMode::And);
        assert_eq!(names(&playlist), vec!["b"]);
    }

    #[test]
    fn standard_filter_is_or_within_category_and_across() {
        let (catalog, rock, pop, happy) = fixture();

        // {Genre:[Rock]}, {Mood:[Happy]} -> only b carries one of each.
        let playlist = build(&catalog, &BTreeSet::from([rock, happy]), FilterMode::Standard);
        assert_eq!(names(&playlist), vec!["b"]);

        // {Genre:[Rock,Pop]}, {Mood:[Happy]} -> b and c.
        let playlist = build(
            &catalog,
            &BTreeSet::from([rock, pop, happy]),
            FilterMode::Standard,
        );
        assert_eq!(names(&playlist), vec!["b", "c"]);
    }

    #[test]
    fn standard_filter_checks_every_group() {
        // A song satisfying the first category group but not a later one
        // must not slip through.
        let (catalog, rock, _, happy) = fixture();
        let playlist = build(&catalog, &BTreeSet::from([rock, happy]), FilterMode::Standard);
        assert!(!playlist.iter().any(|path| path.ends_with("a.mp3")));
    }

    #[test]
    fn single_category_standard_equals_or() {
        let (catalog, rock, pop, _) = fixture();
        let selection = BTreeSet::from([rock, pop]);
        assert_eq!(
            build(&catalog, &selection, FilterMode::Standard),
            build(&catalog, &selection, FilterMode::Or)
        );
    }

    proptest::proptest! {
        #[test]
        fn filter_laws_hold_for_random_catalogs(
            tag_bits in proptest::collection::vec(0u8..8, 1..24),
            selection_mask in 0u8..8,
        ) {
            let mut catalog = Catalog::new();
            let rock = catalog.create_tag("Rock", "Genre").expect("create");
            let pop = catalog.create_tag("Pop", "Genre").expect("create");
            let happy = catalog.create_tag("Happy", "Mood").expect("create");
            let all = [rock, pop, happy];

            for (idx, bits) in tag_bits.iter().enumerate() {
                let key = catalog
                    .add_song(Path::new(&format!("song_{idx}.mp3")), true)
                    .expect("add");
                for (bit, &id) in all.iter().enumerate() {
                    if bits & (1 << bit) != 0 {
                        catalog.add_tag_to_song(&key, id).expect("link");
                    }
                }
            }

            let selection: BTreeSet<TagId> = all
                .iter()
                .enumerate()
                .filter(|(bit, _)| selection_mask & (1 << bit) != 0)
                .map(|(_, &id)| id)
                .collect();

            let and = build(&catalog, &selection, FilterMode::And);
            let or = build(&catalog, &selection, FilterMode::Or);
            let standard = build(&catalog, &selection, FilterMode::Standard);

            for song in catalog.songs() {
                let has = |id: &TagId| song.tags.contains(id);
                let in_list = |list: &[PathBuf]| list.contains(&song.path);

                if selection.is_empty() {
                    proptest::prop_assert!(in_list(&and) && in_list(&or) && in_list(&standard));
                    continue;
                }

                proptest::prop_assert_eq!(in_list(&and), selection.iter().all(has));
                proptest::prop_assert_eq!(in_list(&or), selection.iter().any(has));

                let mut groups: BTreeMap<&str, Vec<TagId>> = BTreeMap::new();
                for &id in &selection {
                    let category = catalog.tag(id).expect("tag").category.as_str();
                    groups.entry(category).or_default().push(id);
                }
                let expected = groups
                    .values()
                    .all(|group| group.iter().any(|id| song.tags.contains(id)));
                proptest::prop_assert_eq!(in_list(&standard), expected);
            }
        }
    }
}

//! The word-list workload for the AVL map.

use std::collections::HashSet;
use std::path::Path;

use balanced_bst::{dictionary, AvlMap, Config, Replacement};

fn words() -> Vec<String> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/words.txt");
    dictionary::load_words(path).unwrap()
}

#[test]
fn loads_every_line() {
    let words = words();
    // One blank line is skipped and "walnut" appears twice.
    assert_eq!(words.len(), 428);
    assert_eq!(words[0], "aardvark");
    assert!(words.iter().all(|w| !w.is_empty() && !w.ends_with('\r')));
    assert_eq!(words.iter().collect::<HashSet<_>>().len(), 427);
}

#[test]
fn words_map_to_their_insertion_index() {
    for config in [
        Config::default(),
        Config::default()
            .with_parent_links(true)
            .with_replacement(Replacement::Preferred),
    ] {
        let mut map = AvlMap::with_config(config);
        let mut first = Vec::new();
        for (index, word) in words().into_iter().enumerate() {
            if map.insert(word.clone(), index) {
                first.push((word, index));
            }
        }
        assert_eq!(map.len(), 427);
        map.validate().unwrap();

        // The duplicate overwrote its first index.
        let walnut = first.iter().find(|(w, _)| w == "walnut").unwrap().1;
        assert_ne!(map.find(&"walnut".to_string()), Some(&walnut));

        let mut sorted: Vec<_> = first.iter().map(|(w, _)| w.clone()).collect();
        sorted.sort();
        assert_eq!(map.keys(), sorted);

        for (word, index) in &first {
            if word != "walnut" {
                assert_eq!(map.find(word), Some(index), "{}", word);
            }
        }
        for (word, _) in &first {
            assert!(map.erase(word), "{}", word);
            map.validate().unwrap();
        }
        assert!(map.is_empty());
        assert_eq!(map.freed_len(), 427);
    }
}

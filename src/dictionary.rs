//! Word lists for the map workload.
//!
//! A dictionary file holds one word per line. Line endings, `\n` or `\r\n`, are stripped and
//! empty lines skipped; nothing else about a word is touched, so duplicates survive and the
//! caller decides what to do with them.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use log::debug;

/// Reads every non-empty line of `reader` as a word.
///
/// ```
/// use balanced_bst::dictionary::read_words;
///
/// let words = read_words("apple\r\nbanana\n\ncherry".as_bytes()).unwrap();
/// assert_eq!(words, ["apple", "banana", "cherry"]);
/// ```
pub fn read_words(reader: impl BufRead) -> io::Result<Vec<String>> {
    let mut words = Vec::new();
    for line in reader.lines() {
        let mut line = line?;
        if line.ends_with('\r') {
            line.pop();
        }
        if !line.is_empty() {
            words.push(line);
        }
    }
    Ok(words)
}

/// Reads the dictionary file at `path`.
pub fn load_words(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let path = path.as_ref();
    let words = read_words(BufReader::new(File::open(path)?))?;
    debug!("loaded {} words from {}", words.len(), path.display());
    Ok(words)
}

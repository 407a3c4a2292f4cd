//! Fuzzy relevance scoring for video search.
//!
//! Text is lowercased and split into alphanumeric words. A query word matches
//! a field through its most similar word there, where similarity is
//! `1 - edit_distance / longer_length`. Matches below [`MIN_SIMILARITY`] are
//! ignored. Title matches weigh twice as much as description matches.

/// Roughly one edit per three characters.
pub const MIN_SIMILARITY: f64 = 0.7;

const TITLE_WEIGHT: f64 = 2.0;

pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Edit distance over chars, two-row dynamic programming.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn best_match(word: &str, field: &[String]) -> f64 {
    let best = field
        .iter()
        .map(|candidate| similarity(word, candidate))
        .fold(0.0, f64::max);
    if best >= MIN_SIMILARITY {
        best
    } else {
        0.0
    }
}

/// Prepared query, tokenized once and scored against many rows.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    words: Vec<String>,
}

impl SearchQuery {
    /// `None` when the text has no searchable words.
    pub fn parse(text: &str) -> Option<Self> {
        let words = tokenize(text);
        if words.is_empty() {
            None
        } else {
            Some(Self { words })
        }
    }

    pub fn score(&self, title: &str, description: &str) -> f64 {
        let title = tokenize(title);
        let description = tokenize(description);
        self.words
            .iter()
            .map(|word| {
                let t = TITLE_WEIGHT * best_match(word, &title);
                let d = best_match(word, &description);
                t.max(d)
            })
            .sum()
    }
}

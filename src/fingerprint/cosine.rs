//! Bag-of-words cosine similarity for short strings such as titles

use std::collections::HashMap;

fn term_frequencies(text: &str) -> HashMap<String, u32> {
    let mut tf = HashMap::new();
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        *tf.entry(token.to_string()).or_insert(0) += 1;
    }
    tf
}

/// Cosine similarity of the term-frequency vectors of `a` and `b`.
///
/// Returns 0.0 when either side has no tokens.
#[must_use]
pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    let tf_a = term_frequencies(a);
    let tf_b = term_frequencies(b);

    let magnitude = |tf: &HashMap<String, u32>| -> f64 {
        tf.values().map(|v| f64::from(*v).powi(2)).sum::<f64>().sqrt()
    };
    let mag_a = magnitude(&tf_a);
    let mag_b = magnitude(&tf_b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    let dot: f64 = tf_a
        .iter()
        .filter_map(|(term, count)| tf_b.get(term).map(|other| f64::from(*count * *other)))
        .sum();

    (dot / (mag_a * mag_b)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identical_is_one() {
        let s = "Local team secures a dramatic win";
        assert!((cosine_similarity(s, s) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_is_zero() {
        assert_eq!(cosine_similarity("red apples", "blue oceans"), 0.0);
    }

    #[test]
    fn empty_side_is_zero() {
        assert_eq!(cosine_similarity("", "something"), 0.0);
        assert_eq!(cosine_similarity("!!!", "???"), 0.0);
    }

    #[test]
    fn punctuation_and_case_ignored() {
        let sim = cosine_similarity("Hello, World!", "hello world");
        assert!((sim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn one_dropped_word_in_long_title_exceeds_threshold() {
        let a = "Local team secures a dramatic win in the regional final tonight";
        let b = "Local team secures dramatic win in the regional final tonight";
        assert!(cosine_similarity(a, b) > 0.92);
    }

    proptest! {
        #[test]
        fn self_similarity_is_one(words in proptest::collection::vec("[a-z]{1,8}", 1..20)) {
            let s = words.join(" ");
            prop_assert!((cosine_similarity(&s, &s) - 1.0).abs() < 1e-9);
        }
    }
}

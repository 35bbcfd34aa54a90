//! Salient-entity extraction for image search queries

/// Capitalized words that only start sentences or headlines
const LEADING_STOPWORDS: &[&str] = &[
    "A", "An", "The", "This", "That", "These", "Those", "How", "Why", "What", "When", "Where",
    "Who", "In", "On", "At", "For", "From", "With", "After", "Before", "New", "Breaking",
];

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn clean_word(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
}

/// Pick the entity an image search should look for.
///
/// Order: a known entity mentioned in the title (case-insensitive, longest
/// first), the first run of two or more capitalized words, the first
/// capitalized word that is not a headline stopword.
#[must_use]
pub fn extract_entity(title: &str, known_entities: &[String]) -> Option<String> {
    let lowered = title.to_lowercase();
    let mut known: Vec<&String> = known_entities.iter().filter(|e| !e.trim().is_empty()).collect();
    known.sort_by_key(|e| std::cmp::Reverse(e.len()));
    if let Some(entity) = known
        .into_iter()
        .find(|e| lowered.contains(&e.trim().to_lowercase()))
    {
        return Some(entity.trim().to_string());
    }

    let words: Vec<&str> = title
        .split_whitespace()
        .map(clean_word)
        .filter(|w| !w.is_empty())
        .collect();

    let mut run: Vec<&str> = Vec::new();
    for word in &words {
        if is_capitalized(word) && !(run.is_empty() && LEADING_STOPWORDS.contains(word)) {
            run.push(*word);
            continue;
        }
        if run.len() >= 2 {
            return Some(run.join(" "));
        }
        run.clear();
    }
    if run.len() >= 2 {
        return Some(run.join(" "));
    }

    words
        .iter()
        .find(|w| is_capitalized(w) && !LEADING_STOPWORDS.contains(*w))
        .map(|w| (*w).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_entity_wins() {
        let known = vec!["Ada Lovelace".to_string(), "Ada".to_string()];
        assert_eq!(
            extract_entity("Letters from ada lovelace found in archive", &known),
            Some("Ada Lovelace".to_string())
        );
    }

    #[test]
    fn multi_word_phrase() {
        assert_eq!(
            extract_entity("The Golden Gate Bridge closes for repairs", &[]),
            Some("Golden Gate Bridge".to_string())
        );
    }

    #[test]
    fn single_capitalized_fallback() {
        assert_eq!(
            extract_entity("Why astronomers are watching Betelgeuse", &[]),
            Some("Betelgeuse".to_string())
        );
    }

    #[test]
    fn nothing_capitalized() {
        assert_eq!(extract_entity("quiet day at the market", &[]), None);
    }
}

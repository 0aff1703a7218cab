use std::collections::BTreeSet;

use crate::annotation::Annotation;

/// Alphabetically sorted class labels; a label's index is its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassVocabulary {
    names: Vec<String>,
}

impl ClassVocabulary {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        Self {
            names: set.into_iter().collect(),
        }
    }

    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Annotation>,
    {
        Self::from_labels(records.into_iter().map(|r| r.class_label.as_str()))
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.names
            .binary_search_by(|name| name.as_str().cmp(label))
            .ok()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_deduplicated() {
        let vocab = ClassVocabulary::from_labels(["urchin", "crab", "fish", "crab"]);
        assert_eq!(vocab.names(), ["crab", "fish", "urchin"]);
        assert_eq!(vocab.index_of("crab"), Some(0));
        assert_eq!(vocab.index_of("urchin"), Some(2));
        assert_eq!(vocab.index_of("eel"), None);
    }

    #[test]
    fn test_order_independent() {
        let a = ClassVocabulary::from_labels(["b", "a", "c"]);
        let b = ClassVocabulary::from_labels(["c", "b", "a"]);
        assert_eq!(a, b);
    }
}

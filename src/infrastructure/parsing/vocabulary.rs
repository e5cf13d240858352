//! Fixed keyword vocabularies for colour, material and pattern detection
//!
//! Lookups walk the list in its declared order, so the first hit is the
//! earliest vocabulary entry present in the text, not the earliest position.

use regex::Regex;

use crate::infrastructure::parsing_error::{ProcessingError, ProcessingResult};

pub const COLOURS: &[&str] = &[
    "black", "white", "red", "blue", "green", "yellow", "orange", "purple", "pink", "brown", "grey",
    "gray", "silver", "gold", "navy", "beige", "cream", "multicolour", "multi-colour", "turquoise",
    "cyan", "magenta", "maroon", "olive", "teal", "lime", "indigo", "violet", "coral", "salmon",
    "khaki", "burgundy", "champagne", "bronze", "copper", "rose", "mint", "lavender", "peach",
    "cherry", "ivory", "pearl", "charcoal", "slate", "emerald", "sapphire", "ruby",
];

pub const MATERIALS: &[&str] = &[
    "MDF", "wood", "metal", "steel", "aluminium", "aluminum", "plastic", "PVC", "fabric", "leather",
    "foam", "rubber", "glass", "ceramic", "carbon", "composite", "nylon", "polyester", "paper",
    "cardboard", "cotton", "wool", "silk", "linen", "vinyl", "acrylic", "resin", "bamboo", "oak",
    "pine", "mahogany", "stainless steel", "brass", "chrome", "titanium", "fiberglass",
];

pub const PATTERNS: &[&str] = &[
    "striped", "stripes", "polka dot", "floral", "paisley", "plaid", "checkered", "checked",
    "chevron", "geometric", "animal print", "leopard", "zebra", "camouflage", "camo", "solid",
    "plain",
];

/// Upper-case the first character and lower-case the rest.
pub fn capitalise(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
struct Term {
    word: &'static str,
    lowered: String,
    whole_word: Regex,
}

/// An ordered term list with a word-boundary matcher per term.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    terms: Vec<Term>,
}

impl Vocabulary {
    pub fn compile(name: &'static str, words: &[&'static str]) -> ProcessingResult<Self> {
        let terms = words
            .iter()
            .map(|word| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
                let whole_word = Regex::new(&pattern)
                    .map_err(|e| ProcessingError::invalid_pattern(&format!("{name}/{word}"), e))?;
                Ok(Term {
                    word,
                    lowered: word.to_lowercase(),
                    whole_word,
                })
            })
            .collect::<ProcessingResult<Vec<_>>>()?;
        Ok(Self { terms })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// First term, in list order, that occurs in `text` as a whole word.
    pub fn first_whole_word(&self, text: &str) -> Option<&'static str> {
        self.all_whole_word(text).next()
    }

    /// Every term occurring in `text` as a whole word, in list order.
    pub fn all_whole_word<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'static str> + 'a {
        self.terms
            .iter()
            .filter(move |term| term.whole_word.is_match(text))
            .map(|term| term.word)
    }

    /// First term, in list order, contained anywhere in `text`.
    ///
    /// Plain substring containment, so `"red"` is found inside `"covered"`.
    pub fn first_contained(&self, text: &str) -> Option<&'static str> {
        let lowered = text.to_lowercase();
        self.terms
            .iter()
            .find(|term| lowered.contains(&term.lowered))
            .map(|term| term.word)
    }
}

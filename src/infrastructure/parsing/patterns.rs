//! Ordered regex chains used by the attribute extractors
//!
//! Each attribute owns a list of patterns ordered from most to least
//! specific. Evaluation stops at the first pattern that matches anywhere in
//! the text; there is no scoring across patterns.

use regex::{Captures, Regex};
use tracing::trace;

use crate::infrastructure::parsing_error::{ProcessingError, ProcessingResult};

/// `(rule name, pattern)` pairs, highest priority first.
pub type PatternSource = (&'static str, &'static str);

pub const DIMENSION_PATTERNS: &[PatternSource] = &[
    (
        "metric_lwh_labelled",
        r"(\d+(?:\.\d+)?)\s*(?:cm|mm|m)\s*\(L\)\s*x\s*(\d+(?:\.\d+)?)\s*(?:cm|mm|m)\s*\(W\)\s*x\s*(\d+(?:\.\d+)?)\s*(?:cm|mm|m)\s*\(H\)",
    ),
    (
        "metric_product",
        r"(\d+(?:\.\d+)?)\s*x\s*(\d+(?:\.\d+)?)\s*(?:x\s*(\d+(?:\.\d+)?))?\s*(?:cm|mm|m)\b",
    ),
    (
        "imperial_product",
        r#"(\d+(?:\.\d+)?)\s*(?:"|'|inch|inches|in)\s*x\s*(\d+(?:\.\d+)?)\s*(?:ft|feet|')"#,
    ),
    (
        "glyph_product",
        r"(\d+(?:\.\d+)?)\s*[xX×]\s*(\d+(?:\.\d+)?)\s*(?:[xX×]\s*(\d+(?:\.\d+)?))?\s*(?:cm|mm|m|inches?|ft)\b",
    ),
    (
        "dimensions_label",
        r"(?:Dimensions?|Size|Measurements?):\s*(\d+(?:\.\d+)?)\s*(?:x|×)\s*(\d+(?:\.\d+)?)\s*(?:(?:x|×)\s*(\d+(?:\.\d+)?))?\s*(?:cm|mm|m|inches?|ft)?",
    ),
    (
        "named_size_label",
        r"(?:Table size|Product size|Paper size):\s*(\d+(?:\.\d+)?)\s*(?:cm|mm|m)\s*(?:\(L\))?\s*x\s*(\d+(?:\.\d+)?)\s*(?:cm|mm|m)",
    ),
    (
        "width_height_depth",
        r#"(?:Width|W):\s*(\d+(?:\.\d+)?)\s*(?:cm|mm|m|").*?(?:Height|H):\s*(\d+(?:\.\d+)?)\s*(?:cm|mm|m|").*?(?:Depth|D):\s*(\d+(?:\.\d+)?)\s*(?:cm|mm|m|")"#,
    ),
    (
        "single_bound",
        r"(\d+(?:\.\d+)?)\s*(?:cm|mm|m)\s*(?:wide|width|height|tall|long|length)",
    ),
];

/// Unit token looked up inside a matched dimension expression.
pub const DIMENSION_UNIT_PATTERN: &str = r"(cm|mm|m|inches?|in|ft|feet)";

pub const WEIGHT_PATTERNS: &[PatternSource] = &[
    ("weight_label", r"(?:Net Weight|Weight|Net):\s*(\d+(?:\.\d+)?)\s*(?:kg|g|lbs)"),
    ("bare_kilograms", r"(\d+(?:\.\d+)?)\s*(?:kg|kgs)(?:\s|$|,)"),
];

pub const COLOUR_LABEL_PATTERNS: &[PatternSource] = &[
    ("colour_label", r"(?:Colour|Color):\s*([A-Za-z\s\-]+)"),
    ("finish_label", r"(?:Available in|Finish|Shade):\s*([A-Za-z\s\-]+)"),
    ("before_material_noun", r"([A-Za-z]+)\s+(?:Seamless|Background|Paper|Fabric|Material)"),
];

pub const COLOUR_RGB_PATTERN: &str = r"RGB\s*Values?:\s*\((\d+),\s*(\d+),\s*(\d+)\)";

pub const MATERIAL_LABEL_PATTERNS: &[PatternSource] = &[
    (
        "material_label",
        r"(?:Construction|Material|Made from|Manufactured from):\s*([A-Za-z\s\-/]+)",
    ),
    ("recycled_share", r"(?:^|\s)(\d+%\s*recycled\s+[a-z]+)"),
    ("paper_grade", r"(?:high quality|premium)\s+([a-z]+\s+paper)"),
];

pub const PATTERN_LABEL_PATTERNS: &[PatternSource] = &[("pattern_label", r"(?:Pattern):\s*([A-Za-z\s\-]+)")];

pub const SIZE_PATTERNS: &[PatternSource] = &[
    ("letter_size", r"\b((?:XX?|[23X])?[SML](?:arge|edium|mall)?)\b"),
    ("size_label", r"\bsize:?\s*([A-Z0-9\-/]+)\b"),
    ("regional_size", r"\b(\d+(?:\.\d+)?)\s*(?:UK|US|EU)\b"),
    ("one_size", r"\bone size\b"),
    ("one_size_fits_all", r"\bOSFA\b"),
];

pub const GSM_PATTERNS: &[PatternSource] = &[("gsm", r"(\d+)\s*GSM")];

pub const IDENTIFIER_PATTERNS: &[PatternSource] = &[
    ("barcode_label", r"(?:GTIN|EAN|UPC|Barcode):\s*(\d{8,14})"),
    ("product_code_label", r"(?:Product Code|Item Code|SKU):\s*([A-Z0-9\-]+)"),
];

pub const MOTOR_PATTERNS: &[PatternSource] = &[("motor_power", r"(\d+W?\s*(?:motor|watt|power)|\d+W)")];

pub const WARRANTY_PATTERNS: &[PatternSource] = &[(
    "warranty_term",
    r"(\d+\s*(?:month|year|yr)\s*(?:warranty|guarantee))",
)];

pub const BRAND_PATTERNS: &[PatternSource] = &[("brand_label", r"(?:Brand|Manufacturer):\s*([A-Za-z0-9\s\-&]+)")];

/// Compile a single case-insensitive pattern.
pub fn compile_pattern(name: &str, pattern: &str) -> ProcessingResult<Regex> {
    Regex::new(&format!("(?i){pattern}")).map_err(|e| ProcessingError::invalid_pattern(name, e))
}

/// A named, compiled pattern within a chain.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: &'static str,
    regex: Regex,
}

/// The first match of one rule.
#[derive(Debug)]
pub struct RuleMatch<'t> {
    pub rule: &'static str,
    captures: Captures<'t>,
}

impl<'t> RuleMatch<'t> {
    /// Whole matched substring.
    pub fn full(&self) -> &'t str {
        self.captures.get(0).map_or("", |m| m.as_str())
    }

    pub fn group(&self, index: usize) -> Option<&'t str> {
        self.captures.get(index).map(|m| m.as_str())
    }

    /// Participating, non-empty capture groups in order.
    pub fn groups(&self) -> Vec<&'t str> {
        self.captures
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// First capture group, or the whole match for group-less patterns.
    pub fn first_group_or_full(&self) -> &'t str {
        if self.captures.len() > 1 {
            self.group(1).unwrap_or_default()
        } else {
            self.full()
        }
    }
}

/// Priority-ordered list of rules for one attribute.
#[derive(Debug, Clone)]
pub struct PatternChain {
    attribute: &'static str,
    rules: Vec<PatternRule>,
}

impl PatternChain {
    pub fn compile(attribute: &'static str, sources: &[PatternSource]) -> ProcessingResult<Self> {
        let rules = sources
            .iter()
            .map(|(name, pattern)| {
                Ok(PatternRule {
                    name,
                    regex: compile_pattern(name, pattern)?,
                })
            })
            .collect::<ProcessingResult<Vec<_>>>()?;
        Ok(Self { attribute, rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Each rule's first match, in chain order, skipping rules that miss.
    ///
    /// Callers that validate a match and may reject it walk this lazily.
    pub fn matches<'c, 't>(&'c self, text: &'t str) -> impl Iterator<Item = RuleMatch<'t>> + 'c
    where
        't: 'c,
    {
        self.rules.iter().filter_map(move |rule| {
            rule.regex.captures(text).map(|captures| RuleMatch {
                rule: rule.name,
                captures,
            })
        })
    }

    /// The first rule that matches, in chain order.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<RuleMatch<'t>> {
        let found = self.matches(text).next();
        if let Some(hit) = &found {
            trace!("{}: rule '{}' matched '{}'", self.attribute, hit.rule, hit.full());
        }
        found
    }
}

//! Heuristic attribute extraction from detail-page text
//!
//! Every extractor is a pure function of the page (and, for some, the feed
//! title). Labelled forms are tried before bare keyword detection and the
//! first rule that matches decides the value.

use regex::Regex;
use tracing::debug;

use super::DocumentScanner;
use super::page::{ProductPage, char_window};
use super::patterns::{
    BRAND_PATTERNS, COLOUR_LABEL_PATTERNS, COLOUR_RGB_PATTERN, DIMENSION_PATTERNS, DIMENSION_UNIT_PATTERN,
    GSM_PATTERNS, IDENTIFIER_PATTERNS, MATERIAL_LABEL_PATTERNS, MOTOR_PATTERNS, PATTERN_LABEL_PATTERNS,
    PatternChain, SIZE_PATTERNS, WARRANTY_PATTERNS, WEIGHT_PATTERNS, compile_pattern,
};
use super::structured_data::LinkedDataScanner;
use super::table_scan::TableScanner;
use super::vocabulary::{COLOURS, MATERIALS, PATTERNS, Vocabulary, capitalise};
use crate::domain::keys;
use crate::infrastructure::parsing_error::ProcessingResult;

const DEFAULT_DIMENSION_UNIT: &str = "cm";
const RGB_CONTEXT_BEFORE: usize = 100;
const RGB_CONTEXT_AFTER: usize = 50;
const MAX_MATERIALS: usize = 3;

/// One regex-driven extraction, in the order the item processor runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStep {
    Dimensions,
    Weight,
    Colour,
    Material,
    Pattern,
    Size,
    Gsm,
    Identifier,
    Motor,
    Warranty,
    Brand,
}

impl ExtractionStep {
    pub const STANDARD: [Self; 6] = [
        Self::Dimensions,
        Self::Weight,
        Self::Colour,
        Self::Material,
        Self::Pattern,
        Self::Size,
    ];

    pub const SUPPLEMENTARY: [Self; 5] = [Self::Gsm, Self::Identifier, Self::Motor, Self::Warranty, Self::Brand];

    /// Steps for one item; supplementary steps follow the standard ones.
    pub fn sequence(include_supplementary: bool) -> Vec<Self> {
        let mut steps = Self::STANDARD.to_vec();
        if include_supplementary {
            steps.extend(Self::SUPPLEMENTARY);
        }
        steps
    }

    /// Attribute key the step writes.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Dimensions => keys::SIZE_DIMENSIONS,
            Self::Weight => keys::WEIGHT,
            Self::Colour => keys::COLOR,
            Self::Material => keys::MATERIAL,
            Self::Pattern => keys::PATTERN,
            Self::Size => keys::SIZE,
            Self::Gsm => keys::GSM,
            Self::Identifier => keys::GTIN,
            Self::Motor => keys::MOTOR,
            Self::Warranty => keys::WARRANTY,
            Self::Brand => keys::BRAND,
        }
    }
}

/// Compiled extraction engine, built once per run and shared by every item.
#[derive(Debug, Clone)]
pub struct AttributeExtractor {
    dimensions: PatternChain,
    dimension_unit: Regex,
    weight: PatternChain,
    colour_labels: PatternChain,
    colour_rgb: Regex,
    colours: Vocabulary,
    material_labels: PatternChain,
    materials: Vocabulary,
    pattern_label: PatternChain,
    patterns: Vocabulary,
    size: PatternChain,
    gsm: PatternChain,
    identifier: PatternChain,
    motor: PatternChain,
    warranty: PatternChain,
    brand: PatternChain,
    tables: TableScanner,
    linked_data: LinkedDataScanner,
}

impl AttributeExtractor {
    pub fn new() -> ProcessingResult<Self> {
        Ok(Self {
            dimensions: PatternChain::compile(keys::SIZE_DIMENSIONS, DIMENSION_PATTERNS)?,
            dimension_unit: compile_pattern("dimension_unit", DIMENSION_UNIT_PATTERN)?,
            weight: PatternChain::compile(keys::WEIGHT, WEIGHT_PATTERNS)?,
            colour_labels: PatternChain::compile(keys::COLOR, COLOUR_LABEL_PATTERNS)?,
            colour_rgb: compile_pattern("colour_rgb", COLOUR_RGB_PATTERN)?,
            colours: Vocabulary::compile("colour", COLOURS)?,
            material_labels: PatternChain::compile(keys::MATERIAL, MATERIAL_LABEL_PATTERNS)?,
            materials: Vocabulary::compile("material", MATERIALS)?,
            pattern_label: PatternChain::compile(keys::PATTERN, PATTERN_LABEL_PATTERNS)?,
            patterns: Vocabulary::compile("pattern", PATTERNS)?,
            size: PatternChain::compile(keys::SIZE, SIZE_PATTERNS)?,
            gsm: PatternChain::compile(keys::GSM, GSM_PATTERNS)?,
            identifier: PatternChain::compile(keys::GTIN, IDENTIFIER_PATTERNS)?,
            motor: PatternChain::compile(keys::MOTOR, MOTOR_PATTERNS)?,
            warranty: PatternChain::compile(keys::WARRANTY, WARRANTY_PATTERNS)?,
            brand: PatternChain::compile(keys::BRAND, BRAND_PATTERNS)?,
            tables: TableScanner::new()?,
            linked_data: LinkedDataScanner::new()?,
        })
    }

    /// Run one step against a parsed page.
    pub fn run(&self, step: ExtractionStep, page: &ProductPage, title: &str) -> Option<String> {
        let text = page.text();
        let value = match step {
            ExtractionStep::Dimensions => self.dimensions(text, title),
            ExtractionStep::Weight => self.weight(text),
            ExtractionStep::Colour => self.colour(text, title),
            ExtractionStep::Material => self.material(text),
            ExtractionStep::Pattern => self.pattern(text),
            ExtractionStep::Size => self.size(text, title),
            ExtractionStep::Gsm => self.gsm(text),
            ExtractionStep::Identifier => self.identifier(text, page),
            ExtractionStep::Motor => self.motor(text),
            ExtractionStep::Warranty => self.warranty(text),
            ExtractionStep::Brand => self.brand(text),
        };
        // An empty capture carries no information; treat it as a miss.
        value.filter(|v| !v.is_empty())
    }

    /// Classified key/value pairs from the page's tables.
    pub fn table_attributes(&self, page: &ProductPage) -> indexmap::IndexMap<String, String> {
        self.tables.scan(page.document())
    }

    /// `"<n1> x <n2> [x <n3>] <unit>"` from the first matching dimension form.
    pub fn dimensions(&self, text: &str, title: &str) -> Option<String> {
        let search_text = format!("{title} {text}");
        let hit = self.dimensions.first_match(&search_text)?;
        let numbers = hit.groups();
        if numbers.is_empty() {
            return None;
        }
        // Searched within the whole match, label included, so "Dimensions:"
        // yields "m" ahead of a later "cm".
        let unit = self
            .dimension_unit
            .captures(hit.full())
            .and_then(|c| c.get(1))
            .map_or(DEFAULT_DIMENSION_UNIT, |m| m.as_str());
        debug!("Dimensions via '{}': {:?} {}", hit.rule, numbers, unit);
        Some(format!("{} {unit}", numbers.join(" x ")))
    }

    /// Matched weight expression as written on the page.
    pub fn weight(&self, text: &str) -> Option<String> {
        self.weight
            .first_match(text)
            .map(|hit| hit.full().trim().to_string())
    }

    pub fn colour(&self, text: &str, title: &str) -> Option<String> {
        let search_text = format!("{title} {text}");

        // A label whose capture names no known colour falls through to the
        // next label form.
        for hit in self.colour_labels.matches(&search_text) {
            let captured = hit.group(1).unwrap_or_default().trim();
            if let Some(colour) = self.colours.first_contained(captured) {
                debug!("Colour via '{}': {}", hit.rule, colour);
                return Some(capitalise(colour));
            }
        }

        if let Some(rgb) = self.colour_rgb.find(text) {
            let context = char_window(text, rgb.start(), rgb.end(), RGB_CONTEXT_BEFORE, RGB_CONTEXT_AFTER);
            if let Some(colour) = self.colours.first_whole_word(context) {
                debug!("Colour near RGB label: {}", colour);
                return Some(capitalise(colour));
            }
        }

        self.colours.first_whole_word(&search_text).map(capitalise)
    }

    /// Labelled material verbatim, else up to three vocabulary hits.
    pub fn material(&self, text: &str) -> Option<String> {
        if let Some(hit) = self.material_labels.first_match(text) {
            return Some(hit.group(1).unwrap_or_default().trim().to_string());
        }
        let found: Vec<&str> = self.materials.all_whole_word(text).take(MAX_MATERIALS).collect();
        (!found.is_empty()).then(|| found.join(", "))
    }

    pub fn pattern(&self, text: &str) -> Option<String> {
        if let Some(hit) = self.pattern_label.first_match(text) {
            return Some(hit.group(1).unwrap_or_default().trim().to_string());
        }
        self.patterns.first_whole_word(text).map(capitalise)
    }

    pub fn size(&self, text: &str, title: &str) -> Option<String> {
        let search_text = format!("{title} {text}");
        self.size
            .first_match(&search_text)
            .map(|hit| hit.first_group_or_full().to_string())
    }

    pub fn gsm(&self, text: &str) -> Option<String> {
        self.gsm
            .first_match(text)
            .and_then(|hit| hit.group(1).map(|n| format!("{n} GSM")))
    }

    /// Labelled barcode or product code, else a JSON-LD identifier.
    pub fn identifier(&self, text: &str, page: &ProductPage) -> Option<String> {
        if let Some(hit) = self.identifier.first_match(text) {
            return Some(hit.group(1).unwrap_or_default().trim().to_string());
        }
        self.linked_data.scan(page.document())
    }

    pub fn motor(&self, text: &str) -> Option<String> {
        self.motor
            .first_match(text)
            .map(|hit| hit.full().trim().to_string())
    }

    pub fn warranty(&self, text: &str) -> Option<String> {
        self.warranty
            .first_match(text)
            .map(|hit| hit.full().trim().to_string())
    }

    pub fn brand(&self, text: &str) -> Option<String> {
        self.brand
            .first_match(text)
            .map(|hit| hit.group(1).unwrap_or_default().trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn extractor() -> AttributeExtractor {
        AttributeExtractor::new().unwrap()
    }

    #[rstest]
    #[case("Size 152cm (L) x 76cm (W) x 80cm (H)", "152 x 76 x 80 cm")]
    #[case("Roll of 2.72 x 11m backdrop", "2.72 x 11 m")]
    #[case("Cut to 152 x 76 x 80cm", "152 x 76 x 80 cm")]
    #[case("Sheet 107\" x 36ft", "107 x 36 ft")]
    #[case("Board 50 × 70 cm", "50 x 70 cm")]
    #[case("Width: 40cm, Height: 90cm, Depth: 35cm", "40 x 90 x 35 cm")]
    #[case("A shelf 60cm wide", "60 cm")]
    fn dimension_forms(extractor: AttributeExtractor, #[case] text: &str, #[case] expected: &str) {
        assert_eq!(extractor.dimensions(text, "").as_deref(), Some(expected));
    }

    #[rstest]
    fn dimension_label_unit_comes_from_the_label_text(extractor: AttributeExtractor) {
        // "Dimensions" contains an "m" before the trailing unit.
        assert_eq!(
            extractor.dimensions("Dimensions: 30 × 40", "").as_deref(),
            Some("30 x 40 m")
        );
    }

    #[rstest]
    fn dimensions_consult_the_title(extractor: AttributeExtractor) {
        assert_eq!(
            extractor.dimensions("no sizes here", "Backdrop 3 x 6m").as_deref(),
            Some("3 x 6 m")
        );
        assert_eq!(extractor.dimensions("nothing", ""), None);
    }

    #[rstest]
    #[case("Net Weight: 2.5 kg and more", "Net Weight: 2.5 kg")]
    #[case("Weight: 0.3 kg.", "Weight: 0.3 kg")]
    #[case("Ships at 12 kgs, boxed", "12 kgs,")]
    #[case("Total 4kg", "4kg")]
    fn weight_forms(extractor: AttributeExtractor, #[case] text: &str, #[case] expected: &str) {
        assert_eq!(extractor.weight(text).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("Colour: Navy Blue. In stock", "", "Blue")]
    #[case("Finish: brushed silver", "", "Silver")]
    #[case("Arctic White Seamless Paper 2.72m", "", "White")]
    #[case("Colour: Sunset. Finish: Gold leaf", "", "Gold")]
    #[case("A lovely throw in teal and grey", "", "Grey")]
    #[case("plain text", "Emerald Cushion", "Emerald")]
    fn colour_forms(extractor: AttributeExtractor, #[case] text: &str, #[case] title: &str, #[case] expected: &str) {
        assert_eq!(extractor.colour(text, title).as_deref(), Some(expected));
    }

    #[rstest]
    fn colour_near_rgb_label(extractor: AttributeExtractor) {
        let text = format!("{} Mint shade RGB Values: (170, 240, 209) swatch", "x".repeat(300));
        assert_eq!(extractor.colour(&text, "").as_deref(), Some("Mint"));
    }

    #[rstest]
    fn colour_needs_a_whole_word(extractor: AttributeExtractor) {
        assert_eq!(extractor.colour("A covered goldfish bowl", ""), None);
    }

    #[rstest]
    #[case("Material: Solid oak / steel. Care", "Solid oak / steel")]
    #[case("Made with 80% recycled polyester", "80% recycled polyester")]
    #[case("Printed on premium matte paper", "matte paper")]
    #[case("Frame of MDF with a wood veneer, steel legs and glass top", "MDF, wood, steel")]
    fn material_forms(extractor: AttributeExtractor, #[case] text: &str, #[case] expected: &str) {
        assert_eq!(extractor.material(text).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("Pattern: Houndstooth. Wash cold", "Houndstooth")]
    #[case("A classic polka dot print", "Polka dot")]
    #[case("Floral cushion with striped back", "Striped")]
    fn pattern_forms(extractor: AttributeExtractor, #[case] text: &str, #[case] expected: &str) {
        assert_eq!(extractor.pattern(text).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("Available in XL only", "", "XL")]
    #[case("True to fit", "Dress 12 UK", "12")]
    #[case("Knitted hat, one size", "", "one size")]
    #[case("Hat OSFA", "", "OSFA")]
    fn size_forms(extractor: AttributeExtractor, #[case] text: &str, #[case] title: &str, #[case] expected: &str) {
        assert_eq!(extractor.size(text, title).as_deref(), Some(expected));
    }

    #[rstest]
    fn supplementary_extractors(extractor: AttributeExtractor) {
        assert_eq!(extractor.gsm("Heavy 300gsm card").as_deref(), Some("300 GSM"));
        assert_eq!(extractor.motor("Powerful 1200W motor").as_deref(), Some("1200W motor"));
        assert_eq!(
            extractor.warranty("Comes with a 2 year warranty").as_deref(),
            Some("2 year warranty")
        );
        assert_eq!(extractor.brand("Brand: Acme & Sons.").as_deref(), Some("Acme & Sons"));
    }

    #[rstest]
    fn identifier_prefers_labels_then_linked_data(extractor: AttributeExtractor) {
        let page = ProductPage::parse(
            r#"<html><head><script type="application/ld+json">{"sku":"LD-7"}</script></head>
               <body><p>EAN: 5012345678900</p></body></html>"#,
        );
        assert_eq!(
            extractor.identifier(page.text(), &page).as_deref(),
            Some("5012345678900")
        );

        let bare = ProductPage::parse(
            r#"<html><head><script type="application/ld+json">{"sku":"LD-7"}</script></head>
               <body><p>No codes</p></body></html>"#,
        );
        assert_eq!(extractor.identifier("No codes", &bare).as_deref(), Some("LD-7"));
    }

    #[rstest]
    fn step_sequence_and_keys() {
        assert_eq!(ExtractionStep::sequence(false).len(), 6);
        let full = ExtractionStep::sequence(true);
        assert_eq!(full.len(), 11);
        assert_eq!(full[5], ExtractionStep::Size);
        assert_eq!(full[6].key(), "gsm");
        assert_eq!(ExtractionStep::Colour.key(), "color");
    }

    #[rstest]
    fn run_drops_empty_values(extractor: AttributeExtractor) {
        let page = ProductPage::parse("<p>Brand: </p>");
        assert_eq!(extractor.run(ExtractionStep::Brand, &page, ""), None);
    }

    #[rstest]
    fn stylesheet_and_script_words_are_not_attributes(extractor: AttributeExtractor) {
        let page = ProductPage::parse(
            "<style>body { color: black; background: white }</style>\
             <script>var theme = \"silver\"; var fabric = \"leather\";</script>\
             <h1>Widget</h1><p>A useful widget.</p>",
        );
        assert_eq!(extractor.run(ExtractionStep::Colour, &page, ""), None);
        assert_eq!(extractor.run(ExtractionStep::Material, &page, ""), None);
    }
}

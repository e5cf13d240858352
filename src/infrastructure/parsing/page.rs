//! Parsed detail page: the document tree plus its flattened text

use scraper::Html;

/// Elements whose text is never rendered.
const NON_RENDERED: [&str; 4] = ["script", "style", "template", "noscript"];

/// A fetched detail page ready for extraction.
pub struct ProductPage {
    document: Html,
    text: String,
}

impl ProductPage {
    /// Parse HTML. Malformed markup is repaired by the parser, never rejected.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);
        let text = rendered_text(&document);
        Self { document, text }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Every rendered text node in document order, concatenated without
    /// separators. Script, style, template and noscript bodies are left out.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Debug for ProductPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductPage")
            .field("text_len", &self.text.len())
            .finish_non_exhaustive()
    }
}

fn rendered_text(document: &Html) -> String {
    let mut text = String::new();
    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| NON_RENDERED.contains(&element.name()))
        });
        if !hidden {
            text.push_str(fragment);
        }
    }
    text
}

/// Slice of `text` spanning up to `before` characters ahead of `start` and
/// `after` characters past `end`, cut on character boundaries.
pub fn char_window(text: &str, start: usize, end: usize, before: usize, after: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(before)
        .last()
        .map_or(start, |(index, _)| index);
    let to = text[end..]
        .char_indices()
        .nth(after)
        .map_or(text.len(), |(index, _)| end + index);
    &text[from..to]
}

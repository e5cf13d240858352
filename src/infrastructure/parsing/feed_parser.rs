//! Shopping feed parser
//!
//! Reads `<item>` nodes at any depth and pulls `id`, `title` and `link` from
//! each. Every field is looked up in the commerce namespace first and falls
//! back to the same local name outside it; the two tiers are resolved per
//! field, so a feed may mix them freely.

use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use tracing::{debug, warn};

use crate::domain::ItemRecord;
use crate::infrastructure::parsing_error::{FeedParseError, FeedResult};

/// Namespace URI bound to the `g:` prefix in shopping feeds.
pub const COMMERCE_NAMESPACE: &str = "http://base.google.com/ns/1.0";

const ITEM_TAG: &[u8] = b"item";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Link,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"id" => Some(Self::Id),
            b"title" => Some(Self::Title),
            b"link" => Some(Self::Link),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Namespaced,
    Bare,
}

/// First occurrence of one field in one tier.
#[derive(Debug, Default)]
struct Slot {
    seen: bool,
    text: String,
}

#[derive(Debug, Default)]
struct FieldSlots {
    namespaced: [Slot; 3],
    bare: [Slot; 3],
}

impl FieldSlots {
    fn slot_mut(&mut self, field: Field, tier: Tier) -> &mut Slot {
        let slots = match tier {
            Tier::Namespaced => &mut self.namespaced,
            Tier::Bare => &mut self.bare,
        };
        &mut slots[field as usize]
    }

    /// The namespaced element wins whenever it exists, even when empty.
    fn resolve(&self, field: Field) -> Option<String> {
        let namespaced = &self.namespaced[field as usize];
        let chosen = if namespaced.seen {
            namespaced
        } else {
            &self.bare[field as usize]
        };
        if !chosen.seen {
            return None;
        }
        let value = chosen.text.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Field text currently being collected.
#[derive(Debug)]
struct Capture {
    field: Field,
    tier: Tier,
    depth: usize,
    text: String,
    /// Set at the first child element; later text belongs to the child's tail.
    complete: bool,
}

/// An open `<item>` element.
#[derive(Debug)]
struct ItemFrame {
    depth: usize,
    slot: usize,
    fields: FieldSlots,
    capture: Option<Capture>,
}

impl ItemFrame {
    fn new(depth: usize, slot: usize) -> Self {
        Self {
            depth,
            slot,
            fields: FieldSlots::default(),
            capture: None,
        }
    }

    /// Start collecting a direct child field unless that tier is already taken.
    fn open_field(&mut self, field: Field, tier: Tier, depth: usize) {
        let slot = self.fields.slot_mut(field, tier);
        if slot.seen {
            return;
        }
        slot.seen = true;
        self.capture = Some(Capture {
            field,
            tier,
            depth,
            text: String::new(),
            complete: false,
        });
    }

    fn close_field(&mut self) {
        if let Some(capture) = self.capture.take() {
            self.fields.slot_mut(capture.field, capture.tier).text = capture.text;
        }
    }

    fn into_record(self) -> Option<ItemRecord> {
        let url = self
            .fields
            .resolve(Field::Link)
            .filter(|link| link.starts_with("http"))?;
        Some(ItemRecord::new(
            self.fields.resolve(Field::Id),
            self.fields.resolve(Field::Title),
            url,
        ))
    }
}

/// Parser for commerce product feeds
#[derive(Debug, Clone, Default)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw feed bytes into item records, in document order.
    ///
    /// Items without an `http` link are dropped. Any structural error fails
    /// the whole parse.
    pub fn parse(&self, xml: &[u8]) -> FeedResult<Vec<ItemRecord>> {
        let mut reader = NsReader::from_reader(xml);
        let mut buf = Vec::new();

        let mut depth = 0usize;
        let mut saw_root = false;
        let mut frames: Vec<ItemFrame> = Vec::new();
        // Slots are reserved when an item opens so nested items keep document order.
        let mut slots: Vec<Option<ItemRecord>> = Vec::new();
        let mut item_count = 0usize;

        loop {
            buf.clear();
            let position = reader.buffer_position();
            let (resolved, event) = reader
                .read_resolved_event_into(&mut buf)
                .map_err(|e| map_xml_error(position, e))?;

            match event {
                Event::Start(ref start) | Event::Empty(ref start) => {
                    if depth == 0 {
                        if saw_root {
                            return Err(FeedParseError::malformed(position, "junk after document element"));
                        }
                        saw_root = true;
                    }
                    let tier = tier_of(&resolved, position)?;
                    let is_empty = matches!(event, Event::Empty(_));
                    depth += 1;

                    let local = start.local_name();
                    if local.as_ref() == ITEM_TAG {
                        item_count += 1;
                        slots.push(None);
                        frames.push(ItemFrame::new(depth, slots.len() - 1));
                    } else if let Some(frame) = frames.last_mut() {
                        if let Some(capture) = frame.capture.as_mut() {
                            capture.complete = true;
                        } else if depth == frame.depth + 1 {
                            if let Some(field) = Field::from_local_name(local.as_ref()) {
                                frame.open_field(field, tier, depth);
                            }
                        }
                    }

                    if is_empty {
                        close_element(depth, &mut frames, &mut slots);
                        depth -= 1;
                    }
                }
                Event::End(_) => {
                    if depth == 0 {
                        return Err(FeedParseError::malformed(position, "closing tag without opening tag"));
                    }
                    close_element(depth, &mut frames, &mut slots);
                    depth -= 1;
                }
                Event::Text(text) => {
                    if let Some(capture) = active_capture(&mut frames, depth) {
                        let unescaped = text
                            .unescape()
                            .map_err(|e| map_xml_error(position, e))?;
                        capture.text.push_str(&unescaped);
                    }
                }
                Event::CData(cdata) => {
                    if let Some(capture) = active_capture(&mut frames, depth) {
                        capture.text.push_str(&String::from_utf8_lossy(&cdata));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(FeedParseError::NoRootElement);
        }
        if depth > 0 {
            return Err(FeedParseError::UnclosedElements { open: depth });
        }

        let records: Vec<ItemRecord> = slots.into_iter().flatten().collect();
        if records.len() < item_count {
            warn!(
                "Dropped {} feed item(s) without an http(s) link",
                item_count - records.len()
            );
        }
        debug!("Parsed {} item(s) from feed ({} item nodes)", records.len(), item_count);
        Ok(records)
    }
}

/// Namespaced when bound to the commerce URI; every other resolution is bare.
fn tier_of(resolved: &ResolveResult<'_>, position: usize) -> FeedResult<Tier> {
    match resolved {
        ResolveResult::Bound(ns) if ns.as_ref() == COMMERCE_NAMESPACE.as_bytes() => Ok(Tier::Namespaced),
        ResolveResult::Bound(_) | ResolveResult::Unbound => Ok(Tier::Bare),
        ResolveResult::Unknown(prefix) => Err(FeedParseError::UnboundPrefix {
            prefix: String::from_utf8_lossy(prefix).into_owned(),
            position,
        }),
    }
}

fn active_capture(frames: &mut [ItemFrame], depth: usize) -> Option<&mut Capture> {
    frames
        .last_mut()?
        .capture
        .as_mut()
        .filter(|capture| capture.depth == depth && !capture.complete)
}

/// Close the element at `depth`: finish a field capture or an item.
fn close_element(depth: usize, frames: &mut Vec<ItemFrame>, slots: &mut [Option<ItemRecord>]) {
    let Some(frame) = frames.last_mut() else {
        return;
    };
    if frame.capture.as_ref().is_some_and(|c| c.depth == depth) {
        frame.close_field();
    }
    if frame.depth == depth {
        if let Some(frame) = frames.pop() {
            let slot = frame.slot;
            slots[slot] = frame.into_record();
        }
    }
}

fn map_xml_error(position: usize, err: quick_xml::Error) -> FeedParseError {
    match err {
        quick_xml::Error::EndEventMismatch { expected, found } => FeedParseError::MismatchedTag {
            position,
            expected,
            found,
        },
        other => FeedParseError::malformed(position, other),
    }
}

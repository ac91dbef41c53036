//! Streaming structural event reader built on quick-xml.

use std::collections::VecDeque;

use quick_xml::Reader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};

use crate::error::MarkupError;
use crate::event::MarkupEvent;

// ── MarkupReader ──────────────────────────────────────────────────────────

/// Turns markup text into a stream of [`MarkupEvent`]s.
///
/// Text runs are merged across entity references and CDATA sections, then
/// trimmed; whitespace-only runs are dropped. Comments, processing
/// instructions, the XML declaration and doctypes produce no events.
pub struct MarkupReader<'s> {
    src: &'s str,
    reader: Reader<&'s [u8]>,
    queue: VecDeque<MarkupEvent>,
    text: String,
    done: bool,
}

impl<'s> MarkupReader<'s> {
    pub fn new(src: &'s str) -> Self {
        Self {
            src,
            reader: Reader::from_str(src),
            queue: VecDeque::new(),
            text: String::new(),
            done: false,
        }
    }

    /// Read the whole document eagerly.
    pub fn read_all(self) -> Result<Vec<MarkupEvent>, MarkupError> {
        self.collect()
    }

    fn fill(&mut self) -> Result<(), MarkupError> {
        while self.queue.is_empty() && !self.done {
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    let offset = self.reader.error_position() as usize;
                    return Err(MarkupError::at_offset(err.to_string(), self.src, offset));
                }
            };

            match event {
                Event::Start(e) => {
                    self.flush_text();
                    self.push_start(&e)?;
                }
                Event::Empty(e) => {
                    self.flush_text();
                    self.push_start(&e)?;
                    self.queue.push_back(MarkupEvent::EndElement);
                }
                Event::End(_) => {
                    self.flush_text();
                    self.queue.push_back(MarkupEvent::EndElement);
                }
                Event::Text(e) => {
                    let text = e.decode().map_err(|err| self.error_here(err.to_string()))?;
                    self.text.push_str(&text);
                }
                Event::CData(e) => {
                    let text = std::str::from_utf8(e.as_ref())
                        .map_err(|err| self.error_here(err.to_string()))?;
                    self.text.push_str(text);
                }
                Event::GeneralRef(e) => {
                    let raw = e.decode().map_err(|err| self.error_here(err.to_string()))?;
                    let resolved = self.resolve_entity(&raw)?;
                    self.text.push_str(&resolved);
                }
                Event::Eof => {
                    self.flush_text();
                    self.done = true;
                }
                // declarations, comments, processing instructions, doctypes
                _ => {}
            }
        }
        Ok(())
    }

    fn push_start(&mut self, e: &BytesStart<'_>) -> Result<(), MarkupError> {
        let name = self.utf8(e.name().as_ref())?;
        self.queue.push_back(MarkupEvent::StartElement { name });

        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.error_here(err.to_string()))?;
            let name = self.utf8(attr.key.as_ref())?;
            let value = attr
                .unescape_value()
                .map_err(|err| self.error_here(err.to_string()))?
                .into_owned();
            self.queue.push_back(MarkupEvent::Attribute { name, value });
        }
        Ok(())
    }

    fn flush_text(&mut self) {
        let trimmed = self.text.trim();
        if !trimmed.is_empty() {
            self.queue.push_back(MarkupEvent::Text(trimmed.to_string()));
        }
        self.text.clear();
    }

    fn utf8(&self, bytes: &[u8]) -> Result<String, MarkupError> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|err| self.error_here(err.to_string()))
    }

    fn resolve_entity(&self, raw: &str) -> Result<String, MarkupError> {
        if let Some(resolved) = resolve_xml_entity(raw) {
            return Ok(resolved.to_string());
        }

        let Some(rest) = raw.strip_prefix('#') else {
            return Err(self.error_here(format!("unknown entity &{};", raw)));
        };
        let code = match rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => rest.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(|ch| ch.to_string())
            .ok_or_else(|| self.error_here(format!("invalid character reference &{};", raw)))
    }

    fn error_here(&self, msg: impl Into<String>) -> MarkupError {
        MarkupError::at_offset(msg, self.src, self.reader.buffer_position() as usize)
    }
}

impl Iterator for MarkupReader<'_> {
    type Item = Result<MarkupEvent, MarkupError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(err) = self.fill() {
            // A tokenizer error ends the stream.
            self.done = true;
            self.queue.clear();
            return Some(Err(err));
        }
        self.queue.pop_front().map(Ok)
    }
}

/// Tokenize a whole document into structural events.
pub fn read_events(src: &str) -> Result<Vec<MarkupEvent>, MarkupError> {
    MarkupReader::new(src).read_all()
}

/// Separates a namespace prefix from a local name: `x:Key`.
pub const PREFIX_SEPARATOR: char = ':';

/// Separates an owner type from a property name in a property tag: `Panel.Orientation`.
pub const PROPERTY_SEPARATOR: char = '.';

/// Attribute name that declares a namespace (`xmlns="..."` / `xmlns:p="..."`).
pub const NAMESPACE_DECLARATION: &str = "xmlns";

// ── MarkupEvent ───────────────────────────────────────────────────────────

/// One structural event of a markup document.
///
/// An element produces `StartElement`, then one `Attribute` per attribute in
/// source order, then its content, then `EndElement`. Self-closing elements
/// produce the same sequence with no content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    /// Opening tag with its raw, possibly prefixed name.
    StartElement { name: String },
    /// Attribute of the most recent `StartElement`, value already unescaped.
    Attribute { name: String, value: String },
    /// A contiguous, whitespace-trimmed text run.
    Text(String),
    /// Closing tag of the innermost open element.
    EndElement,
}

impl MarkupEvent {
    pub fn start(name: impl Into<String>) -> Self {
        Self::StartElement { name: name.into() }
    }

    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attribute { name: name.into(), value: value.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

// ── Names ─────────────────────────────────────────────────────────────────

/// Split `prefix:local` into `(Some(prefix), local)`; unprefixed names give `(None, name)`.
pub fn split_prefix(name: &str) -> (Option<&str>, &str) {
    match name.split_once(PREFIX_SEPARATOR) {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Split a property tag `Owner.Property` at its last separator.
pub fn split_property(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once(PROPERTY_SEPARATOR)
}

/// If `name` is a namespace declaration, return the declared prefix
/// (`Some("")` for the unprefixed default declaration).
pub fn declared_prefix(name: &str) -> Option<&str> {
    match split_prefix(name) {
        (None, NAMESPACE_DECLARATION) => Some(""),
        (Some(NAMESPACE_DECLARATION), prefix) => Some(prefix),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_prefixed_name() {
        assert_eq!(split_prefix("x:Key"), (Some("x"), "Key"));
        assert_eq!(split_prefix("Button"), (None, "Button"));
    }

    #[test]
    fn split_property_uses_last_dot() {
        assert_eq!(split_property("ui:Panel.Orientation"), Some(("ui:Panel", "Orientation")));
        assert_eq!(split_property("Panel"), None);
    }

    #[test]
    fn namespace_declarations() {
        assert_eq!(declared_prefix("xmlns"), Some(""));
        assert_eq!(declared_prefix("xmlns:x"), Some("x"));
        assert_eq!(declared_prefix("x:Key"), None);
        assert_eq!(declared_prefix("Title"), None);
    }
}

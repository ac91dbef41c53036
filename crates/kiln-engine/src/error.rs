use kiln_markup::MarkupError;
use thiserror::Error;

use crate::value::ObjectId;

/// Everything that can abort a compilation. There is no partial result: the
/// first error ends the parse.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The tokenizer or the extension expression parser rejected the text.
    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("syntax error: {message}")]
    Syntax { message: String },

    #[error("namespace prefix `{prefix}` is not declared")]
    UnknownPrefix { prefix: String },

    #[error("type `{name}` not found in namespaces [{}]", .namespaces.join(", "))]
    TypeNotFound { name: String, namespaces: Vec<String> },

    #[error("markup extension `{name}` not found in namespaces [{}]", .namespaces.join(", "))]
    ExtensionNotFound { name: String, namespaces: Vec<String> },

    #[error("`{name}` matches {count} types in namespace `{namespace}`")]
    AmbiguousType { name: String, namespace: String, count: usize },

    #[error("type `{owner}` has no property `{property}`")]
    PropertyNotFound { owner: String, property: String },

    #[error("cannot convert {value} ({from}) to {to}")]
    UnsupportedConversion { value: String, from: String, to: String },

    #[error("`{value}` is not a member of enumeration `{enumeration}`")]
    EnumMember { value: String, enumeration: String },

    #[error("cannot parse `{value}` as {to}: {reason}")]
    InvalidLiteral { value: String, to: String, reason: String },

    #[error("converter of `{owner}` failed to convert {value} to {to}: {reason}")]
    ConverterFailed { owner: String, value: String, to: String, reason: String },

    #[error("element assigned to keyed property `{owner}.{property}` declares no key")]
    MissingKey { owner: String, property: String },

    #[error("identifier `{id}` is declared more than once")]
    DuplicateIdentifier { id: String },

    #[error("unresolved references to [{}]", .missing.join(", "))]
    UnresolvedReferences { missing: Vec<String> },

    #[error("type `{owner}` declares more than one {metadata}")]
    AmbiguousMetadata { owner: String, metadata: String },

    #[error("markup extension `{name}` rejected its arguments: {message}")]
    InvalidExtension { name: String, message: String },

    #[error("`{expression}` requested deferral after the document was complete")]
    DeferredAfterEnd { expression: String },

    #[error("`{expression}` inside `{owner}` is still waiting on an identifier when the element closes")]
    DeferredProduct { owner: String, expression: String },

    #[error("type `{name}` has no constructor")]
    NotConstructible { name: String },

    #[error("object {object} is not an instance of `{owner}`")]
    InstanceMismatch { owner: String, object: ObjectId },

    #[error("document root is {found}, expected `{expected}`")]
    RootType { expected: String, found: String },

    #[error("compilation cancelled")]
    Cancelled,
}

/// Coarse classification of a [`CompileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Markup,
    Syntax,
    TypeResolution,
    PropertyNotFound,
    Conversion,
    MissingKey,
    DuplicateIdentifier,
    UnresolvedReference,
    AmbiguousMetadata,
    Extension,
    Instantiation,
    RootType,
    Cancelled,
}

impl CompileError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax { message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Markup(_) => ErrorKind::Markup,
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::UnknownPrefix { .. }
            | Self::TypeNotFound { .. }
            | Self::ExtensionNotFound { .. }
            | Self::AmbiguousType { .. } => ErrorKind::TypeResolution,
            Self::PropertyNotFound { .. } => ErrorKind::PropertyNotFound,
            Self::UnsupportedConversion { .. }
            | Self::EnumMember { .. }
            | Self::InvalidLiteral { .. }
            | Self::ConverterFailed { .. } => ErrorKind::Conversion,
            Self::MissingKey { .. } => ErrorKind::MissingKey,
            Self::DuplicateIdentifier { .. } => ErrorKind::DuplicateIdentifier,
            Self::UnresolvedReferences { .. } => ErrorKind::UnresolvedReference,
            Self::AmbiguousMetadata { .. } => ErrorKind::AmbiguousMetadata,
            Self::InvalidExtension { .. } | Self::DeferredAfterEnd { .. } | Self::DeferredProduct { .. } => {
                ErrorKind::Extension
            }
            Self::NotConstructible { .. } | Self::InstanceMismatch { .. } => ErrorKind::Instantiation,
            Self::RootType { .. } => ErrorKind::RootType,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_lists_every_identifier() {
        let err = CompileError::UnresolvedReferences { missing: vec!["Ghost".into(), "Other".into()] };
        assert_eq!(err.to_string(), "unresolved references to [Ghost, Other]");
        assert_eq!(err.kind(), ErrorKind::UnresolvedReference);
    }

    #[test]
    fn markup_errors_keep_their_position() {
        let err: CompileError = MarkupError { message: "bad".into(), line: 3, col: 9 }.into();
        assert_eq!(err.kind(), ErrorKind::Markup);
        assert_eq!(err.to_string(), "markup error at 3:9: bad");
    }

    #[test]
    fn conversion_failures_share_a_kind() {
        let a = CompileError::EnumMember { value: "Diagonal".into(), enumeration: "Orientation".into() };
        let b = CompileError::InvalidLiteral { value: "x".into(), to: "Int".into(), reason: "nope".into() };
        assert_eq!(a.kind(), b.kind());
    }
}

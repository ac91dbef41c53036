// ── Argument ──────────────────────────────────────────────────────────────

/// An argument value inside an extension expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// Unquoted (trimmed) or `'quoted'` text.
    Text(String),
    /// A nested `{...}` expression.
    Expression(Expression),
}

// ── NamedArgument ─────────────────────────────────────────────────────────

/// `Name=value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedArgument {
    pub name: String,
    pub value: Argument,
}

// ── Expression ────────────────────────────────────────────────────────────

/// A parsed markup extension expression.
///
/// ```text
/// {Ref Other}
/// {Format 'Total: {0}', Value={Ref total}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// Extension name, possibly prefixed: `Ref`, `x:Null`.
    pub name: String,
    /// Positional arguments, in source order. Always precede named arguments.
    pub positional: Vec<Argument>,
    /// Named arguments, in source order.
    pub named: Vec<NamedArgument>,
}

impl Expression {
    /// Look up a named argument.
    pub fn named(&self, name: &str) -> Option<&Argument> {
        self.named.iter().find(|a| a.name == name).map(|a| &a.value)
    }
}

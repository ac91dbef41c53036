//! Turns attribute and text values into [`Evaluated`] results, running
//! markup extensions where the text is an expression.

use std::collections::BTreeSet;

use kiln_markup::{Argument, Expression, parse_expression};

use crate::error::CompileError;
use crate::extension::{Evaluated, ExtensionArgs, ExtensionContext};
use crate::graph::{ObjectGraph, ObjectRegistry};
use crate::namespace::NamespaceResolver;
use crate::value::{ObjectId, Value};

/// Prefix that marks the rest of a value as literal text.
pub const ESCAPE_PREFIX: &str = "{}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueText<'t> {
    Literal(&'t str),
    Expression(&'t str),
}

/// `{}` escapes, a leading `{` starts an expression, anything else is literal.
pub fn classify(text: &str) -> ValueText<'_> {
    if let Some(rest) = text.strip_prefix(ESCAPE_PREFIX) {
        ValueText::Literal(rest)
    } else if text.starts_with('{') {
        ValueText::Expression(text)
    } else {
        ValueText::Literal(text)
    }
}

/// The property a value is evaluated for.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EvalTarget<'a> {
    pub object: ObjectId,
    pub property: &'a str,
    pub data_context: Option<&'a Value>,
    pub can_defer: bool,
}

pub(crate) struct Evaluator<'a, 'l> {
    pub resolver: &'a NamespaceResolver<'l>,
    pub graph: &'a ObjectGraph,
    pub names: &'a ObjectRegistry,
}

impl Evaluator<'_, '_> {
    pub fn evaluate(&self, text: &str, target: &EvalTarget<'_>) -> Result<Evaluated, CompileError> {
        match classify(text) {
            ValueText::Literal(literal) => Ok(Evaluated::Value(Value::String(literal.to_string()))),
            ValueText::Expression(source) => {
                let expression = parse_expression(source)?;
                self.run(&expression, source, target)
            }
        }
    }

    fn run(&self, expression: &Expression, source: &str, target: &EvalTarget<'_>) -> Result<Evaluated, CompileError> {
        let descriptor = self.resolver.find_extension(&expression.name)?;
        let Some(extension) = descriptor.extension() else {
            return Err(CompileError::ExtensionNotFound {
                name: expression.name.clone(),
                namespaces: vec![descriptor.namespace().to_string()],
            });
        };

        let mut args = ExtensionArgs::default();
        let mut missing = BTreeSet::new();
        for argument in &expression.positional {
            match self.argument(argument, source, target)? {
                Ok(value) => args.positional.push(value),
                Err(ids) => missing.extend(ids),
            }
        }
        for named in &expression.named {
            match self.argument(&named.value, source, target)? {
                Ok(value) => args.named.push((named.name.clone(), value)),
                Err(ids) => missing.extend(ids),
            }
        }

        let cx = ExtensionContext {
            property: target.property,
            target: target.object,
            data_context: target.data_context,
            graph: self.graph,
            names: self.names,
            can_defer: target.can_defer,
            expression: source,
        };
        if !missing.is_empty() {
            return cx.defer(missing);
        }

        let instance = extension.create(args).map_err(|message| CompileError::InvalidExtension {
            name: expression.name.clone(),
            message,
        })?;
        let result = instance.provide_value(&cx)?;
        log::trace!("{} -> {:?}", source, result);
        Ok(result)
    }

    /// `Err` carries the identifiers a nested expression is waiting for.
    fn argument(
        &self,
        argument: &Argument,
        source: &str,
        target: &EvalTarget<'_>,
    ) -> Result<Result<Value, BTreeSet<String>>, CompileError> {
        match argument {
            Argument::Text(text) => Ok(Ok(Value::String(text.clone()))),
            Argument::Expression(nested) => Ok(match self.run(nested, source, target)? {
                Evaluated::Value(value) => Ok(value),
                Evaluated::Nothing => Ok(Value::Null),
                Evaluated::Deferred(ids) => Err(ids),
            }),
        }
    }
}

//! The construction machine: consumes structural events and drives
//! instantiation, evaluation and assignment.

use std::sync::Arc;

use kiln_markup::MarkupEvent;
use kiln_markup::event::{declared_prefix, split_prefix, split_property};

use crate::deferred::{DeferredBinding, DeferredQueue};
use crate::error::CompileError;
use crate::evaluator::EvalTarget;
use crate::extension::Evaluated;
use crate::graph::{ObjectGraph, ObjectRegistry};
use crate::registry::builtin::boxed_alias;
use crate::registry::{ID_ATTRIBUTE, KEY_ATTRIBUTE, METADATA_NAMESPACE, TypeDescriptor, TypeLocator};
use crate::session::Session;
use crate::value::{ObjectId, Value};

// ── Frames ────────────────────────────────────────────────────────────────

/// One open element.
#[derive(Debug)]
struct Frame {
    descriptor: Arc<TypeDescriptor>,
    object: ObjectId,
    /// Open property tag, e.g. `Orientation` inside `<Panel.Orientation>`.
    property: Option<String>,
    text: Option<String>,
    key: Option<String>,
    id: Option<String>,
}

/// A start tag whose attributes are still arriving.
struct PendingElement {
    name: String,
    attributes: Vec<(String, String)>,
}

/// What a finished build hands back.
#[derive(Debug)]
pub(crate) struct BuildOutput {
    pub graph: ObjectGraph,
    pub names: ObjectRegistry,
    pub root: Value,
}

// ── GraphBuilder ──────────────────────────────────────────────────────────

pub(crate) struct GraphBuilder<'l> {
    session: Session<'l>,
    strict_metadata: bool,
    data_context: Option<Value>,
    stack: Vec<Frame>,
    pending: Option<PendingElement>,
    deferred: DeferredQueue,
    root: Option<Value>,
}

impl<'l> GraphBuilder<'l> {
    pub fn new(
        locator: &'l dyn TypeLocator,
        default_namespaces: impl IntoIterator<Item = String>,
        strict_metadata: bool,
        data_context: Option<Value>,
    ) -> Self {
        Self {
            session: Session::new(locator, default_namespaces),
            strict_metadata,
            data_context,
            stack: Vec::new(),
            pending: None,
            deferred: DeferredQueue::default(),
            root: None,
        }
    }

    pub fn feed(&mut self, event: MarkupEvent) -> Result<(), CompileError> {
        match event {
            MarkupEvent::Attribute { name, value } => match &mut self.pending {
                Some(pending) => {
                    pending.attributes.push((name, value));
                    Ok(())
                }
                None => Err(CompileError::syntax(format!("attribute `{}` outside a start tag", name))),
            },
            MarkupEvent::StartElement { name } => {
                self.flush_pending()?;
                self.pending = Some(PendingElement { name, attributes: Vec::new() });
                Ok(())
            }
            MarkupEvent::Text(text) => {
                self.flush_pending()?;
                self.text(text)
            }
            MarkupEvent::EndElement => {
                self.flush_pending()?;
                self.end_element()
            }
        }
    }

    /// End of the event stream: run the final deferred sweep and hand back the graph.
    pub fn finish(mut self) -> Result<BuildOutput, CompileError> {
        self.flush_pending()?;
        if let Some(frame) = self.stack.last() {
            return Err(CompileError::syntax(format!("element `{}` is never closed", frame.descriptor.name())));
        }
        let Some(root) = self.root.take() else {
            return Err(CompileError::syntax("document has no root element"));
        };
        if !self.deferred.is_empty() {
            log::debug!("final sweep over {} deferred binding(s)", self.deferred.len());
        }
        self.deferred.finish(&mut self.session)?;
        log::debug!("built {} object(s), {} identifier(s)", self.session.graph.len(), self.session.names.len());
        Ok(BuildOutput { graph: self.session.graph, names: self.session.names, root })
    }

    // ── Element start ─────────────────────────────────────────────────────

    fn flush_pending(&mut self) -> Result<(), CompileError> {
        match self.pending.take() {
            Some(pending) => self.open_element(pending),
            None => Ok(()),
        }
    }

    fn open_element(&mut self, pending: PendingElement) -> Result<(), CompileError> {
        let is_root = self.stack.is_empty();
        if is_root && self.root.is_some() {
            return Err(CompileError::syntax(format!("second root element `{}`", pending.name)));
        }

        let mut attributes = Vec::with_capacity(pending.attributes.len());
        for (name, value) in pending.attributes {
            match declared_prefix(&name) {
                Some("") if is_root => self.session.resolver.push_default(&value),
                Some(prefix) if is_root => self.session.resolver.declare_prefix(prefix, &value),
                Some(_) => {
                    return Err(CompileError::syntax(format!(
                        "namespace declaration `{}` on non-root element `{}`",
                        name, pending.name
                    )));
                }
                None => attributes.push((name, value)),
            }
        }

        if !is_root {
            if let Some((owner, property)) = split_property(&pending.name) {
                return self.open_property(&pending.name, owner, property, &attributes);
            }
        }

        let descriptor = self.resolve_type(&pending.name)?;
        let instance = descriptor
            .instantiate()
            .ok_or_else(|| CompileError::NotConstructible { name: descriptor.name().to_string() })?;
        let object = self.session.graph.insert(Arc::clone(&descriptor), instance);
        log::debug!("push {} as {} (depth {})", descriptor.key(), object, self.stack.len());
        self.stack.push(Frame { descriptor, object, property: None, text: None, key: None, id: None });

        for (name, value) in attributes {
            self.attribute(&name, &value)?;
        }
        Ok(())
    }

    fn open_property(
        &mut self,
        tag: &str,
        owner: &str,
        property: &str,
        attributes: &[(String, String)],
    ) -> Result<(), CompileError> {
        if !attributes.is_empty() {
            return Err(CompileError::syntax(format!("property tag `{}` cannot carry attributes", tag)));
        }
        let owner = self.resolve_type(owner)?;
        let Some(frame) = self.stack.last_mut() else {
            return Err(CompileError::syntax(format!("property tag `{}` outside an element", tag)));
        };
        if let Some(open) = &frame.property {
            return Err(CompileError::syntax(format!("property tag `{}` inside open property `{}`", tag, open)));
        }
        if frame.text.is_some() {
            return Err(CompileError::syntax(format!("property tag `{}` after text content", tag)));
        }
        if !frame.descriptor.is_assignable_to(owner.key()) {
            return Err(CompileError::syntax(format!(
                "property tag `{}` does not belong to `{}`",
                tag,
                frame.descriptor.name()
            )));
        }
        if frame.descriptor.property(property).is_none() {
            return Err(CompileError::PropertyNotFound {
                owner: frame.descriptor.name().to_string(),
                property: property.to_string(),
            });
        }
        log::trace!("open property {}.{}", frame.object, property);
        frame.property = Some(property.to_string());
        Ok(())
    }

    fn resolve_type(&self, name: &str) -> Result<Arc<TypeDescriptor>, CompileError> {
        match boxed_alias(name) {
            Some(descriptor) => Ok(descriptor),
            None => self.session.resolver.find_type(name),
        }
    }

    // ── Attributes ────────────────────────────────────────────────────────

    fn attribute(&mut self, name: &str, value: &str) -> Result<(), CompileError> {
        let (Some(prefix), local) = split_prefix(name) else {
            let object = self.top()?.object;
            return self.apply(object, name, value);
        };

        let namespace = self.session.resolver.namespace_of(prefix)?;
        if namespace != METADATA_NAMESPACE {
            return Err(CompileError::syntax(format!(
                "attribute `{}` belongs to namespace `{}`; only metadata attributes may be prefixed",
                name, namespace
            )));
        }
        let strict = self.strict_metadata;
        let frame = self.top_mut()?;
        match local {
            KEY_ATTRIBUTE => frame.key = Some(value.to_string()),
            ID_ATTRIBUTE => frame.id = Some(value.to_string()),
            _ if strict => {
                return Err(CompileError::syntax(format!("unknown metadata attribute `{}`", name)));
            }
            _ => log::warn!("ignoring unknown metadata attribute `{}`", name),
        }
        Ok(())
    }

    /// Evaluate `text` for `object.property` and assign it, skip it, or queue it.
    fn apply(&mut self, object: ObjectId, property: &str, text: &str) -> Result<(), CompileError> {
        self.session.require_property(object, property)?;
        let data_context = self.effective_data_context();
        let target = EvalTarget { object, property, data_context: data_context.as_ref(), can_defer: true };
        match self.session.evaluate(text, &target)? {
            Evaluated::Value(value) => self.session.assign(object, property, value, None),
            Evaluated::Nothing => Ok(()),
            Evaluated::Deferred(required) => {
                self.deferred.push(DeferredBinding {
                    expression: text.to_string(),
                    target: object,
                    property: property.to_string(),
                    data_context,
                    required,
                });
                Ok(())
            }
        }
    }

    /// Nearest open frame whose data-context property holds a non-null value,
    /// else the context the compilation was started with.
    fn effective_data_context(&self) -> Option<Value> {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| {
                self.session
                    .graph
                    .property(frame.object, frame.descriptor.data_context_property())
                    .filter(|value| !value.is_null())
            })
            .or_else(|| self.data_context.clone())
    }

    // ── Text ──────────────────────────────────────────────────────────────

    fn text(&mut self, text: String) -> Result<(), CompileError> {
        let Some(frame) = self.stack.last_mut() else {
            return Err(CompileError::syntax("text outside the root element"));
        };
        if frame.text.is_some() {
            return Err(CompileError::syntax(format!(
                "element `{}` has more than one text run",
                frame.descriptor.name()
            )));
        }
        frame.text = Some(text);
        Ok(())
    }

    // ── Element end ───────────────────────────────────────────────────────

    fn end_element(&mut self) -> Result<(), CompileError> {
        let frame = self.top_mut()?;
        let explicit = frame.property.take();
        if let Some(text) = frame.text.take() {
            let object = frame.object;
            let property = match &explicit {
                Some(property) => property.clone(),
                None => frame.descriptor.content_property().to_string(),
            };
            self.apply(object, &property, &text)?;
            if explicit.is_some() {
                return Ok(());
            }
        } else if let Some(property) = explicit {
            log::trace!("close property {}", property);
            return Ok(());
        }
        self.pop()
    }

    fn pop(&mut self) -> Result<(), CompileError> {
        let Some(frame) = self.stack.pop() else {
            return Err(CompileError::syntax("end tag without an open element"));
        };
        log::debug!("pop {} {}", frame.descriptor.key(), frame.object);

        let value = if frame.descriptor.is_value_factory() {
            if let Some(binding) = self.deferred.waiting_on(frame.object) {
                return Err(CompileError::DeferredProduct {
                    owner: frame.descriptor.name().to_string(),
                    expression: binding.expression.clone(),
                });
            }
            self.session
                .graph
                .instance(frame.object)
                .and_then(|instance| frame.descriptor.produce(instance))
                .ok_or_else(|| CompileError::InstanceMismatch {
                    owner: frame.descriptor.name().to_string(),
                    object: frame.object,
                })?
        } else {
            Value::Object(frame.object)
        };

        match self.stack.last() {
            None => self.root = Some(value.clone()),
            Some(parent) => {
                let object = parent.object;
                let property = match &parent.property {
                    Some(property) => property.clone(),
                    None => parent.descriptor.content_property().to_string(),
                };
                self.session.assign(object, &property, value.clone(), frame.key.as_deref())?;
            }
        }

        if let Some(id) = &frame.id {
            self.session.names.register(id, value)?;
            let can_defer = !self.stack.is_empty();
            let ran = self.deferred.drain(&mut self.session, can_defer)?;
            if ran > 0 {
                log::trace!("`{}` released {} binding(s), {} waiting", id, ran, self.deferred.len());
            }
        }
        Ok(())
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn top(&self) -> Result<&Frame, CompileError> {
        self.stack.last().ok_or_else(|| CompileError::syntax("no open element"))
    }

    fn top_mut(&mut self) -> Result<&mut Frame, CompileError> {
        self.stack.last_mut().ok_or_else(|| CompileError::syntax("end tag without an open element"))
    }
}

//! Bindings waiting on identifiers that have not been declared yet.

use std::collections::BTreeSet;
use std::mem;

use crate::error::CompileError;
use crate::evaluator::EvalTarget;
use crate::extension::Evaluated;
use crate::session::Session;
use crate::value::{ObjectId, Value};

#[derive(Debug, Clone)]
pub(crate) struct DeferredBinding {
    pub expression: String,
    pub target: ObjectId,
    pub property: String,
    /// Effective data context when the binding was first evaluated.
    pub data_context: Option<Value>,
    pub required: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    bindings: Vec<DeferredBinding>,
}

impl DeferredQueue {
    pub fn push(&mut self, binding: DeferredBinding) {
        log::debug!(
            "deferring {}.{} = {} on {:?}",
            binding.target,
            binding.property,
            binding.expression,
            binding.required
        );
        self.bindings.push(binding);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// First binding still waiting to assign into `object`.
    pub fn waiting_on(&self, object: ObjectId) -> Option<&DeferredBinding> {
        self.bindings.iter().find(|b| b.target == object)
    }

    /// Re-run every binding whose identifiers are all registered. Returns how
    /// many were re-run; unsatisfied bindings stay queued untouched.
    ///
    /// A re-run that defers again on identifiers that are still missing goes
    /// back in the queue, even when `can_defer` is false, so the final sweep
    /// reports those identifiers.
    pub fn drain(&mut self, session: &mut Session<'_>, can_defer: bool) -> Result<usize, CompileError> {
        let (ready, waiting): (Vec<_>, Vec<_>) = mem::take(&mut self.bindings)
            .into_iter()
            .partition(|b| b.required.iter().all(|id| session.names.contains(id)));
        self.bindings = waiting;
        if ready.is_empty() {
            return Ok(0);
        }

        log::debug!("draining {} deferred binding(s), {} still waiting", ready.len(), self.bindings.len());
        let count = ready.len();
        for binding in ready {
            let target = EvalTarget {
                object: binding.target,
                property: &binding.property,
                data_context: binding.data_context.as_ref(),
                can_defer: true,
            };
            match session.evaluate(&binding.expression, &target)? {
                Evaluated::Value(value) => session.assign(binding.target, &binding.property, value, None)?,
                Evaluated::Nothing => {}
                Evaluated::Deferred(required) => {
                    if !can_defer && required.iter().all(|id| session.names.contains(id)) {
                        return Err(CompileError::DeferredAfterEnd { expression: binding.expression });
                    }
                    self.push(DeferredBinding { required, ..binding });
                }
            }
        }
        Ok(count)
    }

    /// Final sweep once the document is complete: deferring is no longer
    /// allowed and anything left names an identifier that was never declared.
    pub fn finish(&mut self, session: &mut Session<'_>) -> Result<(), CompileError> {
        self.drain(session, false)?;
        if self.bindings.is_empty() {
            return Ok(());
        }
        let missing: BTreeSet<&str> = self
            .bindings
            .iter()
            .flat_map(|b| b.required.iter())
            .filter(|id| !session.names.contains(id))
            .map(String::as_str)
            .collect();
        Err(CompileError::UnresolvedReferences { missing: missing.into_iter().map(str::to_string).collect() })
    }
}

//! Handler traits and the contexts handed to them.

use super::{Dispatcher, State, Step};
use crate::transport::ResponseWriter;
use std::cell::Cell;
use strata_core::{BoxError, PluginId};

/// The process half of a handler entry.
///
/// Receives the incoming state and returns the next one. Calling
/// [`ProcessCx::parent`] runs the entry registered just before this one on
/// the same segment, usually by a module this one depends on.
///
/// Implemented for every matching closure.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a process handler",
    label = "missing `Process` implementation",
    note = "Process handlers take `(State<S>, ProcessCx<'_, Req, S>)` and return `Result<State<S>, BoxError>`."
)]
pub trait Process<Req, S>: Send + Sync + 'static {
    /// Produce the next state.
    fn process(&self, state: State<S>, cx: ProcessCx<'_, Req, S>) -> Result<State<S>, BoxError>;
}

impl<Req, S, F> Process<Req, S> for F
where
    F: Fn(State<S>, ProcessCx<'_, Req, S>) -> Result<State<S>, BoxError> + Send + Sync + 'static,
{
    fn process(&self, state: State<S>, cx: ProcessCx<'_, Req, S>) -> Result<State<S>, BoxError> {
        self(state, cx)
    }
}

/// The render half of a handler entry.
///
/// Runs during the render pass with the state left by the process pass
/// and the render handlers of deeper segments. Calling [`RenderCx::parent`]
/// runs the entry registered just before this one.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a render handler",
    label = "missing `Render` implementation",
    note = "Render handlers take `(State<S>, RenderCx<'_, Req, S>)` and return `Result<State<S>, BoxError>`."
)]
pub trait Render<Req, S>: Send + Sync + 'static {
    /// Render the state and return it, possibly transformed.
    fn render(&self, state: State<S>, cx: RenderCx<'_, Req, S>) -> Result<State<S>, BoxError>;
}

impl<Req, S, F> Render<Req, S> for F
where
    F: Fn(State<S>, RenderCx<'_, Req, S>) -> Result<State<S>, BoxError> + Send + Sync + 'static,
{
    fn render(&self, state: State<S>, cx: RenderCx<'_, Req, S>) -> Result<State<S>, BoxError> {
        self(state, cx)
    }
}

/// Where a handler runs: the request, the segment being matched and its
/// position in the handler chain.
pub struct ProcessCx<'a, Req, S> {
    pub(super) dispatcher: &'a Dispatcher<Req, S>,
    pub(super) step: Step<'a, Req, S>,
    pub(super) request: &'a Req,
    pub(super) segments: &'a [String],
    pub(super) failed: &'a Cell<Option<usize>>,
}

impl<'a, Req: 'static, S: 'static> ProcessCx<'a, Req, S> {
    /// Run the previous entry of the chain on `state`.
    ///
    /// Returns `state` unchanged when this is the first entry. The parent
    /// runs on the same segment; it never advances the path.
    pub fn parent(&self, state: State<S>) -> Result<State<S>, BoxError> {
        match self.step.parent() {
            Some(parent) => self.dispatcher.invoke_process(
                parent,
                state,
                self.request,
                self.segments,
                self.failed,
            ),
            None => Ok(state),
        }
    }

    /// The request being dispatched.
    pub fn request(&self) -> &'a Req {
        self.request
    }

    /// The path segment this handler was matched on.
    pub fn segment(&self) -> &'a str {
        &self.segments[self.step.segment]
    }

    /// Segments after the current one.
    pub fn remaining(&self) -> &'a [String] {
        &self.segments[self.step.segment + 1..]
    }

    /// The path consumed so far, current segment included.
    pub fn path(&self) -> String {
        consumed(self.segments, self.step.segment)
    }

    /// Returns `true` on the last segment of the path.
    pub fn is_final(&self) -> bool {
        self.step.segment + 1 == self.segments.len()
    }

    /// The module whose routing table matched the segment.
    pub fn module(&self) -> &'a PluginId {
        self.step.module
    }

    /// The module that registered the running entry.
    pub fn owner(&self) -> &'a PluginId {
        self.step.entry().module()
    }

    /// Number of parent calls between the dispatcher and this handler.
    pub fn depth(&self) -> usize {
        self.step.depth
    }
}

/// Like [`ProcessCx`], plus the response writer.
pub struct RenderCx<'a, Req, S> {
    pub(super) dispatcher: &'a Dispatcher<Req, S>,
    pub(super) step: Step<'a, Req, S>,
    pub(super) request: &'a Req,
    pub(super) segments: &'a [String],
    pub(super) writer: &'a mut dyn ResponseWriter,
    pub(super) failed: &'a Cell<Option<usize>>,
}

impl<'a, Req: 'static, S: 'static> RenderCx<'a, Req, S> {
    /// Run the previous entry's render handler on `state`.
    ///
    /// Returns `state` unchanged when this is the first entry.
    pub fn parent(&mut self, state: State<S>) -> Result<State<S>, BoxError> {
        match self.step.parent() {
            Some(parent) => self.dispatcher.invoke_render(
                parent,
                state,
                self.request,
                self.segments,
                &mut *self.writer,
                self.failed,
            ),
            None => Ok(state),
        }
    }

    /// The response writer.
    pub fn writer(&mut self) -> &mut dyn ResponseWriter {
        &mut *self.writer
    }

    /// The request being dispatched.
    pub fn request(&self) -> &'a Req {
        self.request
    }

    /// The path segment this handler was matched on.
    pub fn segment(&self) -> &'a str {
        &self.segments[self.step.segment]
    }

    /// The path consumed up to the current segment.
    pub fn path(&self) -> String {
        consumed(self.segments, self.step.segment)
    }

    /// Returns `true` on the bootstrap segment, the last one rendered.
    pub fn is_final(&self) -> bool {
        self.step.segment == 0
    }

    /// The module whose routing table matched the segment.
    pub fn module(&self) -> &'a PluginId {
        self.step.module
    }

    /// The module that registered the running entry.
    pub fn owner(&self) -> &'a PluginId {
        self.step.entry().module()
    }

    /// Number of parent calls between the dispatcher and this handler.
    pub fn depth(&self) -> usize {
        self.step.depth
    }
}

pub(super) fn consumed(segments: &[String], segment: usize) -> String {
    format!("/{}", segments[1..=segment].join("/"))
}

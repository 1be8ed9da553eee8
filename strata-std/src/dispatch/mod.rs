//! Two-pass request dispatch.
//!
//! # Process pass
//!
//! The request path is split on `/`. Segment 0 is matched against the
//! bootstrap module's table. At each step the last entry of the matched
//! chain runs; it may call into earlier entries of the same chain through
//! its parent continuation. The step is then recorded and the next segment
//! is looked up in the tables of the chain's owners, from the last entry
//! downwards. The first owner with a match wins. No match yields
//! [`State::NotFound`].
//!
//! # Render pass
//!
//! The recorded steps are replayed in reverse: the most specific segment
//! renders first, the bootstrap segment last. The bootstrap renderer turns
//! [`State::NotFound`] into a `404` and rejects any other state that
//! reaches it.

mod handler;

pub use handler::{Process, ProcessCx, Render, RenderCx};

use crate::{
    builtin::ROOT_MODULE_ID,
    error::{DispatchError, UnclaimedState},
    routing::{HandlerEntry, RoutingTable},
    transport::{RequestPath, ResponseWriter},
};
use handler::consumed;
use std::{cell::Cell, fmt};
use strata_core::{BoxError, PluginId};
use tracing::{debug, debug_span, trace};

/// The value threaded through handlers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum State<S> {
    /// Nothing produced yet.
    #[default]
    Empty,
    /// No route matched. Rendered as `404` by the bootstrap renderer.
    NotFound,
    /// A handler-defined value.
    Value(S),
}

impl<S> State<S> {
    /// Returns `true` for [`State::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, State::NotFound)
    }

    /// The carried value, if any.
    pub fn value(&self) -> Option<&S> {
        match self {
            State::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Take the carried value, if any.
    pub fn into_value(self) -> Option<S> {
        match self {
            State::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Transform the carried value.
    pub fn map<T>(self, f: impl FnOnce(S) -> T) -> State<T> {
        match self {
            State::Empty => State::Empty,
            State::NotFound => State::NotFound,
            State::Value(value) => State::Value(f(value)),
        }
    }
}

impl<S> From<S> for State<S> {
    fn from(value: S) -> Self {
        State::Value(value)
    }
}

/// A position in the handler chains: which chain, which entry, which
/// segment, and how many parent calls deep.
pub(crate) struct Step<'t, Req, S> {
    module: &'t PluginId,
    entries: &'t [HandlerEntry<Req, S>],
    index: usize,
    segment: usize,
    depth: usize,
}

impl<Req, S> Clone for Step<'_, Req, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Req, S> Copy for Step<'_, Req, S> {}

impl<'t, Req, S> Step<'t, Req, S> {
    /// The top of a chain; `entries` must not be empty.
    fn top(module: &'t PluginId, entries: &'t [HandlerEntry<Req, S>], segment: usize) -> Self {
        Self {
            module,
            entries,
            index: entries.len() - 1,
            segment,
            depth: 0,
        }
    }

    fn entry(&self) -> &'t HandlerEntry<Req, S> {
        &self.entries[self.index]
    }

    fn parent(self) -> Option<Self> {
        let index = self.index.checked_sub(1)?;
        Some(Self {
            index,
            depth: self.depth + 1,
            ..self
        })
    }

    fn restart(self) -> Self {
        Self::top(self.module, self.entries, self.segment)
    }

    /// The entry that raised an error: the innermost parent recorded in
    /// `failed`, or this step's own entry.
    fn failed_entry(&self, failed: &Cell<Option<usize>>) -> &'t HandlerEntry<Req, S> {
        &self.entries[failed.get().unwrap_or(self.index)]
    }
}

/// The steps recorded by [`Dispatcher::process`], consumed by
/// [`Dispatcher::render`].
pub struct DispatchTrace<'t, Req, S> {
    segments: Vec<String>,
    steps: Vec<Step<'t, Req, S>>,
}

impl<Req, S> DispatchTrace<'_, Req, S> {
    /// The request path split into segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// For each recorded step, the module whose table matched and the
    /// segment it matched.
    pub fn frames(&self) -> impl Iterator<Item = (&PluginId, &str)> {
        self.steps
            .iter()
            .map(|step| (step.module, self.segments[step.segment].as_str()))
    }
}

impl<Req, S> fmt::Debug for DispatchTrace<'_, Req, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames()).finish()
    }
}

/// Split a request path into segments.
///
/// Segment 0 is always the empty segment addressed to the bootstrap
/// module, and a missing leading `/` is implied. Every other `/` starts a
/// segment, so a trailing `/` yields a trailing empty segment that must be
/// routed like any other.
pub fn split_path(path: &str) -> Vec<String> {
    let mut segments = vec![String::new()];
    if path.is_empty() {
        return segments;
    }
    let rest = path.strip_prefix('/').unwrap_or(path);
    segments.extend(rest.split('/').map(str::to_string));
    segments
}

/// Remember the innermost entry of a chain whose handler failed. A
/// success clears it, so a parent error the caller recovered from is not
/// blamed for a later one.
fn record_failure<T>(result: &Result<T, BoxError>, index: usize, failed: &Cell<Option<usize>>) {
    match result {
        Ok(_) => failed.set(None),
        Err(_) if failed.get().is_none() => failed.set(Some(index)),
        Err(_) => {}
    }
}

/// A frozen routing table that dispatches requests.
///
/// `Dispatcher` is `Send + Sync` whenever the request and state types are;
/// concurrent requests share it and keep their dispatch state on the stack.
pub struct Dispatcher<Req, S> {
    table: RoutingTable<Req, S>,
}

impl<Req: 'static, S: 'static> Dispatcher<Req, S> {
    /// Freeze a routing table.
    pub fn new(table: RoutingTable<Req, S>) -> Self {
        Self { table }
    }

    /// The frozen table.
    pub fn table(&self) -> &RoutingTable<Req, S> {
        &self.table
    }

    pub(crate) fn invoke_process(
        &self,
        step: Step<'_, Req, S>,
        state: State<S>,
        request: &Req,
        segments: &[String],
        failed: &Cell<Option<usize>>,
    ) -> Result<State<S>, BoxError> {
        let cx = ProcessCx {
            dispatcher: self,
            step,
            request,
            segments,
            failed,
        };
        let result = step.entry().process().process(state, cx);
        record_failure(&result, step.index, failed);
        result
    }

    pub(crate) fn invoke_render(
        &self,
        step: Step<'_, Req, S>,
        state: State<S>,
        request: &Req,
        segments: &[String],
        writer: &mut dyn ResponseWriter,
        failed: &Cell<Option<usize>>,
    ) -> Result<State<S>, BoxError> {
        let cx = RenderCx {
            dispatcher: self,
            step,
            request,
            segments,
            writer,
            failed,
        };
        let result = step.entry().render().render(state, cx);
        record_failure(&result, step.index, failed);
        result
    }

    /// The chain mounted on `segment` by an owner of `step`'s chain,
    /// searched from the last entry down.
    fn descend(&self, step: &Step<'_, Req, S>, segment: usize, name: &str) -> Option<Step<'_, Req, S>> {
        step.entries[..=step.index].iter().rev().find_map(|entry| {
            let (module, routes) = self.table.module_entry(entry.module().as_str())?;
            let entries = routes.get(name)?;
            Some(Step::top(module, entries, segment))
        })
    }
}

impl<Req: RequestPath + 'static, S: 'static> Dispatcher<Req, S> {
    /// Run the process pass.
    ///
    /// Returns the final state together with the trace to hand to
    /// [`render`](Self::render). A path that stops matching yields
    /// [`State::NotFound`], not an error.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Process`] if a handler fails. Processing stops at
    /// the failing segment.
    pub fn process(
        &self,
        state: State<S>,
        request: &Req,
    ) -> Result<(State<S>, DispatchTrace<'_, Req, S>), DispatchError> {
        let span = debug_span!("dispatch", path = request.path());
        let _enter = span.enter();

        let mut trace = DispatchTrace {
            segments: split_path(request.path()),
            steps: Vec::new(),
        };

        let Some((module, routes)) = self.table.module_entry(ROOT_MODULE_ID) else {
            return Ok((State::NotFound, trace));
        };
        let Some(entries) = routes.get(&trace.segments[0]) else {
            return Ok((State::NotFound, trace));
        };

        let mut step = Step::top(module, entries, 0);
        let mut state = state;
        loop {
            trace!(module = %step.module, segment = step.segment, "processing segment");
            let failed = Cell::new(None);
            state = self
                .invoke_process(step, state, request, &trace.segments, &failed)
                .map_err(|source| DispatchError::Process {
                    module: step.failed_entry(&failed).module().clone(),
                    path: consumed(&trace.segments, step.segment),
                    source,
                })?;
            trace.steps.push(step);

            let next = step.segment + 1;
            let Some(name) = trace.segments.get(next) else {
                return Ok((state, trace));
            };
            match self.descend(&step, next, name) {
                Some(found) => step = found,
                None => {
                    debug!(segment = %name, "no route for segment");
                    return Ok((State::NotFound, trace));
                }
            }
        }
    }

    /// Run the render pass over a trace produced by
    /// [`process`](Self::process) on the same dispatcher.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Render`] if a handler fails, or
    /// [`DispatchError::UnhandledState`] if a state other than
    /// [`State::NotFound`] reaches the bootstrap renderer.
    pub fn render(
        &self,
        state: State<S>,
        trace: DispatchTrace<'_, Req, S>,
        request: &Req,
        writer: &mut dyn ResponseWriter,
    ) -> Result<State<S>, DispatchError> {
        let span = debug_span!("render", path = request.path());
        let _enter = span.enter();

        let mut state = state;
        for step in trace.steps.iter().rev().map(|step| step.restart()) {
            trace!(module = %step.module, segment = step.segment, "rendering segment");
            let failed = Cell::new(None);
            state = self
                .invoke_render(step, state, request, &trace.segments, &mut *writer, &failed)
                .map_err(|source| {
                    let path = consumed(&trace.segments, step.segment);
                    if source.is::<UnclaimedState>() {
                        DispatchError::UnhandledState { path }
                    } else {
                        DispatchError::Render {
                            module: step.failed_entry(&failed).module().clone(),
                            path,
                            source,
                        }
                    }
                })?;
        }
        Ok(state)
    }

    /// Run both passes.
    pub fn dispatch(
        &self,
        state: State<S>,
        request: &Req,
        writer: &mut dyn ResponseWriter,
    ) -> Result<State<S>, DispatchError> {
        let (state, trace) = self.process(state, request)?;
        self.render(state, trace, request, writer)
    }
}

impl<Req, S> fmt::Debug for Dispatcher<Req, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("table", &self.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BufferedResponse;
    use http::StatusCode;
    use std::sync::{Arc, Mutex};
    use strata_core::Plugin;

    type Table = RoutingTable<&'static str, String>;

    fn plugin(id: &str, dependencies: &[&str]) -> Plugin {
        Plugin::parse(id, "1.0.0", dependencies).unwrap()
    }

    /// bootstrap <- core ("" on bootstrap) <- about ("about" on core).
    fn table(log: &Arc<Mutex<Vec<String>>>) -> Table {
        let mut table = Table::new();

        let core = plugin("core", &["bootstrap [1.0.0,1.0.0]"]);
        let (process_log, render_log) = (Arc::clone(log), Arc::clone(log));
        table.routes(&core).get(ROOT_MODULE_ID).unwrap().add_route(
            "",
            move |state, cx| {
                process_log.lock().unwrap().push(format!("process core depth={}", cx.depth()));
                cx.parent(state)
            },
            move |state, mut cx| {
                render_log.lock().unwrap().push("render core".into());
                match state {
                    State::Value(_) => Ok(state),
                    other => cx.parent(other),
                }
            },
        );

        let about = plugin("about", &["core [1.0.0,1.0.0]"]);
        let (process_log, render_log) = (Arc::clone(log), Arc::clone(log));
        table.routes(&about).get("core").unwrap().add_route(
            "about",
            move |_, cx| {
                process_log.lock().unwrap().push(format!("process about final={}", cx.is_final()));
                Ok(State::Value(format!("about {}", cx.path())))
            },
            move |state, mut cx| {
                render_log.lock().unwrap().push("render about".into());
                if let State::Value(body) = &state {
                    cx.writer().write(body.as_bytes());
                }
                Ok(state)
            },
        );

        table
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("/about"), ["", "about"]);
        assert_eq!(split_path("about"), ["", "about"]);
        assert_eq!(split_path("/about/"), ["", "about", ""]);
        assert_eq!(split_path("/a/b"), ["", "a", "b"]);
        assert_eq!(split_path("/a//b"), ["", "a", "", "b"]);
        assert_eq!(split_path("/"), ["", ""]);
        assert_eq!(split_path(""), [""]);
    }

    #[test]
    fn test_about_reaches_about_renderer_then_core() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(table(&log));

        let (state, trace) = dispatcher.process(State::Empty, &"/about").unwrap();
        assert_eq!(state, State::Value("about /about".to_string()));
        let frames: Vec<_> = trace.frames().map(|(m, s)| (m.as_str(), s)).collect();
        assert_eq!(frames, [(ROOT_MODULE_ID, ""), ("core", "about")]);

        let mut response = BufferedResponse::new();
        let state = dispatcher
            .render(state, trace, &"/about", &mut response)
            .unwrap();

        assert_eq!(state, State::Value("about /about".to_string()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), b"about /about");
        assert_eq!(
            *log.lock().unwrap(),
            [
                "process core depth=0",
                "process about final=true",
                "render about",
                "render core",
            ]
        );
    }

    #[test]
    fn test_trailing_slash_is_its_own_segment() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(table(&log));

        let (state, trace) = dispatcher.process(State::Empty, &"/about/").unwrap();
        assert!(state.is_not_found());
        assert_eq!(trace.segments(), ["", "about", ""]);
        assert_eq!(trace.len(), 2);

        let mut response = BufferedResponse::new();
        dispatcher
            .render(state, trace, &"/about/", &mut response)
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unmatched_segment_renders_not_found() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(table(&log));

        let (state, trace) = dispatcher.process(State::Empty, &"/missing").unwrap();
        assert!(state.is_not_found());
        assert_eq!(trace.len(), 1);

        let mut response = BufferedResponse::new();
        let state = dispatcher
            .render(state, trace, &"/missing", &mut response)
            .unwrap();
        assert!(state.is_not_found());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body(), b"404 page not found\n");
    }

    #[test]
    fn test_bootstrap_alone_is_not_found() {
        let dispatcher = Dispatcher::new(Table::new());
        let mut response = BufferedResponse::new();
        let state = dispatcher
            .dispatch(State::Empty, &"/missing", &mut response)
            .unwrap();
        assert!(state.is_not_found());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unclaimed_state_is_an_error() {
        let mut table = Table::new();
        let echo = plugin("echo", &[]);
        table
            .routes(&echo)
            .get(ROOT_MODULE_ID)
            .unwrap()
            .add_route(
                "",
                |_, _| Ok(State::Value("unrendered".into())),
                |state, mut cx| cx.parent(state),
            );

        let dispatcher = Dispatcher::new(table);
        let mut response = BufferedResponse::new();
        let err = dispatcher
            .dispatch(State::Empty, &"", &mut response)
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnhandledState { .. }));
    }

    #[test]
    fn test_handler_error_stops_request() {
        let mut table = Table::new();
        let broken = plugin("broken", &[]);
        table
            .routes(&broken)
            .get(ROOT_MODULE_ID)
            .unwrap()
            .add_route(
                "",
                |_, _| Err("database unavailable".into()),
                |state, _| Ok(state),
            );

        let dispatcher = Dispatcher::new(table);
        let Err(DispatchError::Process { module, path, source }) =
            dispatcher.process(State::Empty, &"/anything")
        else {
            panic!("expected a process error");
        };
        assert_eq!(module, "broken");
        assert_eq!(path, "/");
        assert_eq!(source.to_string(), "database unavailable");

        assert_eq!(dispatcher.table().lookup(ROOT_MODULE_ID, "").unwrap().len(), 2);
    }

    #[test]
    fn test_render_error_stops_rendering() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut table = table(&log);
        let broken = plugin("broken", &["core [1.0.0,1.0.0]"]);
        table.routes(&broken).get("core").unwrap().add_route(
            "broken",
            |_, _| Ok(State::Value("half done".into())),
            |_, _| Err("template missing".into()),
        );
        let dispatcher = Dispatcher::new(table);

        let mut response = BufferedResponse::new();
        let Err(DispatchError::Render { module, path, source }) =
            dispatcher.dispatch(State::Empty, &"/broken", &mut response)
        else {
            panic!("expected a render error");
        };
        assert_eq!(module, "broken");
        assert_eq!(path, "/broken");
        assert_eq!(source.to_string(), "template missing");
        assert!(response.body().is_empty());
        assert_eq!(*log.lock().unwrap(), ["process core depth=0"]);
    }

    /// bootstrap <- flaky <- outer, all on the empty segment. `outer` only
    /// delegates to `flaky`.
    fn layered(process_fails: bool) -> Dispatcher<&'static str, String> {
        let mut table = Table::new();
        let flaky = plugin("flaky", &[]);
        table.routes(&flaky).get(ROOT_MODULE_ID).unwrap().add_route(
            "",
            move |state, _| {
                if process_fails {
                    return Err("flaky process".into());
                }
                Ok(state)
            },
            |_, _| Err("flaky render".into()),
        );
        let outer = plugin("outer", &["flaky [1.0.0,1.0.0]"]);
        table.routes(&outer).get(ROOT_MODULE_ID).unwrap().add_route(
            "",
            |state, cx| cx.parent(state),
            |state, mut cx| cx.parent(state),
        );
        Dispatcher::new(table)
    }

    #[test]
    fn test_errors_name_the_failing_parent() {
        let dispatcher = layered(true);
        let Err(DispatchError::Process { module, path, .. }) = dispatcher.process(State::Empty, &"")
        else {
            panic!("expected a process error");
        };
        assert_eq!(module, "flaky");
        assert_eq!(path, "/");

        let dispatcher = layered(false);
        let (state, trace) = dispatcher.process(State::Empty, &"").unwrap();
        let mut response = BufferedResponse::new();
        let Err(DispatchError::Render { module, source, .. }) =
            dispatcher.render(state, trace, &"", &mut response)
        else {
            panic!("expected a render error");
        };
        assert_eq!(module, "flaky");
        assert_eq!(source.to_string(), "flaky render");
    }

    #[test]
    fn test_dispatcher_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dispatcher<http::Request<()>, String>>();
    }
}

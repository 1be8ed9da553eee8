//! Built-in modules.
//!
//! - [`Bootstrap`] - the implicit root module. Every routing table starts
//!   with its not-found handler and default renderer on the empty segment.
//! - [`CoreModule`] - mounts the empty segment on bootstrap and renders
//!   values through a caller-supplied function.
//! - [`AboutModule`] - mounts `about` on core and produces a fixed value.

use crate::{
    dispatch::{ProcessCx, RenderCx, State},
    error::UnclaimedState,
    module::Module,
    routing::{PathSpec, Routes},
    transport::ResponseWriter,
};
use std::{fmt, sync::Arc};
use strata_core::{BoxError, Dependency, Plugin, Version, VersionRange};

/// Id of the implicit root module.
pub const ROOT_MODULE_ID: &str = "bootstrap";

/// Id of [`CoreModule`].
pub const CORE_MODULE_ID: &str = "core";

/// Id of [`AboutModule`].
pub const ABOUT_MODULE_ID: &str = "about";

const BUILTIN_VERSION: Version = Version::new(1, 0, 0);

/// The bootstrap process handler: every request it sees is not found.
pub fn not_found<Req, S>(_state: State<S>, _cx: ProcessCx<'_, Req, S>) -> Result<State<S>, BoxError> {
    Ok(State::NotFound)
}

/// The bootstrap renderer.
///
/// Writes a `404` for [`State::NotFound`]. Any other state reaching it was
/// left unrendered by every module above, which is reported as
/// [`UnclaimedState`].
pub fn default_renderer<Req: 'static, S: 'static>(state: State<S>, mut cx: RenderCx<'_, Req, S>) -> Result<State<S>, BoxError> {
    match state {
        State::NotFound => {
            cx.writer().not_found();
            Ok(State::NotFound)
        }
        _ => Err(Box::new(UnclaimedState)),
    }
}

/// The implicit root module, prepended to every module set by
/// [`load_modules`](crate::runtime::load_modules).
///
/// Its routes are part of every new [`RoutingTable`](crate::routing::RoutingTable),
/// so it has nothing to do on start.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    plugin: Plugin,
}

impl Bootstrap {
    /// `bootstrap 1.0.0`, without dependencies.
    pub fn new() -> Self {
        Self {
            plugin: Plugin::new(ROOT_MODULE_ID, BUILTIN_VERSION),
        }
    }
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, Req, S> Module<C, Req, S> for Bootstrap {
    fn plugin(&self) -> &Plugin {
        &self.plugin
    }
}

type RenderValue<S> = dyn Fn(&S, &mut dyn ResponseWriter) -> Result<(), BoxError> + Send + Sync;

/// Mounts the empty segment on bootstrap.
///
/// Its process handler defers to bootstrap. Its renderer writes
/// [`State::Value`] through the function given to [`CoreModule::new`],
/// hands [`State::NotFound`] down to bootstrap and ignores
/// [`State::Empty`].
pub struct CoreModule<S> {
    plugin: Plugin,
    render: Arc<RenderValue<S>>,
}

impl<S> CoreModule<S> {
    /// `core 1.0.0`, rendering values with `render`.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&S, &mut dyn ResponseWriter) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            plugin: Plugin::new(CORE_MODULE_ID, BUILTIN_VERSION),
            render: Arc::new(render),
        }
    }
}

impl<S> fmt::Debug for CoreModule<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreModule")
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

impl<C, Req: 'static, S: 'static> Module<C, Req, S> for CoreModule<S> {
    fn plugin(&self) -> &Plugin {
        &self.plugin
    }

    fn start(&self, _context: &mut C, routes: &mut Routes<'_, Req, S>) -> Result<(), BoxError> {
        let render = Arc::clone(&self.render);
        routes.get(ROOT_MODULE_ID)?.add_route(
            PathSpec::default(),
            |state, cx| cx.parent(state),
            move |state, mut cx| match state {
                State::Value(ref value) => {
                    render(value, cx.writer())?;
                    Ok(state)
                }
                State::NotFound => cx.parent(state),
                State::Empty => Ok(state),
            },
        );
        Ok(())
    }
}

/// Mounts `about` on core and answers it with a fixed value.
#[derive(Debug, Clone)]
pub struct AboutModule<S> {
    plugin: Plugin,
    value: S,
}

impl<S> AboutModule<S> {
    /// `about 1.0.0`, depending on `core [1.0.0,1.0.0]`.
    pub fn new(value: S) -> Self {
        let plugin = Plugin::new(ABOUT_MODULE_ID, BUILTIN_VERSION).with_dependency(Dependency::new(
            CORE_MODULE_ID,
            VersionRange::exact(BUILTIN_VERSION),
        ));
        Self { plugin, value }
    }
}

impl<C, Req: 'static, S> Module<C, Req, S> for AboutModule<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn plugin(&self) -> &Plugin {
        &self.plugin
    }

    fn start(&self, _context: &mut C, routes: &mut Routes<'_, Req, S>) -> Result<(), BoxError> {
        let value = self.value.clone();
        routes.get(CORE_MODULE_ID)?.add_route(
            ABOUT_MODULE_ID,
            move |_, _| Ok(State::Value(value.clone())),
            |state, _| Ok(state),
        );
        Ok(())
    }
}

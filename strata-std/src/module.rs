//! Modules: a plugin descriptor plus lifecycle callbacks.

use crate::routing::Routes;
use std::fmt;
use strata_core::{BoxError, Plugin};

/// A loadable unit: a [`Plugin`] descriptor with optional start and stop
/// callbacks.
///
/// `C` is the application context threaded through every callback, `Req`
/// the request type and `S` the state payload of the dispatcher the module
/// mounts routes on. Both callbacks default to doing nothing.
///
/// # Example
///
/// ```rust,ignore
/// struct About(Plugin);
///
/// impl Module<(), http::Request<()>, String> for About {
///     fn plugin(&self) -> &Plugin {
///         &self.0
///     }
///
///     fn start(&self, _: &mut (), routes: &mut Routes<'_, http::Request<()>, String>) -> Result<(), BoxError> {
///         routes.get("core")?.add_route(
///             "about",
///             |_, _| Ok(State::Value("about".to_string())),
///             |state, _| Ok(state),
///         );
///         Ok(())
///     }
/// }
/// ```
pub trait Module<C, Req, S> {
    /// The descriptor used for dependency resolution.
    fn plugin(&self) -> &Plugin;

    /// Called once all dependencies have started.
    fn start(&self, _context: &mut C, _routes: &mut Routes<'_, Req, S>) -> Result<(), BoxError> {
        Ok(())
    }

    /// Called in reverse start order on shutdown.
    fn stop(&self, _context: &mut C) -> Result<(), BoxError> {
        Ok(())
    }
}

type StartFn<C, Req, S> =
    Box<dyn Fn(&mut C, &mut Routes<'_, Req, S>) -> Result<(), BoxError> + Send + Sync>;
type StopFn<C> = Box<dyn Fn(&mut C) -> Result<(), BoxError> + Send + Sync>;

/// A module built from closures.
///
/// # Example
///
/// ```rust,ignore
/// let about = FnModule::new(Plugin::parse("about", "1.0.0", ["core [1.0.0,1.0.0]"])?)
///     .on_start(|_, routes| {
///         routes.get("core")?.add_route("about", about_handler, about_renderer);
///         Ok(())
///     });
/// ```
pub struct FnModule<C, Req, S> {
    plugin: Plugin,
    start: Option<StartFn<C, Req, S>>,
    stop: Option<StopFn<C>>,
}

impl<C, Req, S> FnModule<C, Req, S> {
    /// A module that does nothing on start and stop.
    pub fn new(plugin: Plugin) -> Self {
        Self {
            plugin,
            start: None,
            stop: None,
        }
    }

    /// Set the start callback.
    pub fn on_start<F>(mut self, start: F) -> Self
    where
        F: Fn(&mut C, &mut Routes<'_, Req, S>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.start = Some(Box::new(start));
        self
    }

    /// Set the stop callback.
    pub fn on_stop<F>(mut self, stop: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.stop = Some(Box::new(stop));
        self
    }
}

impl<C, Req, S> Module<C, Req, S> for FnModule<C, Req, S> {
    fn plugin(&self) -> &Plugin {
        &self.plugin
    }

    fn start(&self, context: &mut C, routes: &mut Routes<'_, Req, S>) -> Result<(), BoxError> {
        match &self.start {
            Some(start) => start(context, routes),
            None => Ok(()),
        }
    }

    fn stop(&self, context: &mut C) -> Result<(), BoxError> {
        match &self.stop {
            Some(stop) => stop(context),
            None => Ok(()),
        }
    }
}

impl<C, Req, S> fmt::Debug for FnModule<C, Req, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModule")
            .field("plugin", &self.plugin)
            .field("start", &self.start.is_some())
            .field("stop", &self.stop.is_some())
            .finish()
    }
}

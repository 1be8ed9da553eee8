//! Module runtime: load a module set into a running application.

use crate::{
    builtin::Bootstrap,
    dispatch::Dispatcher,
    error::LoadError,
    loader::{self, LoadedPlugins},
    module::Module,
    routing::RoutingTable,
};
use std::{error::Error, fmt, sync::Arc};
use strata_core::Plugin;
use tracing::{info, warn};

/// A boxed module.
pub type BoxModule<C, Req, S> = Box<dyn Module<C, Req, S>>;

/// A fully loaded module set.
pub struct Application<C, Req, S> {
    context: C,
    modules: Vec<BoxModule<C, Req, S>>,
    plugins: LoadedPlugins,
    dispatcher: Arc<Dispatcher<Req, S>>,
}

impl<C, Req, S> Application<C, Req, S> {
    /// The context as left by the start callbacks.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutable access to the context.
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Loaded plugins in start order, bootstrap first.
    pub fn plugins(&self) -> &LoadedPlugins {
        &self.plugins
    }

    /// The frozen routing table, shareable across threads.
    pub fn dispatcher(&self) -> &Arc<Dispatcher<Req, S>> {
        &self.dispatcher
    }

    /// Stop every module in reverse start order.
    ///
    /// On failure the modules not yet stopped stay loaded, the failing one
    /// included, and a later call resumes with it.
    pub fn shutdown(&mut self) -> Result<(), LoadError> {
        stop_modules(&mut self.plugins, &mut self.context, &self.modules)?;
        info!("application shut down");
        Ok(())
    }

    /// Give up the application, keeping the context.
    pub fn into_context(self) -> C {
        self.context
    }
}

impl<C, Req, S> fmt::Debug for Application<C, Req, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("plugins", &self.plugins)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// A module set that failed to load.
///
/// Modules that did start stay started until [`rollback`](Self::rollback)
/// stops them.
pub struct PartialLoad<C, Req, S> {
    error: LoadError,
    context: C,
    modules: Vec<BoxModule<C, Req, S>>,
    plugins: LoadedPlugins,
}

impl<C, Req, S> PartialLoad<C, Req, S> {
    /// Why loading stopped.
    pub fn error(&self) -> &LoadError {
        &self.error
    }

    /// Number of modules still started, bootstrap included.
    pub fn loaded(&self) -> usize {
        self.plugins.len()
    }

    /// The modules still started, in start order.
    pub fn plugins(&self) -> &LoadedPlugins {
        &self.plugins
    }

    /// The context as left by the last callback.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Stop every started module in reverse start order.
    pub fn rollback(&mut self) -> Result<(), LoadError> {
        stop_modules(&mut self.plugins, &mut self.context, &self.modules)
    }

    /// Split into the context and the load error.
    pub fn into_parts(self) -> (C, LoadError) {
        (self.context, self.error)
    }
}

impl<C, Req, S> fmt::Debug for PartialLoad<C, Req, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialLoad")
            .field("error", &self.error)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

impl<C, Req, S> fmt::Display for PartialLoad<C, Req, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module loading stopped after {} modules", self.plugins.len())
    }
}

impl<C, Req, S> Error for PartialLoad<C, Req, S> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

fn stop_modules<C, Req, S>(
    plugins: &mut LoadedPlugins,
    context: &mut C,
    modules: &[BoxModule<C, Req, S>],
) -> Result<(), LoadError> {
    plugins.unload(context, |context, loaded| modules[loaded.index()].stop(context))
}

/// Resolve and start a module set.
///
/// The [`Bootstrap`] module is prepended, so modules may declare a
/// dependency on it. Each module starts with a [`Routes`](crate::routing::Routes)
/// accessor scoped to its plugin; once every module has started the routing
/// table is frozen into the application's [`Dispatcher`].
///
/// # Errors
///
/// Returns a [`PartialLoad`] holding the [`LoadError`] and whatever started
/// before it.
///
/// # Example
///
/// ```rust,ignore
/// let mut app = load_modules(AppContext::default(), vec![
///     Box::new(CoreModule::new(render_json)) as BoxModule<_, _, _>,
///     Box::new(AboutModule::new(about)),
/// ])?;
/// let response = app.dispatcher().dispatch(State::Empty, &request, &mut BufferedResponse::new())?;
/// app.shutdown()?;
/// ```
pub fn load_modules<C, Req, S>(
    context: C,
    modules: impl IntoIterator<Item = BoxModule<C, Req, S>>,
) -> Result<Application<C, Req, S>, PartialLoad<C, Req, S>>
where
    Req: 'static,
    S: 'static,
{
    let mut all: Vec<BoxModule<C, Req, S>> = vec![Box::new(Bootstrap::new())];
    all.extend(modules);

    let plugins: Vec<Plugin> = all.iter().map(|module| module.plugin().clone()).collect();
    let mut table = RoutingTable::new();

    let outcome = loader::load(context, plugins, |context, loaded| {
        let mut routes = table.routes(loaded.plugin());
        all[loaded.index()].start(context, &mut routes)
    });

    match outcome.result {
        Ok(()) => {
            info!(modules = outcome.plugins.len(), "application loaded");
            Ok(Application {
                context: outcome.context,
                modules: all,
                plugins: outcome.plugins,
                dispatcher: Arc::new(Dispatcher::new(table)),
            })
        }
        Err(error) => {
            warn!(loaded = outcome.plugins.len(), %error, "application partially loaded");
            Err(PartialLoad {
                error,
                context: outcome.context,
                modules: all,
                plugins: outcome.plugins,
            })
        }
    }
}

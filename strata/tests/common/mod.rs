//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Once;
use strata::{
    BoxModule, FnModule, Plugin, ResponseWriter, State,
    testing::{CallLog, RecordingModule},
};
use tracing_subscriber::EnvFilter;

pub type Request = http::Request<()>;
pub type TestModule = BoxModule<(), Request, String>;

/// Install a test subscriber once; filter with `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn request(path: &str) -> Request {
    http::Request::get(path).body(()).unwrap()
}

pub fn recording(plugins: Vec<Plugin>, log: &CallLog) -> Vec<TestModule> {
    plugins
        .into_iter()
        .map(|plugin| Box::new(RecordingModule::new(plugin, log.clone())) as TestModule)
        .collect()
}

pub fn write_value(value: &String, writer: &mut dyn ResponseWriter) -> Result<(), strata::BoxError> {
    writer.write(value.as_bytes());
    Ok(())
}

/// A module mounting `segment` on `target`, answering with `value` and
/// logging `process <id>` / `render <id>` calls.
pub fn responder(plugin: Plugin, target: &'static str, segment: &'static str, value: &'static str, log: &CallLog) -> TestModule {
    let id = plugin.id().to_string();
    let log = log.clone();
    Box::new(FnModule::<(), Request, String>::new(plugin).on_start(move |_, routes| {
        let (process_log, render_log) = (log.clone(), log.clone());
        let (process_id, render_id) = (id.clone(), id.clone());
        routes.get(target)?.add_route(
            segment,
            move |_, _| {
                process_log.record(format!("process {process_id}"));
                Ok(State::Value(value.to_string()))
            },
            move |state, _| {
                render_log.record(format!("render {render_id}"));
                Ok(state)
            },
        );
        Ok(())
    }))
}

//! Testing utilities for Strata.
//!
//! # Features
//!
//! - [`CallLog`]: a shared, ordered record of lifecycle and handler calls
//! - [`RecordingModule`]: a module that records its start and stop calls
//!   and can be told to fail either
//! - [`fixtures`]: a small plugin universe with ranged dependencies

use crate::{module::Module, routing::Routes};
use std::sync::{Arc, Mutex};
use strata_core::{BoxError, Plugin};

// ============================================================================
// Call Log
// ============================================================================

/// An ordered record of calls, shared between clones.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::new();
/// let module = RecordingModule::new(fixtures::base(), log.clone());
///
/// // Load the module...
///
/// assert_eq!(log.entries(), ["start base"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    /// Get a copy of the entries.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Entries starting with `prefix`, with the prefix stripped.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter_map(|entry| entry.strip_prefix(prefix))
            .map(str::to_string)
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

// ============================================================================
// Recording Module
// ============================================================================

/// A module that records `start <id>` and `stop <id>` into a [`CallLog`].
///
/// Failing calls are recorded too, before the error is returned.
#[derive(Debug, Clone)]
pub struct RecordingModule {
    plugin: Plugin,
    log: CallLog,
    fail_start: bool,
    fail_stop: bool,
}

impl RecordingModule {
    /// Record calls for `plugin` into `log`.
    pub fn new(plugin: Plugin, log: CallLog) -> Self {
        Self {
            plugin,
            log,
            fail_start: false,
            fail_stop: false,
        }
    }

    /// Make the start callback fail.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Make the stop callback fail.
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }
}

impl<C, Req, S> Module<C, Req, S> for RecordingModule {
    fn plugin(&self) -> &Plugin {
        &self.plugin
    }

    fn start(&self, _context: &mut C, _routes: &mut Routes<'_, Req, S>) -> Result<(), BoxError> {
        self.log.record(format!("start {}", self.plugin.id()));
        if self.fail_start {
            return Err(format!("{} refused to start", self.plugin.id()).into());
        }
        Ok(())
    }

    fn stop(&self, _context: &mut C) -> Result<(), BoxError> {
        self.log.record(format!("stop {}", self.plugin.id()));
        if self.fail_stop {
            return Err(format!("{} refused to stop", self.plugin.id()).into());
        }
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A plugin universe with overlapping version ranges.
///
/// | plugin | version | dependencies |
/// |---|---|---|
/// | base | 1.0.0 | |
/// | maven | 1.0.2 | base `[1.0.0,1.0.2)` |
/// | maven-test | 1.0.1 | maven `(1.0.0,2.0.0-beta)` |
/// | maven-artifact | 1.0.0 | maven `(1.0.0,1.0.2]`, mvn-test-reports `[1.0.0,1.0.0]` |
/// | mvn-test-reports | 1.0.0 | maven-test `[1.0.1,1.0.1]` |
/// | git | 1.0.2 | base `[1.0.0,1.0.1]` |
pub mod fixtures {
    use strata_core::Plugin;

    fn plugin(id: &str, version: &str, dependencies: &[&str]) -> Plugin {
        Plugin::parse(id, version, dependencies).unwrap()
    }

    /// `base 1.0.0`
    pub fn base() -> Plugin {
        plugin("base", "1.0.0", &[])
    }

    /// `maven 1.0.2`
    pub fn maven() -> Plugin {
        plugin("maven", "1.0.2", &["base [1.0.0,1.0.2)"])
    }

    /// `maven-test 1.0.1`
    pub fn maven_test() -> Plugin {
        plugin("maven-test", "1.0.1", &["maven (1.0.0,2.0.0-beta)"])
    }

    /// `maven-artifact 1.0.0`
    pub fn maven_artifact() -> Plugin {
        plugin(
            "maven-artifact",
            "1.0.0",
            &["maven (1.0.0,1.0.2]", "mvn-test-reports [1.0.0,1.0.0]"],
        )
    }

    /// `mvn-test-reports 1.0.0`
    pub fn mvn_test_reports() -> Plugin {
        plugin("mvn-test-reports", "1.0.0", &["maven-test [1.0.1,1.0.1]"])
    }

    /// `git 1.0.2`
    pub fn git() -> Plugin {
        plugin("git", "1.0.2", &["base [1.0.0,1.0.1]"])
    }

    /// Every fixture, in dependency-first order.
    pub fn all() -> Vec<Plugin> {
        vec![
            base(),
            maven(),
            maven_test(),
            mvn_test_reports(),
            maven_artifact(),
            git(),
        ]
    }
}

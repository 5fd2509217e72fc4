//! Run-scoped logging handle
//!
//! Pipeline components receive an `ImportLog` instead of calling the global
//! `log` macros. Every message carries the run (and batch) scope, and tests can
//! hand in their own sink to inspect what a run reported.

use log::{Level, Log, Metadata, Record};
use std::fmt;
use std::sync::Arc;

const TARGET: &str = "collection_import";

/// Forwards to whatever logger the process installed (env_logger in `main`)
struct ProcessLogger;

impl Log for ProcessLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        log::logger().log(record)
    }

    fn flush(&self) {
        log::logger().flush()
    }
}

#[derive(Clone)]
pub struct ImportLog {
    sink: Arc<dyn Log>,
    scope: Arc<str>,
}

impl ImportLog {
    pub fn new(sink: Arc<dyn Log>, scope: impl Into<String>) -> Self {
        Self {
            sink,
            scope: Arc::from(scope.into()),
        }
    }

    /// Log through the process-wide logger
    pub fn process(scope: impl Into<String>) -> Self {
        Self::new(Arc::new(ProcessLogger), scope)
    }

    /// Same sink, narrower scope (`run/batch-3`)
    pub fn child(&self, scope: impl fmt::Display) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            scope: Arc::from(format!("{}/{}", self.scope, scope)),
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args)
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Warn, args)
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args)
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Debug, args)
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder().level(level).target(TARGET).build();
        if !self.sink.enabled(&metadata) {
            return;
        }
        self.sink.log(
            &Record::builder()
                .metadata(metadata)
                .args(format_args!("[{}] {}", self.scope, args))
                .build(),
        );
    }
}

impl fmt::Debug for ImportLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportLog")
            .field("scope", &self.scope)
            .finish()
    }
}

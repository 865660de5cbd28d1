//! Per-application-type deeper checks.
//!
//! A checker only runs once instance counts already match. It may raise its
//! own alerts; the reconciler ignores what it returns apart from logging an
//! error.
//!
//! # Built-in checkers
//! - `state`: every matched instance must be in the expected YARN state

pub mod state;

use async_trait::async_trait;
use notify::AlertSink;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppSpec;
use crate::yarn::{AppInstance, Endpoint};

/// What a checker gets to know about the cycle it runs in.
pub struct CheckContext<'a> {
    pub spec: &'a AppSpec,
    pub active_rm: &'a Endpoint,
    pub node_name: &'a str,
}

/// Trait for application-type checkers
#[async_trait]
pub trait Checker: Send + Sync {
    /// Tag used in `check_type`
    fn name(&self) -> &'static str;

    async fn check(
        &self,
        instances: &[AppInstance],
        ctx: &CheckContext<'_>,
        alerts: &dyn AlertSink,
    ) -> anyhow::Result<()>;
}

/// Maps a `check_type` tag to its checker.
#[derive(Clone, Default)]
pub struct CheckerRegistry {
    checkers: HashMap<String, Arc<dyn Checker>>,
}

impl CheckerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in checker.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(state::StateChecker));
        registry
    }

    /// Register a checker under its own name, replacing any previous one.
    pub fn register(&mut self, checker: Arc<dyn Checker>) {
        self.checkers.insert(checker.name().to_string(), checker);
    }

    pub fn get(&self, check_type: &str) -> Option<Arc<dyn Checker>> {
        self.checkers.get(check_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }
}

//! Filter engine controller.
//!
//! Coordinates the filter workflow for one list view:
//! 1. Restore persisted filters for the bound entity
//! 2. Accept activate / deactivate / edit / clear triggers from the view
//! 3. Persist the touched field and mirror removals into the address
//! 4. Compile and publish to the output channel
//!
//! Phases run `Idle -> Restoring -> Active`, then `Active -> Applying ->
//! Active` for every trigger. Each trigger runs to completion before the
//! next is accepted.

use crate::catalog::{FilterCatalog, FilterDefinition, FilterKind};
use crate::config::EngineConfig;
use crate::error::{FilterError, Result};
use crate::logging::structured::LogContext;
use crate::query::{compile_client, compile_server, CompilationStrategy, ResultPage};
use crate::routing::UrlSynchronizer;
use crate::state::{ActiveFilterState, FilterValue};
use crate::storage::{KeyValueStore, PersistedFilterRecord, PersistedValue, PersistenceAdapter};
use crate::{log_debug, log_info, log_warn};

use super::channel::{EngineOutput, OutputChannel, UpstreamInbox};
use super::context::EngineContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    Restoring,
    Active,
    Applying,
}

/// Mode-specific state. Only client mode keeps a backup snapshot.
#[derive(Debug)]
enum ModeState {
    Client {
        /// Last unfiltered payload; every output is derived from it.
        backup: Option<ResultPage>,
    },
    Server,
}

impl ModeState {
    fn for_strategy(strategy: CompilationStrategy) -> Self {
        match strategy {
            CompilationStrategy::ClientPredicate => ModeState::Client { backup: None },
            CompilationStrategy::ServerParams => ModeState::Server,
        }
    }
}

pub struct FilterEngineController {
    ctx: EngineContext,
    log_ctx: LogContext,
    catalog: FilterCatalog,
    state: ActiveFilterState,
    mode: ModeState,
    persistence: PersistenceAdapter,
    url: Option<UrlSynchronizer>,
    url_sync_enabled: bool,
    output: OutputChannel,
    inbox: UpstreamInbox,
    phase: EnginePhase,
}

impl FilterEngineController {
    /// Bind an engine to `entity` and restore its persisted filters.
    pub fn new(
        entity: &str,
        catalog: FilterCatalog,
        strategy: CompilationStrategy,
        persistence: PersistenceAdapter,
        output: OutputChannel,
    ) -> Self {
        let ctx = EngineContext::new(entity, strategy);
        let log_ctx = ctx.log_context();

        let mut engine = Self {
            ctx,
            log_ctx,
            catalog,
            state: ActiveFilterState::new(),
            mode: ModeState::for_strategy(strategy),
            persistence,
            url: None,
            url_sync_enabled: true,
            output,
            inbox: UpstreamInbox::new(),
            phase: EnginePhase::Idle,
        };
        engine.restore();
        engine
    }

    /// Build from an [`EngineConfig`], persisting into `store`.
    pub fn from_config(
        config: &EngineConfig,
        entity: &str,
        catalog: FilterCatalog,
        store: Box<dyn KeyValueStore>,
        output: OutputChannel,
    ) -> Self {
        let persistence = PersistenceAdapter::new(store, &config.storage_key);
        let mut engine = Self::new(entity, catalog, config.strategy, persistence, output);
        engine.url_sync_enabled = config.url_sync;
        engine
    }

    /// Attach an address mirror. Ignored when URL sync is disabled.
    pub fn with_url_sync(mut self, url: UrlSynchronizer) -> Self {
        if self.url_sync_enabled {
            self.url = Some(url);
        } else {
            log_debug!(self.log_ctx, "URL_SYNC_DISABLED", base = url.base());
        }
        self
    }

    // --- Accessors ---

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn catalog(&self) -> &FilterCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &ActiveFilterState {
        &self.state
    }

    pub fn output(&self) -> &OutputChannel {
        &self.output
    }

    /// Handle the list loader pushes fresh unfiltered payloads into.
    pub fn upstream_inbox(&self) -> UpstreamInbox {
        self.inbox.clone()
    }

    /// The unfiltered snapshot outputs are derived from (client mode only).
    pub fn backup(&self) -> Option<&ResultPage> {
        match &self.mode {
            ModeState::Client { backup } => backup.as_ref(),
            ModeState::Server => None,
        }
    }

    /// Active definitions, in catalog order.
    pub fn active_definitions(&self) -> Vec<&FilterDefinition> {
        self.catalog.select(self.state.active_ids())
    }

    /// Every definition in catalog order, flagged with whether it is active.
    pub fn available_definitions(&self) -> Vec<(&FilterDefinition, bool)> {
        self.catalog
            .list()
            .iter()
            .map(|def| (def, self.state.is_active(def.id)))
            .collect()
    }

    /// Whether the view should offer a clear button for `field`.
    pub fn clear_button_visible(&self, field: &str) -> bool {
        let Some(def) = self.catalog.by_field(field) else {
            return false;
        };
        def.kind != FilterKind::DateRange
            && self.state.value(field).is_some_and(FilterValue::narrows)
    }

    // --- Triggers ---

    /// Activate an inactive filter or deactivate an active one. Returns
    /// whether the filter is active afterwards.
    pub fn toggle(&mut self, id: u32) -> Result<bool> {
        let def = self.lookup_id(id)?;
        if self.state.is_active(def.id) {
            self.deactivate(id)?;
            Ok(false)
        } else {
            self.activate(id)?;
            Ok(true)
        }
    }

    pub fn activate(&mut self, id: u32) -> Result<()> {
        let def = self.lookup_id(id)?.clone();
        if !self.state.activate(&def) {
            return Ok(());
        }
        log_info!(self.log_ctx, "FILTER_ACTIVATED", field = def.field, id = def.id);

        self.persist_field(&def);
        self.run_applying();
        Ok(())
    }

    pub fn deactivate(&mut self, id: u32) -> Result<()> {
        let def = self.lookup_id(id)?.clone();
        if self.state.deactivate(&def).is_none() {
            return Ok(());
        }
        log_info!(self.log_ctx, "FILTER_DEACTIVATED", field = def.field, id = def.id);

        let field_ctx = self.log_ctx.with_field(&def.field);
        if let Err(e) =
            self.persistence
                .remove_field(&self.ctx.entity, &self.catalog, &def.field, &field_ctx)
        {
            log_warn!(field_ctx, "PERSIST_REMOVE_FAILED", error = e.to_string());
        }
        if let Some(url) = &self.url {
            if let Err(e) = url.on_deactivate(&def.field, &field_ctx) {
                log_warn!(field_ctx, "ADDRESS_SYNC_FAILED", error = e.to_string());
            }
        }

        self.run_applying();
        Ok(())
    }

    /// Replace the value of an active filter, identified by field.
    pub fn set_value(&mut self, field: &str, value: FilterValue) -> Result<()> {
        let def = self.lookup_field(field)?.clone();
        if let Err(e) = self.state.set_value(&def, value) {
            log_debug!(self.log_ctx.with_field(field), "SET_VALUE_REJECTED", error = e.to_string());
            return Err(e);
        }
        log_debug!(self.log_ctx.with_field(field), "FILTER_VALUE_SET");

        self.persist_field(&def);
        self.run_applying();
        Ok(())
    }

    /// Reset a filter's input without removing its chip.
    pub fn clear(&mut self, field: &str) -> Result<()> {
        let def = self.lookup_field(field)?.clone();
        if let Err(e) = self.state.clear(&def) {
            log_debug!(self.log_ctx.with_field(field), "CLEAR_REJECTED", error = e.to_string());
            return Err(e);
        }
        log_debug!(self.log_ctx.with_field(field), "FILTER_CLEARED");

        self.persist_field(&def);
        self.run_applying();
        Ok(())
    }

    /// Recompile and publish without changing any filter.
    pub fn apply(&mut self) {
        self.run_applying();
    }

    /// Accept a fresh unfiltered payload from the list loader.
    pub fn receive_upstream(&mut self, page: ResultPage) {
        self.inbox.push(page);
        self.poll_upstream();
    }

    /// Adopt a payload waiting in the inbox and re-apply. Returns whether
    /// one was adopted.
    pub fn poll_upstream(&mut self) -> bool {
        if let ModeState::Server = self.mode {
            if self.inbox.take().is_some() {
                log_debug!(self.log_ctx, "UPSTREAM_IGNORED", reason = "server_mode");
            }
            return false;
        }

        let Some(fresh) = self.inbox.take() else {
            return false;
        };
        self.adopt_backup(fresh);
        self.run_applying();
        true
    }

    // --- Internals ---

    /// Replay the persisted record. Entries that cannot be replayed (unknown
    /// filter, wrong kind, or a name key shadowed by the filter's field key)
    /// are pruned from the store so later removals leave nothing behind.
    fn restore(&mut self) {
        self.phase = EnginePhase::Restoring;
        log_info!(
            self.log_ctx,
            "RESTORE_START",
            strategy = self.ctx.strategy.as_str(),
            created_at = self.ctx.created_at.to_rfc3339(),
            filters = self.catalog.len()
        );

        let mut stale = Vec::new();
        if let Some(record) = self.persistence.load(&self.ctx.entity, &self.catalog, &self.log_ctx) {
            // Field keys win over name keys for the same filter.
            let (by_field, by_name): (Vec<_>, Vec<_>) = record
                .fields
                .iter()
                .partition(|(key, _)| self.catalog.by_field(key).is_some());
            for (key, persisted) in by_field.into_iter().chain(by_name) {
                if !self.replay(key, persisted) {
                    stale.push(key.clone());
                }
            }
        }

        if !stale.is_empty() {
            log_info!(self.log_ctx, "RESTORE_PRUNE", keys = stale);
            if let Err(e) =
                self.persistence
                    .remove_keys(&self.ctx.entity, &self.catalog, &stale, &self.log_ctx)
            {
                log_warn!(self.log_ctx, "PERSIST_REMOVE_FAILED", error = e.to_string());
            }
        }

        log_info!(
            self.log_ctx,
            "RESTORE_COMPLETE",
            active = self.state.active_ids().len()
        );

        self.compile_and_publish();
        self.phase = EnginePhase::Active;
    }

    /// Activate and fill the filter behind `key`. Returns whether it applied.
    fn replay(&mut self, key: &str, persisted: &PersistedValue) -> bool {
        let field_ctx = self.log_ctx.with_field(key);
        let Some(def) = self.catalog.by_field_or_name(key).cloned() else {
            log_warn!(field_ctx, "RESTORE_SKIP", reason = "unknown_filter");
            return false;
        };
        if self.state.is_active(def.id) {
            log_warn!(field_ctx, "RESTORE_SKIP", reason = "superseded");
            return false;
        }
        let value = match persisted.to_filter_value(&def) {
            Ok(value) => value,
            Err(e) => {
                log_warn!(field_ctx, "RESTORE_SKIP", reason = e.to_string());
                return false;
            }
        };

        self.state.activate(&def);
        if let Err(e) = self.state.set_value(&def, value) {
            log_warn!(field_ctx, "RESTORE_SKIP", reason = e.to_string());
            self.state.deactivate(&def);
            return false;
        }
        true
    }

    fn run_applying(&mut self) {
        self.phase = EnginePhase::Applying;
        self.compile_and_publish();
        self.phase = EnginePhase::Active;
    }

    /// Compile against the current snapshot and publish.
    ///
    /// In client mode the backup is never replaced mid-application: payloads
    /// pushed into the inbox while a page is being published wait there,
    /// then the newest is adopted and the filters re-applied to it.
    fn compile_and_publish(&mut self) {
        let snapshot = self.state.snapshot();

        match &mut self.mode {
            ModeState::Server => {
                let params = compile_server(&snapshot, &self.catalog, &self.log_ctx);
                if params.is_empty() {
                    self.output.publish(EngineOutput::NoParams);
                } else {
                    self.output.publish(EngineOutput::Params(params));
                }
            }
            ModeState::Client { backup } => loop {
                let Some(current) = backup.as_ref() else {
                    log_debug!(self.log_ctx, "COMPILE_SKIP", reason = "no_snapshot");
                    return;
                };

                let page = compile_client(current, &snapshot, &self.catalog, &self.log_ctx);
                self.output.publish(EngineOutput::Page(page));

                match self.inbox.take() {
                    Some(fresh) => {
                        log_debug!(self.log_ctx, "UPSTREAM_ADOPTED", count = fresh.count, deferred = true);
                        *backup = Some(fresh);
                    }
                    None => return,
                }
            },
        }
    }

    fn adopt_backup(&mut self, fresh: ResultPage) {
        if let ModeState::Client { backup } = &mut self.mode {
            log_debug!(self.log_ctx, "UPSTREAM_ADOPTED", count = fresh.count, deferred = false);
            *backup = Some(fresh);
        }
    }

    fn persist_field(&self, def: &FilterDefinition) {
        let Some(value) = self.state.value(&def.field) else {
            return;
        };
        let record = PersistedFilterRecord::new()
            .with_field(&def.field, PersistedValue::from_filter_value(value));
        let field_ctx = self.log_ctx.with_field(&def.field);
        if let Err(e) = self
            .persistence
            .save(&self.ctx.entity, &self.catalog, &record, &field_ctx)
        {
            log_warn!(field_ctx, "PERSIST_SAVE_FAILED", error = e.to_string());
        }
    }

    fn lookup_id(&self, id: u32) -> Result<&FilterDefinition> {
        self.catalog.by_id(id).ok_or_else(|| {
            log_debug!(self.log_ctx, "UNKNOWN_FILTER", id = id);
            FilterError::UnknownFilterReference(format!("filter id {}", id))
        })
    }

    fn lookup_field(&self, field: &str) -> Result<&FilterDefinition> {
        self.catalog.by_field(field).ok_or_else(|| {
            log_debug!(self.log_ctx, "UNKNOWN_FILTER", field = field);
            FilterError::UnknownFilterReference(format!("filter field '{}'", field))
        })
    }
}

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use selector_core::{
    CascadeConfig, ConditionCallback, DashboardSignal, DependencyCall, DurationTime,
    EndpointDependencyCall, EntityCondition, EntityFetcher, ErrorDomain, Family,
    InstanceDependencyCall, PageContext, Query, SelectOption, SelectionEvent, SelectionState,
    ServiceDependencyCall, SignalEmitter, StageOutcome,
};

use crate::request::{
    databases_params, endpoints_params, instances_params, services_params, ActivateRequest,
    CompType,
};

/// Drives selection cascades against one view's [`SelectionState`].
///
/// Cloning is cheap; clones share the same state, fetcher and signal.
#[derive(Clone)]
pub struct SelectionCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    state: RwLock<SelectionState>,
    fetcher: Arc<dyn EntityFetcher>,
    signal: SignalEmitter,
    events: broadcast::Sender<SelectionEvent>,
    config: CascadeConfig,
}

/// Join handle for the two branches spawned by a service selection.
pub struct CascadeHandle {
    endpoints: JoinHandle<()>,
    instances: JoinHandle<()>,
}

impl CascadeHandle {
    /// Wait for both branches, including any callback and signal bump.
    pub async fn settled(self) {
        let (endpoints, instances) = tokio::join!(self.endpoints, self.instances);
        for (branch, joined) in [("endpoint", endpoints), ("instance", instances)] {
            if let Err(e) = joined {
                warn!(branch, error = %e, "cascade branch did not complete");
            }
        }
    }
}

impl SelectionCoordinator {
    pub fn new(fetcher: Arc<dyn EntityFetcher>, config: CascadeConfig) -> Self {
        let (events, _rx) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(SelectionState::new()),
                fetcher,
                signal: SignalEmitter::default(),
                events,
                config,
            }),
        }
    }

    pub fn snapshot(&self) -> SelectionState {
        self.inner.state.read().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&SelectionState) -> R) -> R {
        f(&self.inner.state.read())
    }

    pub fn dashboard_signal(&self) -> DashboardSignal {
        self.inner.state.read().dashboard_signal().clone()
    }

    pub fn subscribe_signal(&self) -> watch::Receiver<DashboardSignal> {
        self.inner.signal.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SelectionEvent> {
        self.inner.events.subscribe()
    }

    /// Apply a mutation under the write lock, publishing the signal if it moved.
    fn commit<R>(&self, f: impl FnOnce(&mut SelectionState) -> R) -> R {
        let mut state = self.inner.state.write();
        let before = state.dashboard_signal().revision;
        let out = f(&mut state);
        let signal = state.dashboard_signal();
        if signal.revision != before {
            debug!(key = %signal.key, revision = signal.revision, "dashboard signal bumped");
            self.inner.signal.publish(signal.clone());
            self.emit(SelectionEvent::DashboardRefreshed(signal.clone()));
        }
        out
    }

    fn emit(&self, event: SelectionEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Reset to defaults for a fresh view. In-flight fetches from the previous
    /// view are dropped when they settle, and signal watchers receive the
    /// cleared token.
    pub fn enter_view(&self, page: PageContext) {
        info!(page = %page, "entering selector view");
        self.commit(|s| {
            self.emit(SelectionEvent::ViewEntered(page.clone()));
            s.reset();
            s.set_page_context(page);
        });
    }

    fn set_page_context(&self, page: PageContext) {
        self.commit(|s| s.set_page_context(page));
    }

    /// Commit `service` now and refresh its endpoints and instances concurrently.
    pub fn select_service(
        &self,
        service: SelectOption,
        duration: DurationTime,
        callback: Option<Arc<dyn ConditionCallback>>,
    ) -> CascadeHandle {
        let (page, endpoint_gen, instance_gen) = self.commit(|s| {
            self.emit(SelectionEvent::ServiceSelected(service.clone()));
            s.set_current(Family::Service, service.clone());
            (
                s.page_context().clone(),
                s.tracker_mut(Family::Endpoint).begin(),
                s.tracker_mut(Family::Instance).begin(),
            )
        });
        debug!(service = %service.key, endpoint_gen, instance_gen, "service selected");

        let endpoints = tokio::spawn(self.clone().endpoint_branch(
            service.clone(),
            duration.clone(),
            page.clone(),
            callback.clone(),
            endpoint_gen,
        ));
        let instances = tokio::spawn(self.clone().instance_branch(
            service,
            duration,
            page,
            callback,
            instance_gen,
        ));
        CascadeHandle {
            endpoints,
            instances,
        }
    }

    async fn endpoint_branch(
        self,
        service: SelectOption,
        duration: DurationTime,
        page: PageContext,
        callback: Option<Arc<dyn ConditionCallback>>,
        generation: u64,
    ) {
        let request = (!service.key.is_empty())
            .then(|| (Query::Endpoints, endpoints_params(&service.key, None)));
        let outcome = self
            .run_stage(Family::Endpoint, ErrorDomain::Endpoint, generation, request)
            .await;
        if outcome.is_stale() || !page.is_dashboard() {
            return;
        }
        let Some(callback) = callback else {
            return;
        };

        let Some(endpoint) = self.read(|s| {
            s.tracker(Family::Endpoint)
                .is_current(generation)
                .then(|| s.current(Family::Endpoint).label.clone())
        }) else {
            return;
        };
        let condition = EntityCondition::endpoint(
            duration,
            self.inner.config.condition_size,
            &service.label,
            &endpoint,
        );
        if let Err(e) = callback.on_condition(condition).await {
            warn!(error = %e, "endpoint condition callback failed");
        }
    }

    async fn instance_branch(
        self,
        service: SelectOption,
        duration: DurationTime,
        page: PageContext,
        callback: Option<Arc<dyn ConditionCallback>>,
        generation: u64,
    ) {
        let request = (!service.key.is_empty())
            .then(|| (Query::Instances, instances_params(&service.key, &duration)));
        let outcome = self
            .run_stage(Family::Instance, ErrorDomain::Instance, generation, request)
            .await;
        if outcome.is_stale() || !page.is_dashboard() {
            return;
        }

        let Some(callback) = callback else {
            self.commit(|s| {
                s.bump_signal_to(&service);
            });
            return;
        };

        let Some(instance) = self.read(|s| {
            s.tracker(Family::Instance)
                .is_current(generation)
                .then(|| s.current(Family::Instance).label.clone())
        }) else {
            return;
        };
        let condition = EntityCondition::service_instance(
            duration,
            self.inner.config.condition_size,
            &service.label,
            &instance,
        );
        match callback.on_condition(condition).await {
            Ok(()) => self.commit(|s| {
                if s.tracker(Family::Instance).is_current(generation) {
                    s.bump_signal_to(&service);
                } else {
                    debug!(generation, "newer selection superseded callback completion");
                }
            }),
            Err(e) => warn!(error = %e, "instance condition callback failed, signal not bumped"),
        }
    }

    /// Fetch one family's list and commit it if `generation` is still current.
    /// A `None` request commits an empty list without fetching.
    async fn run_stage(
        &self,
        family: Family,
        domain: ErrorDomain,
        generation: u64,
        request: Option<(Query, Value)>,
    ) -> StageOutcome {
        let result = match request {
            Some((query, params)) => self.fetch_options(query, params).await,
            None => {
                debug!(%family, "no service selected, skipping fetch");
                Ok(Vec::new())
            }
        };
        let failure = result.as_ref().err().cloned();
        let outcome = self.commit(|s| s.settle_fetch(family, domain, generation, result));
        match outcome {
            StageOutcome::Stale => {
                debug!(%family, generation, "dropping stale fetch result");
            }
            StageOutcome::Committed { ok: true, count } => {
                self.emit(SelectionEvent::FamilyPopulated { family, count });
            }
            StageOutcome::Committed { ok: false, .. } => {
                if let Some(message) = failure {
                    self.emit(SelectionEvent::FetchFailed { domain, message });
                }
            }
        }
        outcome
    }

    async fn fetch_options(
        &self,
        query: Query,
        params: Value,
    ) -> std::result::Result<Vec<SelectOption>, String> {
        debug!(query = query.name(), "issuing selector fetch");
        let result = self
            .inner
            .fetcher
            .fetch(query, params)
            .await
            .and_then(|envelope| envelope.into_options(query));
        result.map_err(|e| {
            warn!(query = query.name(), error = %e, "selector fetch failed");
            e.failure_message()
        })
    }

    pub fn select_endpoint(&self, endpoint: SelectOption) {
        self.commit(|s| {
            self.emit(SelectionEvent::EndpointSelected(endpoint.clone()));
            s.set_current(Family::Endpoint, endpoint);
        });
    }

    pub fn select_instance(&self, instance: SelectOption) {
        self.commit(|s| {
            self.emit(SelectionEvent::InstanceSelected(instance.clone()));
            s.set_current(Family::Instance, instance);
        });
    }

    /// Subscribers re-run their metric queries on [`SelectionEvent::DatabaseSelected`].
    pub fn select_database(&self, database: SelectOption) {
        self.commit(|s| {
            self.emit(SelectionEvent::DatabaseSelected(database.clone()));
            s.set_current(Family::Database, database);
        });
    }

    /// Force a redraw, keyed by `option` or by the current time.
    pub fn refresh_dashboard(&self, option: Option<SelectOption>) {
        self.commit(|s| match option {
            Some(option) => {
                s.bump_signal_to(&option);
            }
            None => {
                s.bump_signal_timestamp();
            }
        });
    }

    pub fn select_service_dependency(&self, call: ServiceDependencyCall) {
        self.select_dependency(call.into());
    }

    pub fn select_instance_dependency(&self, call: InstanceDependencyCall) {
        self.select_dependency(call.into());
    }

    pub fn select_endpoint_dependency(&self, call: EndpointDependencyCall) {
        self.select_dependency(call.into());
    }

    pub fn select_dependency(&self, call: DependencyCall) {
        self.commit(|s| {
            let signal = s.apply_dependency(&call);
            self.emit(SelectionEvent::DependencySelected {
                signal_key: signal.key,
            });
        });
    }

    /// Set the page context, then load the component's lists.
    pub async fn activate_option(&self, page: PageContext, request: ActivateRequest) {
        info!(page = %page, comp_type = ?request.comp_type(), "activating selector");
        self.set_page_context(page);
        match request {
            ActivateRequest::Service { duration, keyword } => {
                self.service_cascade(Query::Services, ErrorDomain::Service, duration, keyword)
                    .await
            }
            ActivateRequest::Browser { duration, keyword } => {
                self.service_cascade(
                    Query::BrowserServices,
                    ErrorDomain::BrowserService,
                    duration,
                    keyword,
                )
                .await
            }
            ActivateRequest::Database { duration } => {
                let generation = self.commit(|s| s.tracker_mut(Family::Database).begin());
                let request = Some((Query::Databases, databases_params(&duration)));
                self.run_stage(Family::Database, ErrorDomain::Database, generation, request)
                    .await;
            }
        }
    }

    /// String-typed activation; unknown component types only set the page context.
    pub async fn activate_comp_type(
        &self,
        page: PageContext,
        comp_type: &str,
        duration: DurationTime,
        keyword: Option<String>,
    ) {
        match comp_type.parse::<CompType>() {
            Ok(comp_type) => {
                self.activate_option(page, ActivateRequest::new(comp_type, duration, keyword))
                    .await
            }
            Err(e) => {
                debug!(error = %e, "ignoring selector activation");
                self.set_page_context(page);
            }
        }
    }

    // services -> endpoints -> instances, each stage keyed by the service
    // current when it starts
    async fn service_cascade(
        &self,
        query: Query,
        domain: ErrorDomain,
        duration: DurationTime,
        keyword: Option<String>,
    ) {
        let generation = self.commit(|s| s.tracker_mut(Family::Service).begin());
        let request = Some((query, services_params(&duration, keyword.as_deref())));
        if self
            .run_stage(Family::Service, domain, generation, request)
            .await
            .is_stale()
        {
            return;
        }

        let (service_key, generation) = self.commit(|s| {
            (
                s.current(Family::Service).key.clone(),
                s.tracker_mut(Family::Endpoint).begin(),
            )
        });
        let request = (!service_key.is_empty())
            .then(|| (Query::Endpoints, endpoints_params(&service_key, None)));
        if self
            .run_stage(Family::Endpoint, ErrorDomain::Endpoint, generation, request)
            .await
            .is_stale()
        {
            return;
        }

        let (service_key, generation) = self.commit(|s| {
            (
                s.current(Family::Service).key.clone(),
                s.tracker_mut(Family::Instance).begin(),
            )
        });
        let request = (!service_key.is_empty())
            .then(|| (Query::Instances, instances_params(&service_key, &duration)));
        self.run_stage(Family::Instance, ErrorDomain::Instance, generation, request)
            .await;
    }

    pub async fn fetch_item_services(
        &self,
        duration: &DurationTime,
        keyword: Option<&str>,
    ) -> Vec<SelectOption> {
        let params = services_params(duration, keyword);
        self.fetch_item(Query::Services, ErrorDomain::ItemService, params)
            .await
    }

    pub async fn fetch_item_endpoints(
        &self,
        service_id: &str,
        keyword: Option<&str>,
    ) -> Vec<SelectOption> {
        let params = endpoints_params(service_id, keyword);
        self.fetch_item(Query::Endpoints, ErrorDomain::ItemEndpoint, params)
            .await
    }

    pub async fn fetch_item_instances(
        &self,
        service_id: &str,
        duration: &DurationTime,
    ) -> Vec<SelectOption> {
        let params = instances_params(service_id, duration);
        self.fetch_item(Query::Instances, ErrorDomain::ItemInstance, params)
            .await
    }

    // Item lookups report errors but never touch the family lists.
    async fn fetch_item(&self, query: Query, domain: ErrorDomain, params: Value) -> Vec<SelectOption> {
        match self.fetch_options(query, params).await {
            Ok(options) => {
                self.commit(|s| s.record_outcome(domain, ""));
                options
            }
            Err(message) => {
                self.commit(|s| s.record_outcome(domain, message.clone()));
                self.emit(SelectionEvent::FetchFailed { domain, message });
                Vec::new()
            }
        }
    }
}

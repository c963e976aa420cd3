//! Selection state aggregate and its population rules.
//!
//! Every mutation here is synchronous and runs to completion; the cascade
//! coordinator applies them under a single write lock between awaits.

use crate::{
    DashboardSignal, DependencyCall, ErrorDomain, ErrorMap, Family, PageContext, SelectOption,
};

/// Options list and current pick for one family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilySelection {
    pub options: Vec<SelectOption>,
    pub current: SelectOption,
}

impl FamilySelection {
    fn store(&mut self, options: Vec<SelectOption>) {
        self.current = options.first().cloned().unwrap_or_default();
        self.options = options;
    }

    fn clear(&mut self) {
        self.options.clear();
        self.current = SelectOption::none();
    }
}

/// Where a family's list fetch currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPhase {
    #[default]
    Idle,
    Fetching {
        generation: u64,
    },
    Settled {
        generation: u64,
        ok: bool,
    },
}

/// Generation counter guarding a family's list against late fetch results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FamilyTracker {
    generation: u64,
    phase: FetchPhase,
}

impl FamilyTracker {
    /// Start a new fetch; anything issued earlier becomes stale.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.phase = FetchPhase::Fetching {
            generation: self.generation,
        };
        self.generation
    }

    /// Drop interest in whatever is in flight without starting a new fetch.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        if matches!(self.phase, FetchPhase::Fetching { .. }) {
            self.phase = FetchPhase::Idle;
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    fn settle(&mut self, generation: u64, ok: bool) {
        self.phase = FetchPhase::Settled { generation, ok };
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }
}

/// Result of trying to commit a settled fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Committed { ok: bool, count: usize },
    /// A newer fetch for the same family was issued; nothing was written.
    Stale,
}

impl StageOutcome {
    pub fn is_stale(self) -> bool {
        matches!(self, StageOutcome::Stale)
    }
}

/// Prefix `options` with "All" where the page and family call for it.
pub fn shape_options(
    family: Family,
    options: Vec<SelectOption>,
    page: &PageContext,
) -> Vec<SelectOption> {
    if family.accepts_all_option() && page.injects_all_option() {
        let mut shaped = Vec::with_capacity(options.len() + 1);
        shaped.push(SelectOption::all());
        shaped.extend(options);
        shaped
    } else {
        options
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    service: FamilySelection,
    endpoint: FamilySelection,
    instance: FamilySelection,
    database: FamilySelection,
    dest_service: SelectOption,
    dest_instance: SelectOption,
    dest_endpoint: SelectOption,
    page_context: PageContext,
    dashboard_signal: DashboardSignal,
    errors: ErrorMap,
    trackers: [FamilyTracker; 4],
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to defaults for a new view activation. Generation counters keep
    /// counting so results from the previous view stay stale, and the cleared
    /// signal gets a fresh revision so watchers see it.
    pub fn reset(&mut self) {
        let mut trackers = self.trackers;
        for tracker in &mut trackers {
            tracker.invalidate();
        }
        let revision = self.dashboard_signal.revision + 1;
        *self = Self {
            trackers,
            dashboard_signal: DashboardSignal {
                revision,
                ..DashboardSignal::default()
            },
            ..Self::default()
        };
    }

    pub fn family(&self, family: Family) -> &FamilySelection {
        match family {
            Family::Service => &self.service,
            Family::Endpoint => &self.endpoint,
            Family::Instance => &self.instance,
            Family::Database => &self.database,
        }
    }

    fn family_mut(&mut self, family: Family) -> &mut FamilySelection {
        match family {
            Family::Service => &mut self.service,
            Family::Endpoint => &mut self.endpoint,
            Family::Instance => &mut self.instance,
            Family::Database => &mut self.database,
        }
    }

    pub fn options(&self, family: Family) -> &[SelectOption] {
        &self.family(family).options
    }

    pub fn current(&self, family: Family) -> &SelectOption {
        &self.family(family).current
    }

    /// Destination side of the last dependency click. Databases have none.
    pub fn dest(&self, family: Family) -> Option<&SelectOption> {
        match family {
            Family::Service => Some(&self.dest_service),
            Family::Endpoint => Some(&self.dest_endpoint),
            Family::Instance => Some(&self.dest_instance),
            Family::Database => None,
        }
    }

    pub fn page_context(&self) -> &PageContext {
        &self.page_context
    }

    pub fn set_page_context(&mut self, page: PageContext) {
        self.page_context = page;
    }

    pub fn dashboard_signal(&self) -> &DashboardSignal {
        &self.dashboard_signal
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn tracker(&self, family: Family) -> &FamilyTracker {
        &self.trackers[family.index()]
    }

    pub fn tracker_mut(&mut self, family: Family) -> &mut FamilyTracker {
        &mut self.trackers[family.index()]
    }

    /// Store a fetched list and default `current` to its first entry.
    pub fn populate(&mut self, family: Family, options: Vec<SelectOption>) {
        let shaped = shape_options(family, options, &self.page_context);
        self.family_mut(family).store(shaped);
    }

    /// Replace `current` for a family, returning the signal if the pick bumps it.
    ///
    /// Endpoint, instance and database picks always redraw. A service pick only
    /// redraws on log/event pages; elsewhere the cascade decides.
    ///
    /// A list fetch for `family` still in flight is dropped when it settles, so
    /// it cannot replace the pick.
    pub fn set_current(&mut self, family: Family, option: SelectOption) -> Option<DashboardSignal> {
        let bump = match family {
            Family::Service => self.page_context.injects_all_option(),
            Family::Endpoint | Family::Instance | Family::Database => true,
        };
        self.family_mut(family).current = option.clone();
        self.tracker_mut(family).invalidate();
        if family == Family::Service {
            self.invalidate_service_dependents();
        }
        bump.then(|| self.bump_signal_to(&option))
    }

    pub fn record_outcome(&mut self, domain: ErrorDomain, message: impl Into<String>) {
        self.errors.record(domain, message);
    }

    /// Record a failure and leave the domain's family empty.
    pub fn fail(&mut self, domain: ErrorDomain, message: impl Into<String>) {
        self.errors.record(domain, message);
        if let Some(family) = domain.family() {
            self.family_mut(family).clear();
        }
    }

    /// Commit a settled fetch if `generation` is still the family's latest.
    pub fn settle_fetch(
        &mut self,
        family: Family,
        domain: ErrorDomain,
        generation: u64,
        result: std::result::Result<Vec<SelectOption>, String>,
    ) -> StageOutcome {
        if !self.tracker(family).is_current(generation) {
            return StageOutcome::Stale;
        }
        let outcome = match result {
            Ok(options) => {
                self.errors.record_success(domain);
                self.populate(family, options);
                StageOutcome::Committed {
                    ok: true,
                    count: self.options(family).len(),
                }
            }
            Err(message) => {
                self.fail(domain, message);
                StageOutcome::Committed { ok: false, count: 0 }
            }
        };
        let ok = matches!(outcome, StageOutcome::Committed { ok: true, .. });
        self.tracker_mut(family).settle(generation, ok);
        outcome
    }

    pub fn bump_signal_to(&mut self, option: &SelectOption) -> DashboardSignal {
        let revision = self.dashboard_signal.revision + 1;
        self.dashboard_signal = DashboardSignal::from_option(option, revision);
        self.dashboard_signal.clone()
    }

    pub fn bump_signal_keyed(&mut self, key: impl Into<String>) -> DashboardSignal {
        let revision = self.dashboard_signal.revision + 1;
        self.dashboard_signal = DashboardSignal::keyed(key, revision);
        self.dashboard_signal.clone()
    }

    pub fn bump_signal_timestamp(&mut self) -> DashboardSignal {
        let revision = self.dashboard_signal.revision + 1;
        self.dashboard_signal = DashboardSignal::timestamp(revision);
        self.dashboard_signal.clone()
    }

    /// Collapse a topology edge click into source/destination picks.
    pub fn apply_dependency(&mut self, call: &DependencyCall) -> DashboardSignal {
        let selection = call.selection();
        self.service.current = selection.service;
        self.dest_service = selection.dest_service;
        if let Some((source, dest)) = selection.instance {
            self.instance.current = source;
            self.dest_instance = dest;
        }
        if let Some((source, dest)) = selection.endpoint {
            self.endpoint.current = source;
            self.dest_endpoint = dest;
        }
        self.tracker_mut(Family::Service).invalidate();
        self.invalidate_service_dependents();
        self.bump_signal_keyed(call.signal_key())
    }

    // Endpoint and instance lists are fetched per service.
    fn invalidate_service_dependents(&mut self) {
        self.tracker_mut(Family::Endpoint).invalidate();
        self.tracker_mut(Family::Instance).invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ServiceDependencyCall, ServiceNode};

    fn opts(pairs: &[(&str, &str)]) -> Vec<SelectOption> {
        pairs.iter().map(|(k, l)| SelectOption::new(*k, *l)).collect()
    }

    #[test]
    fn empty_population_yields_zero_value_for_every_family() {
        for page in [PageContext::Dashboard, PageContext::Other("traceList".into())] {
            let mut state = SelectionState::new();
            state.set_page_context(page);
            for family in Family::ALL {
                state.populate(family, opts(&[("x", "X")]));
                state.populate(family, Vec::new());
                assert_eq!(state.current(family), &SelectOption::none(), "{family}");
                assert!(state.options(family).is_empty());
            }
        }
    }

    #[test]
    fn log_and_event_pages_prefix_all_except_database() {
        for page in [PageContext::Log, PageContext::Event] {
            let mut state = SelectionState::new();
            state.set_page_context(page);

            for family in [Family::Service, Family::Endpoint, Family::Instance] {
                state.populate(family, opts(&[("s1", "Svc1")]));
                assert_eq!(
                    state.options(family),
                    &[SelectOption::new("", "All"), SelectOption::new("s1", "Svc1")]
                );
                assert_eq!(state.current(family), &SelectOption::all());
            }

            state.populate(Family::Database, opts(&[("db1", "mysql")]));
            assert_eq!(state.options(Family::Database), &[SelectOption::new("db1", "mysql")]);
            assert_eq!(state.current(Family::Database).key, "db1");
        }
    }

    #[test]
    fn set_current_signal_rules() {
        let mut state = SelectionState::new();
        state.set_page_context(PageContext::Dashboard);

        let svc = SelectOption::new("svc1", "Svc1");
        assert!(state.set_current(Family::Service, svc.clone()).is_none());
        assert_eq!(state.current(Family::Service), &svc);

        let ep = SelectOption::new("ep1", "/login");
        let signal = state.set_current(Family::Endpoint, ep).unwrap();
        assert_eq!(signal.key, "ep1");
        assert_eq!(state.dashboard_signal(), &signal);

        state.set_page_context(PageContext::Log);
        let signal = state.set_current(Family::Service, svc).unwrap();
        assert_eq!(signal.key, "svc1");
        assert_eq!(signal.revision, 2);
    }

    #[test]
    fn failure_empties_family_and_keeps_other_errors() {
        let mut state = SelectionState::new();
        state.set_page_context(PageContext::Log);
        state.populate(Family::Instance, opts(&[("i1", "inst")]));
        state.record_outcome(ErrorDomain::Service, "svc down");

        state.fail(ErrorDomain::Instance, "timeout");

        assert!(state.options(Family::Instance).is_empty());
        assert_eq!(state.current(Family::Instance), &SelectOption::none());
        assert_eq!(state.errors().get(ErrorDomain::Instance), Some("timeout"));
        assert_eq!(state.errors().get(ErrorDomain::Service), Some("svc down"));
    }

    #[test]
    fn stale_generation_is_not_committed() {
        let mut state = SelectionState::new();
        let first = state.tracker_mut(Family::Endpoint).begin();
        let second = state.tracker_mut(Family::Endpoint).begin();

        let late = state.settle_fetch(
            Family::Endpoint,
            ErrorDomain::Endpoint,
            first,
            Ok(opts(&[("old", "Old")])),
        );
        assert!(late.is_stale());
        assert!(state.options(Family::Endpoint).is_empty());
        assert_eq!(
            state.tracker(Family::Endpoint).phase(),
            FetchPhase::Fetching { generation: second }
        );

        let fresh = state.settle_fetch(
            Family::Endpoint,
            ErrorDomain::Endpoint,
            second,
            Ok(opts(&[("new", "New")])),
        );
        assert_eq!(fresh, StageOutcome::Committed { ok: true, count: 1 });
        assert_eq!(state.current(Family::Endpoint).key, "new");
        assert_eq!(state.errors().get(ErrorDomain::Endpoint), Some(""));
    }

    #[test]
    fn reset_keeps_generations_moving() {
        let mut state = SelectionState::new();
        state.set_page_context(PageContext::Log);
        state.populate(Family::Service, opts(&[("s1", "Svc1")]));
        state.record_outcome(ErrorDomain::Database, "down");
        let pending = state.tracker_mut(Family::Service).begin();
        state.bump_signal_keyed("x");

        state.reset();

        assert_eq!(state.page_context(), &PageContext::Unset);
        assert!(state.options(Family::Service).is_empty());
        assert!(state.errors().is_empty());
        assert_eq!(state.dashboard_signal().key, "");
        assert_eq!(state.dashboard_signal().revision, 2);
        assert!(state
            .settle_fetch(Family::Service, ErrorDomain::Service, pending, Ok(vec![]))
            .is_stale());
    }

    #[test]
    fn picks_supersede_inflight_list_of_same_family() {
        let mut state = SelectionState::new();
        state.set_page_context(PageContext::Dashboard);
        let services = state.tracker_mut(Family::Service).begin();
        let databases = state.tracker_mut(Family::Database).begin();

        state.set_current(Family::Service, SelectOption::new("b", "B"));
        state.set_current(Family::Database, SelectOption::new("db9", "pg"));

        let late = state.settle_fetch(
            Family::Service,
            ErrorDomain::Service,
            services,
            Ok(opts(&[("s1", "Svc1")])),
        );
        assert!(late.is_stale());
        assert_eq!(state.current(Family::Service).key, "b");

        let late = state.settle_fetch(
            Family::Database,
            ErrorDomain::Database,
            databases,
            Ok(opts(&[("db1", "mysql")])),
        );
        assert!(late.is_stale());
        assert_eq!(state.current(Family::Database).key, "db9");
    }

    #[test]
    fn dependency_click_invalidates_inflight_lists() {
        let mut state = SelectionState::new();
        let pending = state.tracker_mut(Family::Endpoint).begin();
        let services = state.tracker_mut(Family::Service).begin();

        let call = DependencyCall::from(ServiceDependencyCall {
            id: "a".into(),
            source: ServiceNode { id: "s1".into(), name: "Svc1".into() },
            target: ServiceNode { id: "s2".into(), name: "Svc2".into() },
        });
        let signal = state.apply_dependency(&call);

        assert_eq!(signal.key, "TOPOLOGY_SERVICE_DEPENDENCY:a");
        assert_eq!(state.current(Family::Service).key, "s1");
        assert_eq!(state.dest(Family::Service).map(|d| d.label.as_str()), Some("Svc2"));
        assert_eq!(state.dest(Family::Database), None);
        assert!(!state.tracker(Family::Endpoint).is_current(pending));
        assert!(!state.tracker(Family::Service).is_current(services));
        assert_eq!(state.tracker(Family::Endpoint).phase(), FetchPhase::Idle);
    }
}

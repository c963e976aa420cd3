use crate::{DashboardSignal, ErrorDomain, Family, PageContext, SelectOption};

/// Notification published after a selection command has committed.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    ViewEntered(PageContext),
    ServiceSelected(SelectOption),
    EndpointSelected(SelectOption),
    InstanceSelected(SelectOption),
    /// Downstream metric queries should re-run for the new database.
    DatabaseSelected(SelectOption),
    FamilyPopulated { family: Family, count: usize },
    FetchFailed { domain: ErrorDomain, message: String },
    DependencySelected { signal_key: String },
    DashboardRefreshed(DashboardSignal),
}

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use selector_core::{
    ConditionCallback, DurationTime, EndpointDependencyCall, InstanceDependencyCall, PageContext,
    SelectOption, ServiceDependencyCall,
};

use crate::{ActivateRequest, SelectionCoordinator};

/// Every operation of the selection API as a typed command.
#[derive(Clone)]
pub enum SelectionCommand {
    EnterView(PageContext),
    SelectService {
        service: SelectOption,
        duration: DurationTime,
        callback: Option<Arc<dyn ConditionCallback>>,
    },
    SelectEndpoint(SelectOption),
    SelectInstance(SelectOption),
    SelectDatabase(SelectOption),
    Activate {
        page: PageContext,
        request: ActivateRequest,
    },
    ServiceDependency(ServiceDependencyCall),
    InstanceDependency(InstanceDependencyCall),
    EndpointDependency(EndpointDependencyCall),
    RefreshDashboard(Option<SelectOption>),
}

impl SelectionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionCommand::EnterView(_) => "enter_view",
            SelectionCommand::SelectService { .. } => "select_service",
            SelectionCommand::SelectEndpoint(_) => "select_endpoint",
            SelectionCommand::SelectInstance(_) => "select_instance",
            SelectionCommand::SelectDatabase(_) => "select_database",
            SelectionCommand::Activate { .. } => "activate_option",
            SelectionCommand::ServiceDependency(_) => "service_dependency",
            SelectionCommand::InstanceDependency(_) => "instance_dependency",
            SelectionCommand::EndpointDependency(_) => "endpoint_dependency",
            SelectionCommand::RefreshDashboard(_) => "refresh_dashboard",
        }
    }
}

impl fmt::Debug for SelectionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SelectionCoordinator {
    /// Run a command to completion, including any cascade it starts.
    pub async fn dispatch(&self, command: SelectionCommand) {
        debug!(command = command.name(), "dispatching selection command");
        match command {
            SelectionCommand::EnterView(page) => self.enter_view(page),
            SelectionCommand::SelectService {
                service,
                duration,
                callback,
            } => self.select_service(service, duration, callback).settled().await,
            SelectionCommand::SelectEndpoint(option) => self.select_endpoint(option),
            SelectionCommand::SelectInstance(option) => self.select_instance(option),
            SelectionCommand::SelectDatabase(option) => self.select_database(option),
            SelectionCommand::Activate { page, request } => {
                self.activate_option(page, request).await
            }
            SelectionCommand::ServiceDependency(call) => self.select_service_dependency(call),
            SelectionCommand::InstanceDependency(call) => self.select_instance_dependency(call),
            SelectionCommand::EndpointDependency(call) => self.select_endpoint_dependency(call),
            SelectionCommand::RefreshDashboard(option) => self.refresh_dashboard(option),
        }
    }
}

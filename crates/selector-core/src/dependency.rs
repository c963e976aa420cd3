//! Topology edge clicks, one record per graph kind.

use serde::{Deserialize, Serialize};

use crate::SelectOption;

pub const TOPOLOGY_SERVICE_DEPENDENCY: &str = "TOPOLOGY_SERVICE_DEPENDENCY:";
pub const TOPOLOGY_SERVICE_INSTANCE_DEPENDENCY: &str = "TOPOLOGY_SERVICE_INSTANCE_DEPENDENCY:";
pub const TOPOLOGY_ENDPOINT_DEPENDENCY: &str = "TOPOLOGY_ENDPOINT_DEPENDENCY:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceNode {
    pub id: String,
    pub name: String,
}

/// Edge between two services in the service topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDependencyCall {
    pub id: String,
    pub source: ServiceNode,
    pub target: ServiceNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceNode {
    pub id: String,
    pub name: String,
    pub service_id: String,
    pub service_name: String,
}

/// Edge between two service instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDependencyCall {
    pub id: String,
    #[serde(rename = "sourceObj")]
    pub source: InstanceNode,
    #[serde(rename = "targetObj")]
    pub target: InstanceNode,
}

/// Edge between two endpoints; the endpoint graph ships flat records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDependencyCall {
    pub id: String,
    pub service_id: String,
    pub service_name: String,
    pub endpoint_id: String,
    pub endpoint_name: String,
    pub dest_service_id: String,
    pub dest_service_name: String,
    pub dest_endpoint_id: String,
    pub dest_endpoint_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyCall {
    Service(ServiceDependencyCall),
    Instance(InstanceDependencyCall),
    Endpoint(EndpointDependencyCall),
}

/// Source/destination pairs a dependency click resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySelection {
    pub service: SelectOption,
    pub dest_service: SelectOption,
    pub instance: Option<(SelectOption, SelectOption)>,
    pub endpoint: Option<(SelectOption, SelectOption)>,
}

impl DependencyCall {
    /// Signal key for this click. The edge id keeps repeated clicks distinct.
    pub fn signal_key(&self) -> String {
        match self {
            DependencyCall::Service(call) => format!("{TOPOLOGY_SERVICE_DEPENDENCY}{}", call.id),
            DependencyCall::Instance(call) => {
                format!("{TOPOLOGY_SERVICE_INSTANCE_DEPENDENCY}{}", call.id)
            }
            DependencyCall::Endpoint(call) => {
                format!("{TOPOLOGY_ENDPOINT_DEPENDENCY}{}", call.id)
            }
        }
    }

    pub fn selection(&self) -> DependencySelection {
        match self {
            DependencyCall::Service(call) => DependencySelection {
                service: SelectOption::new(&call.source.id, &call.source.name),
                dest_service: SelectOption::new(&call.target.id, &call.target.name),
                instance: None,
                endpoint: None,
            },
            DependencyCall::Instance(call) => DependencySelection {
                service: SelectOption::new(&call.source.service_id, &call.source.service_name),
                dest_service: SelectOption::new(&call.target.service_id, &call.target.service_name),
                instance: Some((
                    SelectOption::new(&call.source.id, &call.source.name),
                    SelectOption::new(&call.target.id, &call.target.name),
                )),
                endpoint: None,
            },
            DependencyCall::Endpoint(call) => DependencySelection {
                service: SelectOption::new(&call.service_id, &call.service_name),
                dest_service: SelectOption::new(&call.dest_service_id, &call.dest_service_name),
                instance: None,
                endpoint: Some((
                    SelectOption::new(&call.endpoint_id, &call.endpoint_name),
                    SelectOption::new(&call.dest_endpoint_id, &call.dest_endpoint_name),
                )),
            },
        }
    }
}

impl From<ServiceDependencyCall> for DependencyCall {
    fn from(call: ServiceDependencyCall) -> Self {
        DependencyCall::Service(call)
    }
}

impl From<InstanceDependencyCall> for DependencyCall {
    fn from(call: InstanceDependencyCall) -> Self {
        DependencyCall::Instance(call)
    }
}

impl From<EndpointDependencyCall> for DependencyCall {
    fn from(call: EndpointDependencyCall) -> Self {
        DependencyCall::Endpoint(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_call_deserializes_from_topology_payload() {
        let call: InstanceDependencyCall = serde_json::from_value(serde_json::json!({
            "id": "edge-7",
            "sourceObj": {"id": "i1", "name": "inst-1", "serviceId": "s1", "serviceName": "Svc1"},
            "targetObj": {"id": "i2", "name": "inst-2", "serviceId": "s2", "serviceName": "Svc2"}
        }))
        .unwrap();

        let call = DependencyCall::from(call);
        assert_eq!(call.signal_key(), "TOPOLOGY_SERVICE_INSTANCE_DEPENDENCY:edge-7");

        let sel = call.selection();
        assert_eq!(sel.service, SelectOption::new("s1", "Svc1"));
        assert_eq!(sel.dest_service, SelectOption::new("s2", "Svc2"));
        let (src, dst) = sel.instance.unwrap();
        assert_eq!(src.key, "i1");
        assert_eq!(dst.label, "inst-2");
        assert!(sel.endpoint.is_none());
    }

    #[test]
    fn endpoint_call_maps_flat_fields() {
        let call: EndpointDependencyCall = serde_json::from_value(serde_json::json!({
            "id": "e-1",
            "serviceId": "s1", "serviceName": "Svc1",
            "endpointId": "ep1", "endpointName": "/login",
            "destServiceId": "s2", "destServiceName": "Svc2",
            "destEndpointId": "ep2", "destEndpointName": "/auth"
        }))
        .unwrap();

        let sel = DependencyCall::from(call).selection();
        let (src, dst) = sel.endpoint.unwrap();
        assert_eq!(src, SelectOption::new("ep1", "/login"));
        assert_eq!(dst, SelectOption::new("ep2", "/auth"));
        assert_eq!(sel.dest_service.key, "s2");
    }
}

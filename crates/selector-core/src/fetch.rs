use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{DurationTime, Result, SelectOption, SelectorError};

/// Named queries the selectors consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Services,
    Endpoints,
    Instances,
    Databases,
    BrowserServices,
}

impl Query {
    pub fn name(self) -> &'static str {
        match self {
            Query::Services => "queryServices",
            Query::Endpoints => "queryEndpoints",
            Query::Instances => "queryInstances",
            Query::Databases => "queryDatabases",
            Query::BrowserServices => "queryBrowserServices",
        }
    }

    /// Field of `data` the option list comes back under.
    pub fn result_field(self) -> &'static str {
        match self {
            Query::Services | Query::Databases | Query::BrowserServices => "services",
            Query::Endpoints => "getEndpoints",
            Query::Instances => "getServiceInstances",
        }
    }
}

/// Response envelope returned by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, Vec<SelectOption>>>,
}

impl FetchEnvelope {
    pub fn ok(query: Query, options: Vec<SelectOption>) -> Self {
        let mut data = HashMap::new();
        data.insert(query.result_field().to_string(), options);
        Self {
            errors: None,
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            errors: Some(message.into()),
            data: None,
        }
    }

    /// Extract the option list for `query`. A non-empty `errors` is a failure
    /// even when data is present.
    pub fn into_options(self, query: Query) -> Result<Vec<SelectOption>> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            return Err(SelectorError::Fetch(errors));
        }
        self.data
            .and_then(|mut data| data.remove(query.result_field()))
            .ok_or(SelectorError::MissingField {
                query: query.name(),
                field: query.result_field(),
            })
    }
}

/// Transport collaborator that executes selector queries.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    async fn fetch(&self, query: Query, params: serde_json::Value) -> Result<FetchEnvelope>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Service,
    ServiceInstance,
    Endpoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSource {
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_instance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub time: DurationTime,
    pub size: usize,
    pub source: ConditionSource,
}

/// Payload handed to a dashboard callback once a dependent list settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCondition {
    pub condition: Condition,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

impl EntityCondition {
    pub fn endpoint(time: DurationTime, size: usize, service: &str, endpoint: &str) -> Self {
        Self {
            condition: Condition {
                time,
                size,
                source: ConditionSource {
                    service: service.to_string(),
                    endpoint: Some(endpoint.to_string()),
                    service_instance: None,
                },
            },
            entity_type: EntityType::Endpoint,
        }
    }

    pub fn service_instance(time: DurationTime, size: usize, service: &str, instance: &str) -> Self {
        Self {
            condition: Condition {
                time,
                size,
                source: ConditionSource {
                    service: service.to_string(),
                    endpoint: None,
                    service_instance: Some(instance.to_string()),
                },
            },
            entity_type: EntityType::ServiceInstance,
        }
    }
}

/// Dashboard-side hook that propagates a selection into widget conditions.
///
/// The returned future completing is what the instance branch waits on
/// before bumping the dashboard signal.
#[async_trait]
pub trait ConditionCallback: Send + Sync {
    async fn on_condition(&self, condition: EntityCondition) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Step;

    #[test]
    fn errors_win_over_data() {
        let mut env = FetchEnvelope::ok(Query::Endpoints, vec![SelectOption::new("e1", "E1")]);
        env.errors = Some("boom".into());

        let err = env.into_options(Query::Endpoints).unwrap_err();
        assert_eq!(err.failure_message(), "boom");
    }

    #[test]
    fn empty_errors_string_is_success() {
        let mut env = FetchEnvelope::ok(Query::Instances, vec![SelectOption::new("i1", "I1")]);
        env.errors = Some(String::new());
        assert_eq!(env.into_options(Query::Instances).unwrap().len(), 1);
    }

    #[test]
    fn missing_field_is_a_failure() {
        let env = FetchEnvelope::ok(Query::Services, vec![]);
        let err = env.into_options(Query::Endpoints).unwrap_err();
        assert!(matches!(err, SelectorError::MissingField { field: "getEndpoints", .. }));
    }

    #[test]
    fn envelope_deserializes_transport_json() {
        let env: FetchEnvelope = serde_json::from_value(serde_json::json!({
            "data": {"getServiceInstances": [{"key": "i1", "label": "inst-1"}, {"key": "i2"}]}
        }))
        .unwrap();
        let options = env.into_options(Query::Instances).unwrap();
        assert_eq!(options[1], SelectOption::new("i2", ""));
    }

    #[test]
    fn condition_payload_shape() {
        let time = DurationTime::new("2024-03-09 0700", "2024-03-09 0715", Step::Minute);
        let cond = EntityCondition::service_instance(time, 20, "Svc1", "inst-1");
        let json = serde_json::to_value(&cond).unwrap();

        assert_eq!(json["type"], "ServiceInstance");
        assert_eq!(json["condition"]["size"], 20);
        assert_eq!(json["condition"]["source"]["serviceInstance"], "inst-1");
        assert!(json["condition"]["source"].get("endpoint").is_none());
    }
}

use serde_json::{json, Value};
use std::str::FromStr;

use selector_core::{DurationTime, SelectorError};

/// Selector component being activated on a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompType {
    Service,
    Browser,
    Database,
}

impl FromStr for CompType {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" => Ok(CompType::Service),
            "browser" => Ok(CompType::Browser),
            "database" => Ok(CompType::Database),
            other => Err(SelectorError::Config(format!(
                "unknown selector component type: {other}"
            ))),
        }
    }
}

/// Input to view activation, one variant per component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivateRequest {
    Service {
        duration: DurationTime,
        keyword: Option<String>,
    },
    Browser {
        duration: DurationTime,
        keyword: Option<String>,
    },
    Database {
        duration: DurationTime,
    },
}

impl ActivateRequest {
    pub fn new(comp_type: CompType, duration: DurationTime, keyword: Option<String>) -> Self {
        match comp_type {
            CompType::Service => ActivateRequest::Service { duration, keyword },
            CompType::Browser => ActivateRequest::Browser { duration, keyword },
            CompType::Database => ActivateRequest::Database { duration },
        }
    }

    pub fn comp_type(&self) -> CompType {
        match self {
            ActivateRequest::Service { .. } => CompType::Service,
            ActivateRequest::Browser { .. } => CompType::Browser,
            ActivateRequest::Database { .. } => CompType::Database,
        }
    }

    pub fn duration(&self) -> &DurationTime {
        match self {
            ActivateRequest::Service { duration, .. }
            | ActivateRequest::Browser { duration, .. }
            | ActivateRequest::Database { duration } => duration,
        }
    }
}

pub(crate) fn services_params(duration: &DurationTime, keyword: Option<&str>) -> Value {
    json!({ "duration": duration, "keyword": keyword.unwrap_or_default() })
}

pub(crate) fn endpoints_params(service_id: &str, keyword: Option<&str>) -> Value {
    json!({ "serviceId": service_id, "keyword": keyword.unwrap_or_default() })
}

pub(crate) fn instances_params(service_id: &str, duration: &DurationTime) -> Value {
    json!({ "serviceId": service_id, "duration": duration })
}

pub(crate) fn databases_params(duration: &DurationTime) -> Value {
    json!({ "duration": duration })
}

#[cfg(test)]
mod tests {
    use super::*;
    use selector_core::Step;

    fn window() -> DurationTime {
        DurationTime::new("2024-03-09 0700", "2024-03-09 0715", Step::Minute)
    }

    #[test]
    fn comp_type_parsing() {
        assert_eq!("service".parse::<CompType>().unwrap(), CompType::Service);
        assert_eq!("browser".parse::<CompType>().unwrap(), CompType::Browser);
        assert_eq!("database".parse::<CompType>().unwrap(), CompType::Database);
        assert!("topology".parse::<CompType>().is_err());
    }

    #[test]
    fn database_request_drops_keyword() {
        let req = ActivateRequest::new(CompType::Database, window(), Some("mysql".into()));
        assert_eq!(req, ActivateRequest::Database { duration: window() });
        assert_eq!(req.comp_type(), CompType::Database);
    }

    #[test]
    fn missing_keyword_is_sent_empty() {
        let params = services_params(&window(), None);
        assert_eq!(params["keyword"], "");
        assert_eq!(params["duration"]["step"], "MINUTE");

        let params = endpoints_params("svc1", Some("login"));
        assert_eq!(params["serviceId"], "svc1");
        assert_eq!(params["keyword"], "login");
    }
}

//! Subscription creation request
//!
//! QuantumLeap can create the Orion subscription that feeds it. Creation is
//! fire-and-forget: nothing is returned and the subscription is not tracked.

use crate::error::ValidationError;

/// Parameters for `POST /v2/subscribe`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionRequest {
    pub entity_type: Option<String>,
    /// Takes precedence over `id_pattern`
    pub entity_id: Option<String>,
    pub id_pattern: Option<String>,
    /// Comma-separated attribute names
    pub attributes: Option<String>,
    pub observed_attributes: Option<String>,
    pub notified_attributes: Option<String>,
    /// Minimum seconds between notifications
    pub throttling: Option<i64>,
    pub time_index_attribute: Option<String>,
}

impl SubscriptionRequest {
    /// Subscribe to every entity of a type
    pub fn for_type(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            ..Self::default()
        }
    }

    /// Build query parameters, validating throttling first
    pub fn to_params(&self, orion_url: &str, quantumleap_url: &str) -> Result<Vec<(String, String)>, ValidationError> {
        if let Some(throttling) = self.throttling {
            if throttling < 1 {
                return Err(ValidationError::InvalidThrottling(throttling));
            }
        }

        let mut params = vec![
            ("orionUrl".to_string(), v2_url(orion_url)),
            ("quantumleapUrl".to_string(), v2_url(quantumleap_url)),
        ];
        let optional = [
            ("entityType", self.entity_type.clone()),
            ("entityId", self.entity_id.clone()),
            ("idPattern", self.id_pattern.clone()),
            ("attributes", self.attributes.clone()),
            ("observedAttributes", self.observed_attributes.clone()),
            ("notifiedAttributes", self.notified_attributes.clone()),
            ("throttling", self.throttling.map(|t| t.to_string())),
            ("timeIndexAttribute", self.time_index_attribute.clone()),
        ];
        params.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key.to_string(), v))),
        );

        Ok(params)
    }
}

fn v2_url(base: &str) -> String {
    format!("{}/v2", base.trim_end_matches('/'))
}

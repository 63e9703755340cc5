//! Operation Context
//!
//! Request metadata that travels from the middleware into ledger logs.

use std::net::IpAddr;

use uuid::Uuid;

use super::AccountId;

/// Who asked for an operation and how to correlate its log lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationContext {
    /// Account resolved from the bearer token
    pub request_user_id: Option<AccountId>,

    /// From `X-Correlation-Id`, or generated per request
    pub correlation_id: Option<Uuid>,

    pub client_ip: Option<IpAddr>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_user(mut self, account_id: AccountId) -> Self {
        self.request_user_id = Some(account_id);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip);
        self
    }
}

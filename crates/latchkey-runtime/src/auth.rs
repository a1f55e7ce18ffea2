//! Credential authentication seam.
//!
//! The session task delegates the credential exchange to an authenticator
//! behind this trait. The cryptographic engine plugs in here; the mock
//! stands in for it in tests and the off-hardware binary.

#![allow(async_fn_in_trait)]

use latchkey_core::{AuthOutcome, KeyFlow, Result};
use latchkey_hardware::NfcLink;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Runs a credential flow against the selected target.
pub trait CredentialAuthenticator: Send {
    /// Authenticate the currently selected target.
    ///
    /// The authenticator drives whatever APDU exchanges the flow needs
    /// through `link`. A flow that concluded without a matching credential
    /// returns `Ok` with a failed outcome; `Err` is reserved for transport
    /// trouble.
    async fn authenticate<L: NfcLink>(&mut self, flow: KeyFlow, link: &mut L)
    -> Result<AuthOutcome>;
}

/// Scripted authenticator for tests.
///
/// Pops one outcome per call; an exhausted script authenticates as failed.
/// Records the flows it was asked to run.
#[derive(Debug, Clone, Default)]
pub struct MockAuthenticator {
    outcomes: Arc<Mutex<VecDeque<AuthOutcome>>>,
    flows: Arc<Mutex<Vec<KeyFlow>>>,
}

impl MockAuthenticator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome for the next authentication.
    pub fn push_outcome(&self, outcome: AuthOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    /// Flows requested so far, in order.
    #[must_use]
    pub fn flows(&self) -> Vec<KeyFlow> {
        self.flows.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl CredentialAuthenticator for MockAuthenticator {
    async fn authenticate<L: NfcLink>(
        &mut self,
        flow: KeyFlow,
        _link: &mut L,
    ) -> Result<AuthOutcome> {
        self.flows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(flow);
        let outcome = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(AuthOutcome::failed);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latchkey_core::FlowStatus;
    use latchkey_hardware::mock::MockNfc;

    #[tokio::test]
    async fn test_mock_scripted_then_exhausted() {
        let (mut link, _) = MockNfc::new();
        let mut auth = MockAuthenticator::new();
        auth.push_outcome(AuthOutcome {
            issuer_id: vec![0xAA],
            endpoint_id: vec![0xBB],
            status: FlowStatus::Completed(KeyFlow::Fast),
        });

        let first = auth.authenticate(KeyFlow::Fast, &mut link).await.unwrap();
        assert!(!first.status.is_failed());

        let second = auth.authenticate(KeyFlow::Standard, &mut link).await.unwrap();
        assert!(second.status.is_failed());

        assert_eq!(auth.flows(), vec![KeyFlow::Fast, KeyFlow::Standard]);
    }
}

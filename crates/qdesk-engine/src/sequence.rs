// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily ticket numbering.

use std::sync::Arc;

use chrono::NaiveDate;
use qdesk_core::types::{PriorityType, Service, ServiceId, TicketNumber};
use qdesk_core::{QdeskError, TicketStore};

/// Hands out per-service, per-day, per-class ordinals starting at 1.
///
/// Atomicity comes from the store's `upsert_sequence`; concurrent callers for
/// the same service and day always get distinct, contiguous ordinals.
#[derive(Clone)]
pub struct SequenceGenerator {
    store: Arc<dyn TicketStore>,
}

impl SequenceGenerator {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    /// Next number for the service with `service_id`.
    pub async fn next_number(
        &self,
        service_id: ServiceId,
        date: NaiveDate,
        priority_type: PriorityType,
    ) -> Result<TicketNumber, QdeskError> {
        let service = self
            .store
            .service(service_id)
            .await?
            .ok_or_else(|| QdeskError::not_found("service", service_id))?;
        self.next_for(&service, date, priority_type).await
    }

    /// Next number for an already loaded service.
    pub async fn next_for(
        &self,
        service: &Service,
        date: NaiveDate,
        priority_type: PriorityType,
    ) -> Result<TicketNumber, QdeskError> {
        let ordinal = self
            .store
            .upsert_sequence(service.id, date, priority_type)
            .await?;
        Ok(TicketNumber::new(service.code.clone(), priority_type, ordinal))
    }
}

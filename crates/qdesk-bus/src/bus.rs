// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast-channel event bus with per-channel fan-out.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use qdesk_core::{DeskEvent, DisplayProfile, NotificationPublisher, QdeskError};

use crate::channel::Channel;

/// In-process publisher that routes each event to the channels watching it.
///
/// Channels are created on first subscription and pruned once their last
/// receiver is gone. Slow receivers lag and skip events; the bus never blocks.
pub struct EventBus {
    channels: DashMap<Channel, broadcast::Sender<DeskEvent>>,
    displays: Vec<DisplayProfile>,
    capacity: usize,
}

impl EventBus {
    /// Creates a bus whose channels buffer up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            displays: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Registers the display profiles that receive events for their rooms.
    pub fn with_displays(mut self, displays: Vec<DisplayProfile>) -> Self {
        self.displays = displays;
        self
    }

    pub fn displays(&self) -> &[DisplayProfile] {
        &self.displays
    }

    /// Subscribes to `channel`, creating it if needed.
    pub fn subscribe(&self, channel: Channel) -> broadcast::Receiver<DeskEvent> {
        self.channels
            .entry(channel)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Live receivers on `channel`.
    pub fn subscriber_count(&self, channel: &Channel) -> usize {
        self.channels
            .get(channel)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Channels an event is delivered to.
    pub fn route(&self, event: &DeskEvent) -> Vec<Channel> {
        let mut targets = match event {
            DeskEvent::TicketCalled(called) => vec![
                Channel::AllRooms,
                Channel::Ticket(called.number.clone()),
                Channel::Dashboard,
            ],
            DeskEvent::QueueUpdated(updated) => vec![
                Channel::Room(updated.room_id),
                Channel::Dashboard,
                Channel::AllRooms,
            ],
            DeskEvent::TicketStatusChanged(changed) => vec![
                Channel::Ticket(changed.number.clone()),
                Channel::Dashboard,
                Channel::AllRooms,
            ],
        };
        let room_id = event.room_id();
        targets.extend(
            self.displays
                .iter()
                .filter(|display| display.watches(room_id))
                .map(|display| Channel::Display(display.id.clone())),
        );
        targets
    }

    /// Sends `event` to every routed channel, returning the number of receivers reached.
    pub fn broadcast(&self, event: &DeskEvent) -> usize {
        let mut delivered = 0;
        for channel in self.route(event) {
            let Some(sender) = self.channels.get(&channel).map(|s| s.clone()) else {
                continue;
            };
            match sender.send(event.clone()) {
                Ok(count) => {
                    trace!(%channel, count, kind = event.kind(), "event delivered");
                    delivered += count;
                }
                Err(_) => {
                    self.channels
                        .remove_if(&channel, |_, sender| sender.receiver_count() == 0);
                    debug!(%channel, "pruned channel without receivers");
                }
            }
        }
        delivered
    }
}

#[async_trait]
impl NotificationPublisher for EventBus {
    async fn publish(&self, event: DeskEvent) -> Result<usize, QdeskError> {
        Ok(self.broadcast(&event))
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The Dispatcher's side of the pub/sub bus: publishing EvaluationRequests
//! to objective-metric producer tools and subscribing to each run's private result channel
//! `<workflow_id>/<arch_id>` (spec §4.3, §6). One MQTT connection is shared
//! across every concurrently running TSE; inbound results are routed to the
//! correlation task of the owning run by `workflow_id`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::{mpsc, Mutex};

use crate::config::BusSettings;
use crate::errors::DispatchError;
use crate::schemas::envelope::{EvaluationRequest, ResultEnvelope};

type Registrations = Arc<Mutex<HashMap<String, mpsc::UnboundedSender<(String, ResultEnvelope)>>>>;

#[derive(Clone)]
pub struct DispatcherBus {
    client: AsyncClient,
    registrations: Registrations,
}

impl DispatcherBus {
    /// Connects and spawns the background event-loop task. The returned
    /// handle can be dropped without killing the event loop — it lives for
    /// the process lifetime, same as the teacher's long-running services.
    pub async fn connect(settings: &BusSettings) -> Result<Self, DispatchError> {
        let mut options = MqttOptions::new(settings.client_id.clone(), settings.broker_host.clone(), settings.broker_port);
        options.set_keep_alive(Duration::from_secs(60));

        let (client, mut event_loop) = AsyncClient::new(options, 256);
        let registrations: Registrations = Arc::new(Mutex::new(HashMap::new()));

        let task_registrations = Arc::clone(&registrations);
        tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        route_inbound(&task_registrations, &publish.topic, &publish.payload).await;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::error!(error = %err, "dispatcher mqtt event loop error; reconnecting");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok(Self { client, registrations })
    }

    /// Publish one EvaluationRequest to a Level-1 tool's request topic
    /// (`evaluators/<tool>/<function>`).
    pub async fn dispatch(&self, topic: &str, request: &EvaluationRequest) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(request).map_err(|e| DispatchError::BusUnavailable(e.to_string()))?;
        self.client
            .publish(topic, QoS::AtLeastOnce, false, body)
            .await
            .map_err(|e| DispatchError::BusUnavailable(e.to_string()))
    }

    /// Subscribe to one run's private result channel and register a
    /// receiver the correlation task drains. `topic_filter` is the
    /// workflow's `subscribe_topic` (`<workflow_id>/#`).
    pub async fn subscribe_run(&self, workflow_id: &str, topic_filter: &str) -> Result<mpsc::UnboundedReceiver<(String, ResultEnvelope)>, DispatchError> {
        self.client
            .subscribe(topic_filter, QoS::AtLeastOnce)
            .await
            .map_err(|e| DispatchError::BusUnavailable(e.to_string()))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        self.registrations.lock().await.insert(workflow_id.to_string(), sender);
        Ok(receiver)
    }

    /// Drop the registration once a run reaches DONE/CANCELLED. The broker
    /// subscription is left in place (cheap, and another run may reuse the
    /// same client) — only the routing entry is torn down.
    pub async fn unsubscribe_run(&self, workflow_id: &str) {
        self.registrations.lock().await.remove(workflow_id);
    }
}

async fn route_inbound(registrations: &Registrations, topic: &str, payload: &[u8]) {
    let workflow_id = match topic.split('/').next() {
        Some(id) => id,
        None => return,
    };
    let architecture_id = match topic.splitn(2, '/').nth(1) {
        Some(rest) => rest.to_string(),
        None => return,
    };

    let envelope: ResultEnvelope = match serde_json::from_slice(payload) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::error!(error = %err, topic, "malformed ResultEnvelope on run-private topic; dropping");
            return;
        }
    };

    let guard = registrations.lock().await;
    if let Some(sender) = guard.get(workflow_id) {
        let _ = sender.send((architecture_id, envelope));
    }
}

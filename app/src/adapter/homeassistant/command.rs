use std::sync::Arc;

use infrastructure::{MqttInMessage, MqttSubscription};

use crate::coordinator::CoordinatorClient;
use crate::descriptor::{AirMode, Platform};
use crate::entity::CatalogEntry;
use crate::port::ModeCommandChannel;

use super::HomeAssistant;

/// Applies mode selections made in Home Assistant.
pub struct HaCommandProcessor<C> {
    handler: ModeCommandHandler<C>,
    subscription: MqttSubscription,
}

struct ModeCommandHandler<C> {
    config: HomeAssistant,
    entries: Vec<Arc<CatalogEntry>>,
    channel: C,
    coordinator: CoordinatorClient,
}

impl<C: ModeCommandChannel> HaCommandProcessor<C> {
    pub async fn new(
        config: HomeAssistant,
        mqtt: &mut infrastructure::Mqtt,
        entries: Vec<Arc<CatalogEntry>>,
        channel: C,
        coordinator: CoordinatorClient,
    ) -> anyhow::Result<Self> {
        let subscription = mqtt.subscribe(config.command_subscription()).await?;

        Ok(Self {
            handler: ModeCommandHandler {
                config,
                entries,
                channel,
                coordinator,
            },
            subscription,
        })
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.subscription.recv().await {
            if let Err(e) = self.handler.handle(&msg).await {
                tracing::error!("Error processing command on {} with payload {:?}: {:?}", msg.topic, msg.payload, e);
            }
        }

        tracing::warn!("Command subscription closed");
    }
}

impl<C: ModeCommandChannel> ModeCommandHandler<C> {
    #[tracing::instrument(skip_all, fields(topic = %msg.topic))]
    async fn handle(&self, msg: &MqttInMessage) -> anyhow::Result<()> {
        let Some(entry) = self.target(&msg.topic) else {
            anyhow::bail!("No select entity listens on {}", msg.topic);
        };

        let Some(mode) = AirMode::from_label(&msg.payload) else {
            anyhow::bail!(
                "Unknown mode {:?} for {}, expected one of {:?}",
                msg.payload,
                entry.unique_id(),
                AirMode::labels()
            );
        };

        tracing::info!("Received mode {} for {}", mode.label(), entry.display_name());

        //no retry, a rejected mode stays rejected
        self.channel.set_mode(&entry.modem, mode).await?;
        self.coordinator.request_refresh();

        Ok(())
    }

    fn target(&self, topic: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .map(Arc::as_ref)
            .filter(|entry| entry.descriptor.platform == Platform::Select)
            .find(|entry| self.config.command_topic(entry) == topic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::homeassistant::tests::{config, entry};
    use crate::coordinator::Coordinator;
    use crate::core::{Document, ProductReference};
    use crate::entity::InstanceKey;
    use crate::port::{CommandError, ProductSource};
    use chrono::Utc;
    use std::sync::Mutex;
    use std::time::Duration;

    struct NoProducts;

    impl ProductSource for NoProducts {
        async fn fetch_products(&self) -> anyhow::Result<Document> {
            Ok(Document::new(vec![], Utc::now()))
        }
    }

    #[derive(Default)]
    struct FakeChannel {
        reject: bool,
        calls: Mutex<Vec<(String, AirMode)>>,
    }

    impl ModeCommandChannel for &FakeChannel {
        async fn set_mode(&self, modem: &str, mode: AirMode) -> Result<(), CommandError> {
            self.calls.lock().unwrap().push((modem.to_string(), mode));

            if self.reject {
                return Err(CommandError::RemoteRejected {
                    modem: modem.to_string(),
                    code: mode.code(),
                    status: 400,
                    message: "refused".to_string(),
                });
            }

            Ok(())
        }
    }

    fn handler<'a>(channel: &'a FakeChannel, coordinator: &Coordinator<NoProducts>) -> ModeCommandHandler<&'a FakeChannel> {
        ModeCommandHandler {
            config: config(),
            entries: vec![
                Arc::new(entry(ProductReference::EasyHomeConnect, "kitchen_temperature", InstanceKey::Single)),
                Arc::new(entry(ProductReference::EasyHomeConnect, "mode", InstanceKey::Single)),
            ],
            channel,
            coordinator: coordinator.client(),
        }
    }

    fn message(topic: &str, payload: &str) -> MqttInMessage {
        MqttInMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
        }
    }

    #[tokio::test]
    async fn label_is_sent_as_mode() {
        let channel = FakeChannel::default();
        let coordinator = Coordinator::new(NoProducts, Duration::from_secs(60));

        let result = handler(&channel, &coordinator).handle(&message("aldes/s1/mode/set", "Air Prog")).await;

        assert!(result.is_ok());
        assert_eq!(*channel.calls.lock().unwrap(), vec![("M1".to_string(), AirMode::AirProg)]);
    }

    #[tokio::test]
    async fn unknown_label_is_not_sent() {
        let channel = FakeChannel::default();
        let coordinator = Coordinator::new(NoProducts, Duration::from_secs(60));

        let result = handler(&channel, &coordinator).handle(&message("aldes/s1/mode/set", "Turbo")).await;

        assert!(result.is_err());
        assert!(channel.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sensor_topics_take_no_commands() {
        let channel = FakeChannel::default();
        let coordinator = Coordinator::new(NoProducts, Duration::from_secs(60));
        let handler = handler(&channel, &coordinator);

        assert!(handler.handle(&message("aldes/s1/kitchen_temperature/set", "Daily")).await.is_err());
        assert!(handler.handle(&message("aldes/S9/mode/set", "Daily")).await.is_err());
        assert!(channel.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejection_is_reported() {
        let channel = FakeChannel {
            reject: true,
            ..Default::default()
        };
        let coordinator = Coordinator::new(NoProducts, Duration::from_secs(60));

        let result = handler(&channel, &coordinator).handle(&message("aldes/s1/mode/set", "Boost")).await;

        let error = result.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<CommandError>(),
            Some(CommandError::RemoteRejected { status: 400, .. })
        ));
    }
}

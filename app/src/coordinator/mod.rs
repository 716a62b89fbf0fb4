use std::sync::Arc;

use infrastructure::{EventBus, EventListener, meter};
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant};

use crate::core::Document;
use crate::port::ProductSource;

/// Polls the product source and hands every snapshot to the subscribers.
pub struct Coordinator<S> {
    source: S,
    interval: Duration,
    snapshot: Option<Arc<Document>>,
    events: EventBus<Arc<Document>>,
    refresh_tx: mpsc::Sender<()>,
    refresh_rx: mpsc::Receiver<()>,
}

#[derive(Clone)]
pub struct CoordinatorClient {
    refresh_tx: mpsc::Sender<()>,
}

impl<S: ProductSource> Coordinator<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        //one pending request is enough, polls never overlap
        let (refresh_tx, refresh_rx) = mpsc::channel(1);

        Self {
            source,
            interval,
            snapshot: None,
            events: EventBus::new(16),
            refresh_tx,
            refresh_rx,
        }
    }

    pub fn client(&self) -> CoordinatorClient {
        CoordinatorClient {
            refresh_tx: self.refresh_tx.clone(),
        }
    }

    pub fn subscribe(&self) -> EventListener<Arc<Document>> {
        self.events.subscribe()
    }

    /// Initial fetch, required to build the catalog. Unlike later polls, a failure is returned.
    pub async fn first_refresh(&mut self) -> anyhow::Result<Arc<Document>> {
        let document = Arc::new(self.source.fetch_products().await?);
        self.snapshot = Some(document.clone());
        Ok(document)
    }

    pub async fn run(mut self) {
        if let Some(snapshot) = &self.snapshot {
            self.events.emitter().send(snapshot.clone());
        }

        let next_poll = time::sleep(self.interval);
        tokio::pin!(next_poll);

        loop {
            tokio::select! {
                () = &mut next_poll => {},
                Some(()) = self.refresh_rx.recv() => {
                    tracing::debug!("Refresh requested");
                },
            }

            if let Some(document) = self.refresh().await {
                self.events.emitter().send(document);
            }

            next_poll.as_mut().reset(Instant::now() + self.interval);
        }
    }

    /// Failed polls are logged and keep the previous snapshot current.
    #[tracing::instrument(skip_all)]
    async fn refresh(&mut self) -> Option<Arc<Document>> {
        match self.source.fetch_products().await {
            Ok(document) => {
                tracing::debug!("Fetched {} products", document.products().len());
                meter::set("aldes_products", document.products().len() as f64, &[]);
                let document = Arc::new(document);
                self.snapshot = Some(document.clone());
                Some(document)
            }
            Err(e) => {
                tracing::error!("Error fetching products, keeping last snapshot: {:?}", e);
                meter::increment("aldes_fetch_errors", &[]);
                None
            }
        }
    }
}

impl CoordinatorClient {
    /// Schedules an immediate poll. Requests arriving while one is pending are merged.
    pub fn request_refresh(&self) {
        match self.refresh_tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => {}
            Err(mpsc::error::TrySendError::Closed(())) => {
                tracing::warn!("Coordinator stopped, refresh request dropped");
            }
        }
    }
}

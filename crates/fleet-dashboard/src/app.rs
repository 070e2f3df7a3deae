//! Application wiring.

use std::sync::Arc;

use fleet_api::{FleetApi, VehicleApiClient};
use fleet_store::{FleetSession, FleetStore};
use fleet_ws::{PushConnector, PushSink};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::view::{render_summary, run_view};

/// Main application.
pub struct Application {
    config: AppConfig,
    store: FleetStore,
    connector: Arc<PushConnector>,
}

impl Application {
    /// Build the REST client, stores and push connector.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let client = VehicleApiClient::with_timeout(&config.api_base_url, config.request_timeout())?;
        info!(base_url = %client.base_url(), "REST client ready");
        let api: Arc<dyn FleetApi> = Arc::new(client);

        let store = FleetStore::new(api);
        store.vehicles.set_filter(config.initial_filter);

        let sink: Arc<dyn PushSink> = Arc::new(store.clone());
        let connector = Arc::new(PushConnector::new(config.push_config(), sink));

        Ok(Self {
            config,
            store,
            connector,
        })
    }

    pub fn store(&self) -> &FleetStore {
        &self.store
    }

    /// Fetch once and return the rendered summary. No push channel.
    pub async fn snapshot(&self) -> AppResult<String> {
        self.store.refresh().await?;
        Ok(render_summary(
            &self.store.vehicles.state(),
            &self.store.statistics.state(),
        ))
    }

    /// Mount the session and render on every change until Ctrl-C.
    pub async fn run(self) -> AppResult<()> {
        info!(
            api_base_url = %self.config.api_base_url,
            ws_url = %self.config.ws_url,
            filter = self.config.initial_filter.as_str(),
            "Starting fleet dashboard"
        );

        let session = FleetSession::mount(
            self.store.clone(),
            self.connector.clone(),
            self.config.poll_interval(),
        )
        .await;

        let view_token = CancellationToken::new();
        let view = tokio::spawn(run_view(self.store.clone(), view_token.clone()));

        let signal = tokio::signal::ctrl_c().await;
        info!("Shutdown requested");

        view_token.cancel();
        if let Err(e) = view.await {
            warn!(?e, "View task ended abnormally");
        }
        session.unmount().await;

        signal?;
        Ok(())
    }
}

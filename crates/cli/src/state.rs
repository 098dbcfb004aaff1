use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use oddjob_core::{
    create_client, BookingClient, BookingClientError, Config, OrchestratorConfig, Platform,
};

/// Builds a fresh client for one booking run.
///
/// Runs never share a client, so concurrent invocations cannot interleave
/// session cookies.
pub type ClientFactory =
    Arc<dyn Fn() -> Result<Box<dyn BookingClient>, BookingClientError> + Send + Sync>;

/// Shared application state
pub struct AppState {
    clients: HashMap<Platform, ClientFactory>,
    orchestrator: OrchestratorConfig,
    today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(orchestrator: OrchestratorConfig) -> Self {
        Self {
            clients: HashMap::new(),
            orchestrator,
            today: None,
        }
    }

    /// Register every platform with usable credentials in `config`.
    ///
    /// Requests for a skipped platform are answered as unconfigured.
    pub fn from_config(config: &Config) -> Self {
        let mut state = Self::new(config.orchestrator.clone());

        for platform in [Platform::Resy, Platform::OpenTable] {
            match create_client(platform, config) {
                Ok(_) => {
                    info!("{} client ready", platform);
                    let config = config.clone();
                    state = state.with_client_factory(
                        platform,
                        Arc::new(move || create_client(platform, &config)),
                    );
                }
                Err(e) => warn!("{} bookings disabled: {}", platform, e),
            }
        }

        state
    }

    pub fn with_client_factory(mut self, platform: Platform, factory: ClientFactory) -> Self {
        self.clients.insert(platform, factory);
        self
    }

    /// Pin the date requests are validated against.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// A new client for `platform`, or `None` if it is not configured.
    pub fn client(
        &self,
        platform: Platform,
    ) -> Option<Result<Box<dyn BookingClient>, BookingClientError>> {
        self.clients.get(&platform).map(|factory| factory())
    }

    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<_> = self.clients.keys().copied().collect();
        platforms.sort_by_key(|p| p.as_str());
        platforms
    }

    pub fn orchestrator_config(&self) -> &OrchestratorConfig {
        &self.orchestrator
    }

    /// The date requests are validated against.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

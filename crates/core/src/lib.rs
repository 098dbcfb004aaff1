pub mod client;
pub mod config;
pub mod orchestrator;
pub mod request;
pub mod selection;
pub mod testing;

pub use client::{
    create_client, BookingClient, BookingClientError, BookingConfirmation, BookingStep,
    OpenTableClient, OpenTableCredentials, Platform, ResyClient, ResyCredentials, Slot, SlotData,
};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use orchestrator::{
    AttemptFailure, BookingOrchestrator, BookingOutcome, BookingState, CancelHandle,
    OrchestratorConfig, OrchestratorError, RunMode,
};
pub use request::{BookingPlan, BookingRequest, RequestError};
pub use selection::{rank_preferred_times, select_best_slot};

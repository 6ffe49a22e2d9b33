pub mod handler;
pub mod services;

pub use handler::{
    Ack,
    EventHandler,
};
pub use services::change_failure_rate::ChangeFailureRateService;
pub use services::deployment_frequency::DeploymentFrequencyService;
pub use services::lead_time::LeadTimeService;
pub use services::mean_time_to_restore::MeanTimeToRestoreService;
pub use services::ReleaseSettings;

pub mod env;
pub mod interpolation;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::{
    apply_env_overrides,
    parse_repo_names,
};
pub use interpolation::interpolate;
pub use loader::{
    ConfigLoadError,
    ConfigLoader,
};
pub use schema::{
    AwsConfig,
    DoraConfig,
    GeneralConfig,
    HistoryConfig,
    ServerConfig,
};
pub use validation::{
    ConfigValidator,
    ValidationResult,
};

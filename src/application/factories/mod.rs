mod execution_environment_factory;
mod formatter_factory;
mod presenter_factory;

pub use execution_environment_factory::{
    EnvironmentChoice, ExecutionEnvironmentFactory, ExecutionEnvironmentSettings,
    MANAGED_BUILD_MARKERS,
};
pub use formatter_factory::{FormatterFactory, FormatterType};
pub use presenter_factory::{PresenterFactory, PresenterType};

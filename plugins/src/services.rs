//! ServicesFactory implementation: builds classifier, store and executor from config for the CLI.
use operator_core::api::{AppConfig, CliError, Services, ServicesFactory};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

impl ServicesFactory for PluginServicesFactory {
    fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError> {
        let classifier = factory::build_classifier(cfg).map_err(CliError::Plugin)?;
        let store = factory::build_store(cfg);
        let executor = factory::build_executor(cfg);
        Ok(Services {
            classifier,
            store,
            executor,
        })
    }
}

use anyhow::{Context, Result};
use upsbridge::classifier::Classifier;
use upsbridge::convert::ConverterCatalog;
use upsbridge::logging::{get_logger, init_logging};
use upsbridge::session::{DeviceProfile, Session};
use upsbridge::store::MemoryStore;
use upsbridge::transport::SimulatedDevice;
use upsbridge::{Config, Engine, Registry, UpsDriver};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        None => Config::load().context("loading configuration")?,
    };
    config.validate().context("invalid configuration")?;
    init_logging(&config.logging).context("initializing logging")?;
    let logger = get_logger("main");

    let classification = Classifier::with_overrides(&config.device.model_rules)
        .classify(&config.device.product, &config.device.model);
    logger.info(&format!(
        "upsbridge {} starting for {} ({})",
        env!("UPSBRIDGE_VERSION"),
        classification.display_name,
        classification.family.code()
    ));
    let profile = DeviceProfile::from_classification(classification)
        .with_nominal_output_voltage(config.device.nominal_output_voltage);
    let session = Session::with_transfer_config(profile, config.transfer);

    let registry = match &config.device.mapping_file {
        Some(path) => Registry::from_yaml_file(path, &ConverterCatalog::builtin())
            .with_context(|| format!("loading mapping table {}", path))?,
        None => Registry::builtin(),
    };

    let device = SimulatedDevice::from_config(&config.simulator);
    let engine = Engine::new(registry, session, device, MemoryStore::new());
    let driver = UpsDriver::new(engine, config.poll.clone());
    let handle = driver.handle();

    let task = tokio::spawn(driver.run());
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    logger.info("Interrupted, shutting down");
    // A closed channel means the driver already stopped on its own
    let _ = handle.shutdown();

    let engine = task.await.context("driver task panicked")??;
    logger.info(&format!(
        "Final state: {}",
        engine.store().to_json().context("serializing final state")?
    ));
    Ok(())
}

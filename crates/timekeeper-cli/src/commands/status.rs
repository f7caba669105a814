use timekeeper_core::probe::{ProcessProbe, SystemProbe};
use timekeeper_core::Config;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let running = SystemProbe::new().is_running(&config.process_name);

    if json {
        let status = serde_json::json!({
            "process": config.process_name,
            "running": running,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        let status = if running { "running" } else { "not detected" };
        println!("{}: {status}", config.process_name);
    }
    Ok(())
}

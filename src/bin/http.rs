#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use chrono::Local;
    use pump_forecast::{Scenario, http_api, logging, persistence};

    logging::init();

    let addr: SocketAddr = std::env::var("PUMP_FORECAST_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let scenario = match std::env::args().nth(1) {
        Some(path) => persistence::load_scenario_from_json(path)?,
        None => Scenario::new(Local::now().date_naive()),
    };

    println!("pump-forecast HTTP API listening on http://{addr}");
    http_api::serve(addr, scenario).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}

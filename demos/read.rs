use linux_embedded_hal;

use sds011::*;
use tracing::{info, warn};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().expect("Missing path to device");
    let config = match args.next().as_deref() {
        Some("--lenient") => DecoderConfig::default(),
        _ => DecoderConfig::strict(),
    };

    info!(%path, ?config, "Connecting");

    let device = linux_embedded_hal::Serial::open(std::path::Path::new(&path)).unwrap();
    let mut sensor = Sds011Sensor::with_config(device, config);
    let mut rejected = 0usize;

    loop {
        match sensor.read() {
            Ok(measurement) => info!(
                pm2_5 = measurement.pm2_5,
                pm10 = measurement.pm10,
                "PM2.5 {:.1} μg/m³, PM10 {:.1} μg/m³",
                measurement.pm2_5,
                measurement.pm10
            ),
            Err(Error::Decode(e)) => {
                rejected += 1;
                warn!(rejected, "{}", e);
            }
            Err(e) => {
                warn!("{}", e);
                break;
            }
        }
    }
}

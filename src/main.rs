use std::collections::HashMap;

use tracing::info;

use staycation::model::{ExistingBooking, RoomId};
use staycation::provider::InMemoryBookings;
use staycation::report::{self, CheckRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let metrics_port: Option<u16> = std::env::var("STAYCATION_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    staycation::observability::init(metrics_port)?;

    let bookings_path =
        std::env::var("STAYCATION_BOOKINGS").unwrap_or_else(|_| "./bookings.json".into());
    let request_path =
        std::env::var("STAYCATION_REQUEST").unwrap_or_else(|_| "./request.json".into());

    // { "<room id>": [booking, ...], ... }
    let rooms: HashMap<RoomId, Vec<ExistingBooking>> =
        serde_json::from_str(&std::fs::read_to_string(&bookings_path)?)?;
    let request: CheckRequest = serde_json::from_str(&std::fs::read_to_string(&request_path)?)?;

    info!("bookings: {bookings_path} ({} rooms)", rooms.len());
    info!("request: {request_path}");

    let provider = InMemoryBookings::from_rooms(rooms);
    let report = report::evaluate(&provider, &request).await?;
    match &report.error {
        None => info!("{} from {} is available", request.stay_type, request.check_in_date),
        Some(e) => info!("check failed on {}: {}", e.field, e.message),
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

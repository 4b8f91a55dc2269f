//! Historical series normalization

use serde_json::Value;
use tracing::debug;

use crate::models::simulation::Observation;
use crate::simulation::SimulationError;

pub const DEFAULT_VOLUME: f64 = 1.0;

/// Validate the raw series and lazily yield its well-formed observations in
/// the order supplied.
///
/// A series that is absent or not a list fails the whole call. Rows that
/// cannot be read as an observation are dropped and the rest still flow.
pub fn normalize(raw: &Value) -> Result<impl Iterator<Item = Observation> + '_, SimulationError> {
    let rows = raw
        .as_array()
        .ok_or(SimulationError::MissingHistoricalData)?;

    Ok(rows.iter().enumerate().filter_map(|(index, row)| {
        let observation = parse_observation(row);
        if observation.is_none() {
            debug!(index = index, row = %row, "Skipping malformed observation");
        }
        observation
    }))
}

/// Read a single row.
///
/// `date` and `close` are required (null counts as missing), `close` and
/// `volume` must be numeric, and `volume` falls back to 1 when absent or null.
/// Rows whose notional `close * volume` overflows are dropped. Non-string
/// dates are kept in their JSON text form.
pub fn parse_observation(row: &Value) -> Option<Observation> {
    let fields = row.as_object()?;

    let date = match fields.get("date")? {
        Value::Null => return None,
        Value::String(date) => date.clone(),
        other => other.to_string(),
    };
    let close = fields.get("close")?.as_f64()?;
    let volume = match fields.get("volume") {
        None | Some(Value::Null) => DEFAULT_VOLUME,
        Some(volume) => volume.as_f64()?,
    };

    let observation = Observation {
        date,
        close,
        volume,
    };
    // close * volume must stay representable or the ledger turns non-finite
    if !observation.notional().is_finite() {
        return None;
    }

    Some(observation)
}

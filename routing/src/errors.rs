use std::fmt;
use std::fmt::Display;

/// Violations of the input contract. These are programmer errors on the
/// caller's side: the searches assume the contract holds and only re-check it
/// in debug builds, but callers can run the checks themselves up front.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum InvalidInput {
    /// A trip service delivered a stop sequence that does not strictly
    /// increase over the previous one.
    UnorderedStopSequence {
        trip_service_id: String,
        stop_sequence: u32,
    },
    /// A stop time arrives before the previous stop of the same trip
    /// service departed.
    DecreasingTimes {
        trip_service_id: String,
        stop_sequence: u32,
    },
    /// A stop time departs before it arrives.
    ArrivalAfterDeparture {
        trip_service_id: String,
        stop_sequence: u32,
    },
}

impl Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidInput::UnorderedStopSequence { trip_service_id, stop_sequence } => write!(
                f,
                "stop times of trip service {trip_service_id} are not in ascending stop sequence order (at sequence {stop_sequence})"
            ),
            InvalidInput::DecreasingTimes { trip_service_id, stop_sequence } => write!(
                f,
                "times of trip service {trip_service_id} decrease along the trip (at sequence {stop_sequence})"
            ),
            InvalidInput::ArrivalAfterDeparture { trip_service_id, stop_sequence } => write!(
                f,
                "trip service {trip_service_id} departs before it arrives (at sequence {stop_sequence})"
            ),
        }
    }
}

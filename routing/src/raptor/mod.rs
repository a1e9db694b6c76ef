//! Round-based public-transit routing (RAPTOR).
//!
//! Each round allows one additional in-vehicle leg: round `k` discovers every
//! stop reachable with at most `k` rides, chaining optional walking transfers
//! in between. Two symmetric searches share the data model: the forward
//! search answers "departing at or after T, when do I arrive?", the reverse
//! search answers "arriving by T, when do I have to leave?".
//!
//! The searches are pure, synchronous functions of their inputs. Timetable
//! entities come in through the capability traits in
//! [`common::types::timetable`], so callers with existing storage adapt
//! without copying their payloads.

mod forward;
mod prepare;
mod reverse;
mod state;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use common::types::timetable::{Stop, StopTime, Transfer};
use common::types::{Timestamp, UniqueId};

use crate::errors::InvalidInput;
use crate::journey::Journey;
pub(crate) use prepare::PreparedInput;

/// How `time_reference` is to be read.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// `time_reference` is the earliest departure; find earliest arrivals.
    DepartAt,
    /// `time_reference` is the latest arrival; find latest departures.
    ArriveBy,
}

/// Lookup indices the caller computed ahead of time, e.g. once per service
/// day for many searches. Supplied indices are adopted verbatim; whatever is
/// missing gets built from the raw slices. Values are indices into the
/// corresponding `SearchInput` slice.
pub struct PrecomputedIndexes<'a, ID> {
    pub transfers_by_from_stop: Option<&'a HashMap<ID, Vec<usize>>>,
    pub stop_times_by_stop: Option<&'a HashMap<ID, Vec<usize>>>,
    pub stop_times_by_trip_service: Option<&'a HashMap<ID, Vec<usize>>>,
}

impl<ID> Default for PrecomputedIndexes<'_, ID> {
    fn default() -> Self {
        Self {
            transfers_by_from_stop: None,
            stop_times_by_stop: None,
            stop_times_by_trip_service: None,
        }
    }
}

// not derived: derive would demand ID: Copy, but these are only references
impl<ID> Clone for PrecomputedIndexes<'_, ID> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<ID> Copy for PrecomputedIndexes<'_, ID> {}

/// Everything one search needs.
///
/// `stop_times` is shared by both modes and always forward-ordered: within
/// each trip service id, ascending by stop sequence with non-decreasing
/// times. The reverse search traverses it backwards through its cursor
/// instead of expecting reversed input.
pub struct SearchInput<'a, ID, S, T, ST> {
    pub from_stops: &'a [S],
    pub to_stops: &'a [S],
    pub transfers: &'a [T],
    pub stop_times: &'a [ST],
    pub mode: SearchMode,
    pub time_reference: Timestamp,
    /// The number of rounds, i.e. the maximum number of in-vehicle legs.
    pub maximum_transfers: usize,
    /// When false, at most one consecutive walking transfer is taken between
    /// two rides.
    pub allow_transfer_hopping: bool,
    pub precomputed: PrecomputedIndexes<'a, ID>,
}

impl<ID, S, T, ST> SearchInput<'_, ID, S, T, ST>
where
    ID: UniqueId,
    S: Stop<ID>,
    T: Transfer<ID>,
    ST: StopTime<ID>,
{
    /// Checks the stop-time contract the searches rely on: per trip service,
    /// strictly ascending stop sequences, non-decreasing times, and
    /// `arrival <= departure` on every row.
    ///
    /// The searches themselves only re-check this in debug builds.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        let mut previous_by_trip_service: HashMap<&ID, (u32, Timestamp)> = HashMap::new();

        for stop_time in self.stop_times {
            let trip_service_id = stop_time.unique_trip_service_id();
            let stop_sequence = stop_time.stop_sequence();

            if stop_time.arrival_time_seconds() > stop_time.departure_time_seconds() {
                return Err(InvalidInput::ArrivalAfterDeparture {
                    trip_service_id: trip_service_id.to_string(),
                    stop_sequence,
                });
            }

            if let Some((previous_sequence, previous_departure)) =
                previous_by_trip_service.get(trip_service_id)
            {
                if stop_sequence <= *previous_sequence {
                    return Err(InvalidInput::UnorderedStopSequence {
                        trip_service_id: trip_service_id.to_string(),
                        stop_sequence,
                    });
                }
                if stop_time.arrival_time_seconds() < *previous_departure {
                    return Err(InvalidInput::DecreasingTimes {
                        trip_service_id: trip_service_id.to_string(),
                        stop_sequence,
                    });
                }
            }

            previous_by_trip_service.insert(
                trip_service_id,
                (stop_sequence, stop_time.departure_time_seconds()),
            );
        }

        Ok(())
    }
}

/// Runs the search selected by `input.mode`.
///
/// Journeys come back in discovery order, unsorted and deduplicated by trip
/// chain. An empty vector means no journey satisfies the constraints; that
/// is a regular outcome, not an error.
pub fn search<ID, S, T, ST>(input: &SearchInput<ID, S, T, ST>) -> Vec<Journey<ID>>
where
    ID: UniqueId,
    S: Stop<ID>,
    T: Transfer<ID>,
    ST: StopTime<ID>,
{
    match input.mode {
        SearchMode::DepartAt => depart_at(input),
        SearchMode::ArriveBy => arrive_by(input),
    }
}

/// Earliest-arrival search: `time_reference` is the earliest departure.
pub fn depart_at<ID, S, T, ST>(input: &SearchInput<ID, S, T, ST>) -> Vec<Journey<ID>>
where
    ID: UniqueId,
    S: Stop<ID>,
    T: Transfer<ID>,
    ST: StopTime<ID>,
{
    #[cfg(debug_assertions)]
    if let Err(err) = input.validate() {
        panic!("invalid routing input: {err}");
    }

    let prepared = PreparedInput::build(input);
    forward::run(input, &prepared)
}

/// Latest-departure search: `time_reference` is the latest arrival.
pub fn arrive_by<ID, S, T, ST>(input: &SearchInput<ID, S, T, ST>) -> Vec<Journey<ID>>
where
    ID: UniqueId,
    S: Stop<ID>,
    T: Transfer<ID>,
    ST: StopTime<ID>,
{
    #[cfg(debug_assertions)]
    if let Err(err) = input.validate() {
        panic!("invalid routing input: {err}");
    }

    let prepared = PreparedInput::build(input);
    reverse::run(input, &prepared)
}

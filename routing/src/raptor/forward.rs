use log::{debug, trace};

use common::types::timetable::{Stop, StopTime, Transfer};
use common::types::UniqueId;
use common::util::directed_slice::DirectedSlice;

use crate::journey::{Journey, JourneyCollector, Span, ViaTrip};

use super::state::{MarkSource, RoundSegment, SearchState};
use super::{PreparedInput, SearchInput};

const LOG_TARGET: &str = "raptor::forward";

/// Earliest-arrival rounds from the origin stops toward the destinations.
///
/// Every origin starts out labelled with the reference time. Each round
/// boards every trip reachable from the marked stops, rides it downstream
/// improving labels along the way, relaxes walking transfers out of improved
/// stops, and emits a journey whenever a destination's label gains a chain
/// that begins and ends with a ride.
pub(super) fn run<ID, S, T, ST>(
    input: &SearchInput<ID, S, T, ST>,
    prepared: &PreparedInput<ID>,
) -> Vec<Journey<ID>>
where
    ID: UniqueId,
    S: Stop<ID>,
    T: Transfer<ID>,
    ST: StopTime<ID>,
{
    let mut state = SearchState::new();
    let mut journeys = JourneyCollector::new();

    for origin in input.from_stops {
        state.seed(origin.unique_id().clone(), input.time_reference);
    }

    for round in 0..input.maximum_transfers {
        if !state.has_marked() {
            break;
        }
        let marked = state.take_marked();
        debug!(
            target: LOG_TARGET,
            "round {}: scanning {} marked stops",
            round + 1,
            marked.len()
        );

        for (marked_stop, mark_source) in marked {
            // a value copy: later improvements to this stop within the same
            // round must not leak into this scan
            let current_label = state.marked_label(&marked_stop).clone();

            let mut boardings = DirectedSlice::new(prepared.stop_times_at(&marked_stop), false);
            while boardings.has_next() {
                let boarding = &input.stop_times[*boardings.next()];

                // a vehicle that leaves before we arrive cannot be boarded
                if boarding.departure_time_seconds() < current_label.arrival_time {
                    continue;
                }
                // if this trip was already boarded at or before this stop, its
                // downstream stops are covered; equal sequences are covered too
                let scanned = state.scanned_sequence(boarding.unique_trip_id());
                if scanned.is_some_and(|sequence| boarding.stop_sequence() >= sequence) {
                    continue;
                }

                state.record_scan(boarding.unique_trip_id().clone(), boarding.stop_sequence());

                let trip_stop_times = DirectedSlice::new(
                    prepared.trip_service_stop_times(boarding.unique_trip_service_id()),
                    false,
                );
                // the trip may be a slice starting mid-route, so offsets are
                // relative to its first delivered stop time
                let first_sequence = input.stop_times[*trip_stop_times.first()].stop_sequence();
                let start_offset = (boarding.stop_sequence() - first_sequence + 1) as usize;
                let count = match scanned {
                    // a prior scan boarded at `sequence` and covered
                    // everything past it; stop there (inclusive)
                    Some(sequence) => (sequence - boarding.stop_sequence()) as usize,
                    None => trip_stop_times.len(),
                };
                let mut downstream = trip_stop_times.sub_slice(start_offset, count);

                while downstream.has_next() {
                    let alight = &input.stop_times[*downstream.next()];
                    let alight_stop = alight.unique_stop_id();

                    let improves = state
                        .label(alight_stop)
                        .is_none_or(|existing| existing.arrival_time > alight.arrival_time_seconds());
                    if improves {
                        let mut spans = current_label.spans.clone();
                        spans.push(Span::Ride {
                            boarding_stop: marked_stop.clone(),
                            alight_stop: alight_stop.clone(),
                            trip: ViaTrip {
                                trip_id: alight.unique_trip_id().clone(),
                                trip_service_id: alight.unique_trip_service_id().clone(),
                                boarding_sequence: boarding.stop_sequence(),
                                alight_sequence: alight.stop_sequence(),
                            },
                            boarding_time: boarding.departure_time_seconds(),
                            alight_time: alight.arrival_time_seconds(),
                        });
                        let alight_label = RoundSegment {
                            stop: alight_stop.clone(),
                            arrival_time: alight.arrival_time_seconds(),
                            spans,
                        };
                        state.store(alight_label.clone());

                        // walking on from here is only allowed when hopping is
                        // on or this label was not itself reached by a walk
                        if input.allow_transfer_hopping || mark_source == MarkSource::Arrival {
                            relax_transfers(input, prepared, &mut state, &alight_label, alight);
                        }
                    }

                    state.mark_arrival(alight_stop.clone());

                    if prepared.is_to_stop(alight_stop) {
                        let segment = state
                            .label(alight_stop)
                            .expect("a destination that was just scanned must have a label");
                        if journeys.offer(&segment.spans) {
                            trace!(target: LOG_TARGET, "journey found to {alight_stop}");
                            // the rest of this ride can only reach the
                            // destination later
                            break;
                        }
                    }
                }
            }
        }

        state.advance_round();
    }

    journeys.into_journeys()
}

/// Appends a walking span to the freshly improved label at `alight` for every
/// transfer leaving its stop, wherever that walk is an improvement. Walked-to
/// stops are marked for the next round, without displacing arrival marks.
fn relax_transfers<ID, S, T, ST>(
    input: &SearchInput<ID, S, T, ST>,
    prepared: &PreparedInput<ID>,
    state: &mut SearchState<ID>,
    alight_label: &RoundSegment<ID>,
    alight: &ST,
) where
    ID: UniqueId,
    S: Stop<ID>,
    T: Transfer<ID>,
    ST: StopTime<ID>,
{
    let alight_stop = alight.unique_stop_id();

    for &transfer_index in prepared.transfers_from(alight_stop) {
        let transfer = &input.transfers[transfer_index];
        let transfer_target = transfer.to_unique_stop_id();

        state.mark_transfer(transfer_target.clone());

        let transfer_arrival = alight.arrival_time_seconds()
            + i64::from(transfer.minimum_transfer_time_seconds());
        let improves = state
            .label(transfer_target)
            .is_none_or(|existing| existing.arrival_time > transfer_arrival);
        if improves {
            let mut spans = alight_label.spans.clone();
            spans.push(Span::Transfer {
                start: alight_stop.clone(),
                end: transfer_target.clone(),
                departure_time: alight.arrival_time_seconds(),
                arrival_time: transfer_arrival,
            });
            state.store(RoundSegment {
                stop: transfer_target.clone(),
                arrival_time: transfer_arrival,
                spans,
            });
        }
    }
}

use log::{debug, trace};

use common::types::timetable::{Stop, StopTime, Transfer};
use common::types::UniqueId;
use common::util::directed_slice::DirectedSlice;

use crate::journey::{Journey, JourneyCollector, Span, ViaTrip};

use super::state::{MarkSource, RoundSegment, SearchState};
use super::{PreparedInput, SearchInput};

const LOG_TARGET: &str = "raptor::reverse";

/// Latest-departure rounds from the destination stops back toward the
/// origins, the forward search under time reversal.
///
/// A label here reads: leaving this stop no later than `arrival_time`, the
/// destination is still reached by the reference time, and `spans` is the
/// onward path. Rides are walked upstream through the reversed cursor, new
/// spans are prepended, and an improvement means a *later* feasible time.
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

    for destination in input.to_stops {
        state.seed(destination.unique_id().clone(), input.time_reference);
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

            let mut alightings = DirectedSlice::new(prepared.stop_times_at(&marked_stop), true);
            while alightings.has_next() {
                let alighting = &input.stop_times[*alightings.next()];

                // a vehicle arriving after the label's time misses the
                // onward connection
                if alighting.arrival_time_seconds() > current_label.arrival_time {
                    continue;
                }
                // if this trip was already alighted at or past this stop, its
                // upstream stops are covered; equal sequences are covered too
                let scanned = state.scanned_sequence(alighting.unique_trip_id());
                if scanned.is_some_and(|sequence| alighting.stop_sequence() <= sequence) {
                    continue;
                }

                state.record_scan(alighting.unique_trip_id().clone(), alighting.stop_sequence());

                let trip_stop_times = DirectedSlice::new(
                    prepared.trip_service_stop_times(alighting.unique_trip_service_id()),
                    true,
                );
                // iteration runs backwards, so offsets are relative to the
                // trip's last delivered stop time
                let last_sequence = input.stop_times[*trip_stop_times.first()].stop_sequence();
                let start_offset = (last_sequence - alighting.stop_sequence() + 1) as usize;
                let count = match scanned {
                    // a prior scan alighted at `sequence` and covered
                    // everything before it; stop there (inclusive)
                    Some(sequence) => (alighting.stop_sequence() - sequence) as usize,
                    None => trip_stop_times.len(),
                };
                let mut upstream = trip_stop_times.sub_slice(start_offset, count);

                while upstream.has_next() {
                    let boarding = &input.stop_times[*upstream.next()];
                    let boarding_stop = boarding.unique_stop_id();

                    // an improvement is a later time: we pull the ride as
                    // close to the reference time as the chain allows
                    let improves = state
                        .label(boarding_stop)
                        .is_none_or(|existing| boarding.arrival_time_seconds() > existing.arrival_time);
                    if improves {
                        // the chain describes the path onwards from the
                        // boarding stop, so the new ride goes in front
                        let mut spans = Vec::with_capacity(current_label.spans.len() + 1);
                        spans.push(Span::Ride {
                            boarding_stop: boarding_stop.clone(),
                            alight_stop: marked_stop.clone(),
                            trip: ViaTrip {
                                trip_id: boarding.unique_trip_id().clone(),
                                trip_service_id: boarding.unique_trip_service_id().clone(),
                                boarding_sequence: boarding.stop_sequence(),
                                alight_sequence: alighting.stop_sequence(),
                            },
                            boarding_time: boarding.departure_time_seconds(),
                            alight_time: alighting.arrival_time_seconds(),
                        });
                        spans.extend(current_label.spans.iter().cloned());
                        let boarding_label = RoundSegment {
                            stop: boarding_stop.clone(),
                            arrival_time: boarding.arrival_time_seconds(),
                            spans,
                        };
                        state.store(boarding_label.clone());

                        // walking on from here is only allowed when hopping is
                        // on or this label was not itself reached by a walk
                        if input.allow_transfer_hopping || mark_source == MarkSource::Arrival {
                            relax_transfers(input, prepared, &mut state, &boarding_label, boarding);
                        }
                    }

                    state.mark_arrival(boarding_stop.clone());

                    if prepared.is_from_stop(boarding_stop) {
                        let segment = state
                            .label(boarding_stop)
                            .expect("an origin that was just scanned must have a label");
                        if journeys.offer(&segment.spans) {
                            trace!(target: LOG_TARGET, "journey found from {boarding_stop}");
                            // stops further upstream can only depart earlier
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

/// Prepends a walking span to the freshly improved label at `boarding` for
/// every transfer leaving its stop: whoever starts at the transfer's far side
/// can walk over and still catch this chain, as long as they leave
/// `minimum_transfer_time` earlier.
fn relax_transfers<ID, S, T, ST>(
    input: &SearchInput<ID, S, T, ST>,
    prepared: &PreparedInput<ID>,
    state: &mut SearchState<ID>,
    boarding_label: &RoundSegment<ID>,
    boarding: &ST,
) where
    ID: UniqueId,
    S: Stop<ID>,
    T: Transfer<ID>,
    ST: StopTime<ID>,
{
    let boarding_stop = boarding.unique_stop_id();

    for &transfer_index in prepared.transfers_from(boarding_stop) {
        let transfer = &input.transfers[transfer_index];
        let transfer_target = transfer.to_unique_stop_id();

        state.mark_transfer(transfer_target.clone());

        let transfer_departure = boarding.arrival_time_seconds()
            - i64::from(transfer.minimum_transfer_time_seconds());
        let improves = state
            .label(transfer_target)
            .is_none_or(|existing| transfer_departure > existing.arrival_time);
        if improves {
            let mut spans = Vec::with_capacity(boarding_label.spans.len() + 1);
            spans.push(Span::Transfer {
                start: transfer_target.clone(),
                end: boarding_stop.clone(),
                departure_time: transfer_departure,
                arrival_time: boarding.arrival_time_seconds(),
            });
            spans.extend(boarding_label.spans.iter().cloned());
            state.store(RoundSegment {
                stop: transfer_target.clone(),
                arrival_time: transfer_departure,
                spans,
            });
        }
    }
}

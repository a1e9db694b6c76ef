pub mod timetable;

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// A point in time, in seconds. Depending on the feed this is either seconds
/// since midnight of the service day or seconds since the Unix epoch. The
/// routing core only ever compares timestamps and takes differences, so the
/// base is entirely up to the caller.
pub type Timestamp = i64;

/// Identifiers that are globally unique across feeds.
///
/// Ingested GTFS ids are only guaranteed to be unique within one feed, but
/// routing operates on stops and stop times merged from multiple feeds, so
/// callers must re-key their entities first. Any ordered, hashable, printable
/// type works; the usual choices are u32/u64, i32/i64 and String.
pub trait UniqueId: Clone + Eq + Ord + Hash + Debug + Display {}

impl<T: Clone + Eq + Ord + Hash + Debug + Display> UniqueId for T {}

use chrono::{NaiveDate, NaiveDateTime};
use room_alloc_core::{Request, RequestId};

fn at(hour: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2025, 3, 1)?.and_hms_opt(hour, 0, 0)
}

/// A request classified as primary: known origin and a four hour stay
pub fn primary(id: u32) -> Request {
    Request::new(RequestId(id), at(8), at(12), Some("LHR".into()))
}

/// A request classified as secondary: no origin
pub fn secondary(id: u32) -> Request {
    Request::new(RequestId(id), at(8), at(12), None)
}

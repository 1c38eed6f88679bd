use serde::Serialize;
use serde_json::Value;
use time::{OffsetDateTime, Weekday};

/// Window within which "closing soon" and "opening soon" apply.
const SOON_WINDOW_MINUTES: i32 = 60;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoursBucket {
	Open,
	ClosingSoon,
	OpeningSoon,
	Closed,
}

/// Pure boolean checks over raw opening-hours metadata. The engine only
/// consumes these three; how the metadata is encoded is the evaluator's
/// business.
pub trait HoursEvaluator
where
	Self: Send + Sync,
{
	fn is_open(&self, hours: &Value, now: OffsetDateTime) -> bool;
	fn is_opening_soon(&self, hours: &Value, now: OffsetDateTime) -> bool;
	fn is_closing_soon(&self, hours: &Value, now: OffsetDateTime) -> bool;
}

pub fn bucket(evaluator: &dyn HoursEvaluator, hours: &Value, now: OffsetDateTime) -> HoursBucket {
	if evaluator.is_open(hours, now) {
		if evaluator.is_closing_soon(hours, now) {
			return HoursBucket::ClosingSoon;
		}

		return HoursBucket::Open;
	}
	if evaluator.is_opening_soon(hours, now) {
		return HoursBucket::OpeningSoon;
	}

	HoursBucket::Closed
}

/// Default evaluator over `{"mon": ["09:00-17:00", ...], ...}` metadata.
/// Ranges whose end precedes their start span midnight.
pub struct ScheduleEvaluator;

#[derive(Clone, Copy, Debug)]
struct MinuteRange {
	start: i32,
	end: i32,
}
impl MinuteRange {
	fn contains(&self, minute: i32) -> bool {
		if self.start <= self.end {
			minute >= self.start && minute < self.end
		} else {
			minute >= self.start || minute < self.end
		}
	}

	fn minutes_until_end(&self, minute: i32) -> i32 {
		if self.start <= self.end || minute >= self.start {
			(self.end - minute).rem_euclid(24 * 60)
		} else {
			self.end - minute
		}
	}

	fn minutes_until_start(&self, minute: i32) -> i32 {
		self.start - minute
	}
}

impl HoursEvaluator for ScheduleEvaluator {
	fn is_open(&self, hours: &Value, now: OffsetDateTime) -> bool {
		let minute = minute_of_day(now);

		day_ranges(hours, now.weekday()).iter().any(|range| range.contains(minute))
	}

	fn is_opening_soon(&self, hours: &Value, now: OffsetDateTime) -> bool {
		if self.is_open(hours, now) {
			return false;
		}

		let minute = minute_of_day(now);

		day_ranges(hours, now.weekday()).iter().any(|range| {
			let until = range.minutes_until_start(minute);

			until > 0 && until <= SOON_WINDOW_MINUTES
		})
	}

	fn is_closing_soon(&self, hours: &Value, now: OffsetDateTime) -> bool {
		let minute = minute_of_day(now);

		day_ranges(hours, now.weekday()).iter().any(|range| {
			if !range.contains(minute) {
				return false;
			}

			let until = range.minutes_until_end(minute);

			until > 0 && until <= SOON_WINDOW_MINUTES
		})
	}
}

fn minute_of_day(now: OffsetDateTime) -> i32 {
	now.hour() as i32 * 60 + now.minute() as i32
}

fn weekday_key(weekday: Weekday) -> &'static str {
	match weekday {
		Weekday::Monday => "mon",
		Weekday::Tuesday => "tue",
		Weekday::Wednesday => "wed",
		Weekday::Thursday => "thu",
		Weekday::Friday => "fri",
		Weekday::Saturday => "sat",
		Weekday::Sunday => "sun",
	}
}

fn day_ranges(hours: &Value, weekday: Weekday) -> Vec<MinuteRange> {
	let Some(entries) = hours.get(weekday_key(weekday)).and_then(Value::as_array) else {
		return Vec::new();
	};

	entries
		.iter()
		.filter_map(Value::as_str)
		.filter_map(parse_range)
		.collect()
}

fn parse_range(raw: &str) -> Option<MinuteRange> {
	let (start, end) = raw.split_once('-')?;
	let start = parse_minute(start.trim())?;
	let end = parse_minute(end.trim())?;

	Some(MinuteRange { start, end })
}

fn parse_minute(raw: &str) -> Option<i32> {
	let (hour, minute) = raw.split_once(':')?;
	let hour: i32 = hour.parse().ok()?;
	let minute: i32 = minute.parse().ok()?;

	if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
		return None;
	}

	Some(hour * 60 + minute)
}

#[cfg(test)]
mod tests {
	use serde_json::json;
	use time::macros::datetime;

	use super::*;

	fn weekday_hours() -> Value {
		json!({
			"mon": ["09:00-17:00"],
			"fri": ["18:00-02:00"],
		})
	}

	#[test]
	fn open_within_range() {
		// 2026-08-03 is a Monday.
		let now = datetime!(2026-08-03 12:00 UTC);

		assert_eq!(bucket(&ScheduleEvaluator, &weekday_hours(), now), HoursBucket::Open);
	}

	#[test]
	fn closed_outside_range() {
		let now = datetime!(2026-08-03 07:00 UTC);

		assert!(!ScheduleEvaluator.is_open(&weekday_hours(), now));
	}

	#[test]
	fn closing_soon_near_end_of_range() {
		let now = datetime!(2026-08-03 16:30 UTC);

		assert_eq!(bucket(&ScheduleEvaluator, &weekday_hours(), now), HoursBucket::ClosingSoon);
	}

	#[test]
	fn opening_soon_before_range() {
		let now = datetime!(2026-08-03 08:30 UTC);

		assert_eq!(bucket(&ScheduleEvaluator, &weekday_hours(), now), HoursBucket::OpeningSoon);
	}

	#[test]
	fn overnight_range_spans_midnight() {
		// 2026-08-07 is a Friday; 23:00 falls inside 18:00-02:00.
		let now = datetime!(2026-08-07 23:00 UTC);

		assert!(ScheduleEvaluator.is_open(&weekday_hours(), now));
	}

	#[test]
	fn missing_metadata_is_closed() {
		let now = datetime!(2026-08-03 12:00 UTC);

		assert_eq!(bucket(&ScheduleEvaluator, &Value::Null, now), HoursBucket::Closed);
	}
}

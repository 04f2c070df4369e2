use chrono::NaiveDateTime;

pub const MILLIS_IN_1_SEC: u64 = 1_000;
pub const SECS_IN_1_MIN: u64 = 60;

pub fn secs_f64_to_millis_f64(secs: f64) -> f64 {
    secs * MILLIS_IN_1_SEC as f64
}

pub const fn minutes_to_millis(minutes: u64) -> u64 {
    minutes * SECS_IN_1_MIN * MILLIS_IN_1_SEC
}

pub fn printable_date(date: NaiveDateTime) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[test]
fn printable_date_drops_sub_seconds() {
    let date = NaiveDateTime::parse_from_str("2025-01-01 10:05:01.123456", "%Y-%m-%d %H:%M:%S%.f")
        .unwrap();
    assert_eq!(printable_date(date), "2025-01-01 10:05:01");
}

#[test]
fn minutes_convert_to_millis() {
    assert_eq!(minutes_to_millis(5), 300_000);
}

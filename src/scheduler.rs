use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;

use crate::error::{BookingError, Result};

pub const DAY_NAMES: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

/// Current instant in the given timezone.
pub fn now(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

/// Parse a calendar date strictly as `YYYY-MM-DD`.
pub fn parse_fecha(fecha: &str) -> Result<NaiveDate> {
    // chrono accepts unpadded fields; the stored format does not.
    let b = fecha.as_bytes();
    let shaped = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shaped {
        return Err(BookingError::InvalidDateFormat);
    }
    NaiveDate::parse_from_str(fecha, "%Y-%m-%d").map_err(|_| BookingError::InvalidDateFormat)
}

pub fn format_fecha(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Weekday number with 0 = Monday, 6 = Sunday.
pub fn weekday_num(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Zero-padded ordinal used as the reservation partition key ("001".."366").
pub fn day_of_year_key(date: NaiveDate) -> String {
    format!("{:03}", date.ordinal())
}

/// ISO-8601 creation stamp with the timezone's offset.
/// RFC 3339 with the zone offset and a fraction that is always six digits.
pub fn iso_timestamp(at: &DateTime<Tz>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

pub fn day_name(weekday: u8) -> &'static str {
    DAY_NAMES.get(weekday as usize).copied().unwrap_or("?")
}

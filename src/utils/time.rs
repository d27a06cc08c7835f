use serde::Serializer;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Current time in the local offset, falling back to UTC when the offset
/// cannot be determined (e.g. in a multi-threaded process on some Unixes).
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Formats a time as `HH:MM:SS`.
pub fn clock(datetime: OffsetDateTime) -> String {
    datetime
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

/// The current wall-clock time as `HH:MM:SS`.
pub fn clock_now() -> String {
    clock(now())
}

/// Serialize an OffsetDateTime into an RFC 3339 formatted string
pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = datetime
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&s)
}

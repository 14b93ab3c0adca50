//! Serde helpers that write timestamps as unix milliseconds.
use std::time::SystemTime;

pub fn serialize<S>(time: &SystemTime, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_i64(crate::millis(*time))
}

pub mod option {
    use std::time::SystemTime;

    pub fn serialize<S>(time: &Option<SystemTime>, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match time {
            Some(t) => s.serialize_some(&crate::millis(*t)),
            None => s.serialize_none(),
        }
    }
}

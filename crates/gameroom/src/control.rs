use sm_core::*;

/// Clock settings written as `minutes+increment`, e.g. `5+3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeControl {
    minutes: u32,
    increment: u32,
}

impl TimeControl {
    pub fn new(minutes: u32, increment: u32) -> Result<Self, Error> {
        match (minutes, increment) {
            (1..=180, 0..=60) => Ok(Self { minutes, increment }),
            _ => Err(Error::invalid("time control must be 1-180 minutes plus 0-60 seconds")),
        }
    }
    pub fn minutes(&self) -> u32 {
        self.minutes
    }
    pub fn increment(&self) -> u32 {
        self.increment
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self {
            minutes: 10,
            increment: 0,
        }
    }
}

impl std::fmt::Display for TimeControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.minutes, self.increment)
    }
}

impl std::str::FromStr for TimeControl {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || Error::invalid(format!("malformed time control {:?}", s));
        let (minutes, increment) = s.trim().split_once('+').unwrap_or((s.trim(), "0"));
        Self::new(
            minutes.trim().parse().map_err(|_| bad())?,
            increment.trim().parse().map_err(|_| bad())?,
        )
    }
}

impl serde::Serialize for TimeControl {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for TimeControl {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        String::deserialize(d)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: i64 = 1_000_000_000;
/// Decimal places carried by an [`Amount`].
const SCALE: usize = 9;

/// Fixed-point SOL amount, stored as whole lamports.
///
/// Parsed from and rendered to decimal strings ("0.3", "1.25") so the
/// wire never carries floating point. Balances, wagers, entry fees and
/// prize pools all use this type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub const fn lamports(n: i64) -> Self {
        Self(n)
    }
    pub const fn inner(self) -> i64 {
        self.0
    }
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
    pub fn checked_mul(self, n: i64) -> Option<Self> {
        self.0.checked_mul(n).map(Self)
    }
}

impl From<i64> for Amount {
    fn from(n: i64) -> Self {
        Self(n)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / LAMPORTS_PER_SOL as u64;
        let frac = abs % LAMPORTS_PER_SOL as u64;
        match frac {
            0 => write!(f, "{}{}", sign, whole),
            _ => {
                let digits = format!("{:0width$}", frac, width = SCALE);
                write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
            }
        }
    }
}

impl std::str::FromStr for Amount {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("invalid amount: {:?}", s);
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > SCALE {
            return Err(format!("amount {:?} exceeds {} decimal places", s, SCALE));
        }
        let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if !digits(whole) || !digits(frac) {
            return Err(invalid());
        }
        let whole = match whole {
            "" => 0,
            w => w.parse::<i64>().map_err(|_| invalid())?,
        };
        let frac = match frac {
            "" => 0,
            f => format!("{:0<width$}", f, width = SCALE)
                .parse::<i64>()
                .map_err(|_| invalid())?,
        };
        whole
            .checked_mul(LAMPORTS_PER_SOL)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl serde::Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = Amount;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a decimal SOL amount")
            }
            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse().map_err(E::custom)
            }
            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Amount, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(|v| v.checked_mul(LAMPORTS_PER_SOL))
                    .map(Amount)
                    .ok_or_else(|| E::custom("amount out of range"))
            }
            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Amount, E> {
                match v {
                    v if v < 0 => Err(E::custom("amount must not be negative")),
                    v => self.visit_u64(v as u64),
                }
            }
            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Amount, E> {
                self.visit_str(&v.to_string())
            }
        }
        deserializer.deserialize_any(Visitor)
    }
}

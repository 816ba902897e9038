use std::fmt;
use std::str::FromStr;

use bytesize::ByteSize;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use snafu::Snafu;

/// Threshold after which the output buffer hands a batch downstream.
///
/// Either a record count or a cumulative byte size, chosen at construction
/// and mutually exclusive. In configuration files a bare integer means a
/// count and a size string like `"500mb"` means bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSizeConfig {
    /// Flush after this many records.
    Count(usize),
    /// Flush once the accumulated record sizes reach this many bytes.
    Bytes(ByteSize),
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum BatchSizeConfigError {
    #[snafu(display("batch size must be greater than zero"))]
    ZeroBatchSize,
    #[snafu(display("'{value}' is neither a record count nor a byte size with a known unit"))]
    Unparseable { value: String },
}

pub type Result<T, E = BatchSizeConfigError> = std::result::Result<T, E>;

impl BatchSizeConfig {
    pub fn count(count: usize) -> Result<Self> {
        if count == 0 {
            return ZeroBatchSizeSnafu.fail();
        }
        Ok(Self::Count(count))
    }

    pub fn bytes(size: ByteSize) -> Result<Self> {
        if size.as_u64() == 0 {
            return ZeroBatchSizeSnafu.fail();
        }
        Ok(Self::Bytes(size))
    }

    /// Whether an accumulation of `records` records totalling `bytes` bytes
    /// has reached this threshold.
    pub fn threshold_reached(&self, records: usize, bytes: u64) -> bool {
        match self {
            Self::Count(count) => records >= *count,
            Self::Bytes(size) => bytes >= size.as_u64(),
        }
    }
}

impl FromStr for BatchSizeConfig {
    type Err = BatchSizeConfigError;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();

        if let Ok(count) = value.parse::<usize>() {
            return Self::count(count);
        }

        match value.parse::<ByteSize>() {
            Ok(size) => Self::bytes(size),
            Err(_) => UnparseableSnafu { value }.fail(),
        }
    }
}

impl fmt::Display for BatchSizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(count) => write!(f, "{count}"),
            Self::Bytes(size) => write!(f, "{size}"),
        }
    }
}

impl Serialize for BatchSizeConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Count(count) => serializer.serialize_u64(*count as u64),
            Self::Bytes(size) => serializer.serialize_str(&size.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for BatchSizeConfig {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        struct ConfigVisitor;

        impl<'de> de::Visitor<'de> for ConfigVisitor {
            type Value = BatchSizeConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a record count or a byte size string like \"500mb\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Self::Value, E> {
                BatchSizeConfig::count(value as usize).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Self::Value, E> {
                let count = usize::try_from(value).map_err(E::custom)?;
                BatchSizeConfig::count(count).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Self::Value, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ConfigVisitor)
    }
}

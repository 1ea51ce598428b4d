use std::{fmt::Formatter, marker::PhantomData};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
    de::{Error, MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::{ops::Interval, series::Point};

/// Ordered timestamp-to-power samples, (de)serialized as a map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Samples(pub Vec<Point>);

impl Samples {
    /// Interval spanned by the samples, each covering one sampling interval.
    ///
    /// Empty samples span an empty interval at the Unix epoch.
    pub fn interval(&self, sampling: TimeDelta) -> Interval {
        match (self.0.first(), self.0.last()) {
            (Some((first, _)), Some((last, _))) => Interval::new(*first, *last + sampling),
            _ => {
                let epoch = DateTime::<Utc>::UNIX_EPOCH;
                Interval::new(epoch, epoch)
            }
        }
    }

    fn first_unsorted(&self) -> Option<(usize, DateTime<Utc>)> {
        self.0
            .windows(2)
            .position(|pair| pair[0].0 >= pair[1].0)
            .map(|index| (index + 1, self.0[index + 1].0))
    }
}

impl Serialize for Samples {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut serialize_map = serializer.serialize_map(Some(self.0.len()))?;
        for (timestamp, power) in &self.0 {
            serialize_map.serialize_entry(timestamp, power)?;
        }
        serialize_map.end()
    }
}

impl<'de> Deserialize<'de> for Samples {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        /// Deserializes samples from a map.
        struct SamplesVisitor(PhantomData<Point>);

        impl<'de> Visitor<'de> for SamplesVisitor {
            type Value = Vec<Point>;

            fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
                write!(formatter, "an ordered map of timestamps to power values")
            }

            fn visit_map<MA: MapAccess<'de>>(
                self,
                mut map_access: MA,
            ) -> Result<Self::Value, MA::Error> {
                let mut inner = Vec::with_capacity(map_access.size_hint().unwrap_or_default());
                while let Some(entry) = map_access.next_entry()? {
                    inner.push(entry);
                }
                Ok(inner)
            }
        }

        let this = Self(deserializer.deserialize_map(SamplesVisitor(PhantomData))?);
        match this.first_unsorted() {
            None => Ok(this),
            Some((index, timestamp)) => Err(D::Error::custom(format!(
                "the map is not strictly increasing at #{index} ({timestamp})"
            ))),
        }
    }
}

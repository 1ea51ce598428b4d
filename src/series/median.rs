use std::ops::{Add, Div};

use itertools::Itertools;

impl<T> Median for T where T: ?Sized {}

pub trait Median {
    /// Median of the values, averaging the two middle values for an even count.
    #[must_use]
    fn median<V>(self) -> Option<V>
    where
        Self: Sized + Iterator<Item = V>,
        V: Copy + Ord + Add<Output = V> + Div<f64, Output = V>,
    {
        let values = self.sorted_unstable().collect_vec();
        if values.is_empty() {
            None
        } else {
            let index = values.len() / 2;
            if values.len() % 2 == 1 {
                Some(values[index])
            } else {
                Some((values[index - 1] + values[index]) / 2.0)
            }
        }
    }
}

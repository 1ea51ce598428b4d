use std::{
    fmt::{Debug, Display, Formatter},
    ops::Div,
};

use chrono::TimeDelta;

use crate::quantity::{Quantity, power::Kilowatts};

pub type KilowattHours = Quantity<1, 1>;

impl Display for KilowattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} kWh", self.0)
    }
}

impl Debug for KilowattHours {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}Wh", self.0 * 1000.0)
    }
}

impl Div<TimeDelta> for KilowattHours {
    type Output = Option<Kilowatts>;

    /// Average power over the time span, or [`None`] for an empty span.
    fn div(self, rhs: TimeDelta) -> Self::Output {
        let hours = rhs.as_seconds_f64() / 3600.0;
        (hours > 0.0).then(|| Quantity(self.0 / hours))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_div_time_delta() {
        let power = (KilowattHours::from(11.0) / TimeDelta::hours(2)).unwrap();
        assert_abs_diff_eq!(power.0, 5.5);
    }

    #[test]
    fn test_div_zero_time_delta() {
        assert!((KilowattHours::from(1.0) / TimeDelta::zero()).is_none());
    }
}

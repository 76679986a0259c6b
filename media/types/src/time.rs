/*!
    Timestamp and time base types.
*/

/**
    A rational number, used for stream time bases.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// Microsecond time base, the unit of `VideoFrame::ts_us`.
    pub const MICROS: Self = Self::new(1, 1_000_000);

    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        self.num as f64 / self.den as f64
    }

    /**
        Rescale a timestamp expressed in this time base to microseconds.

        Uses 128-bit intermediates so large timestamps do not overflow.
        A zero denominator yields zero.
    */
    pub fn rescale_to_micros(self, value: i64) -> i64 {
        if self.den == 0 {
            return 0;
        }
        let scaled = value as i128 * self.num as i128 * 1_000_000;
        (scaled / self.den as i128) as i64
    }
}

/**
    Presentation or decode timestamp in stream time base units.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

/**
    Packet duration in stream time base units.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MediaDuration(pub i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_millisecond_time_base() {
        // WebM streams use a 1/1000 time base
        let tb = Rational::new(1, 1000);
        assert_eq!(tb.rescale_to_micros(0), 0);
        assert_eq!(tb.rescale_to_micros(33), 33_000);
        assert_eq!(tb.rescale_to_micros(-5), -5_000);
    }

    #[test]
    fn rescale_frame_rate_time_base() {
        let tb = Rational::new(1, 16);
        assert_eq!(tb.rescale_to_micros(3), 187_500);
    }

    #[test]
    fn zero_denominator_is_harmless() {
        let tb = Rational::new(1, 0);
        assert_eq!(tb.to_f64(), 0.0);
        assert_eq!(tb.rescale_to_micros(42), 0);
    }
}

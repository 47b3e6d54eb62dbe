//! Star ratings for reviews.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RatingError {
    /// The input is not a number.
    #[error("rating must be a number")]
    NotANumber,
    /// The input is outside `0.0..=5.0`.
    #[error("rating must be between 0 and {max}")]
    OutOfRange {
        /// Maximum allowed value.
        max: u8,
    },
}

/// A star rating between 0 and 5 with one decimal place.
///
/// Stored as tenths of a star so equality and ordering are exact.
/// Serializes to and from a JSON number (`3.5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rating(u8);

impl Rating {
    /// Number of stars in the widget.
    pub const MAX_STARS: u8 = 5;

    const MAX_TENTHS: u8 = Self::MAX_STARS * 10;

    /// Build a rating from a floating point star count, rounded to one decimal.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite or falls outside `0..=5`.
    pub fn from_stars(stars: f64) -> Result<Self, RatingError> {
        if !stars.is_finite() {
            return Err(RatingError::NotANumber);
        }
        let tenths = (stars * 10.0).round();
        if !(0.0..=f64::from(Self::MAX_TENTHS)).contains(&tenths) {
            return Err(RatingError::OutOfRange {
                max: Self::MAX_STARS,
            });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
        Ok(Self(tenths as u8))
    }

    /// Parse a rating from form input such as `"4.5"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a number in `0..=5`.
    pub fn parse(s: &str) -> Result<Self, RatingError> {
        let stars = s
            .trim()
            .parse::<f64>()
            .map_err(|_| RatingError::NotANumber)?;
        Self::from_stars(stars)
    }

    /// The rating as a star count.
    #[must_use]
    pub fn stars(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// The rating in tenths of a star.
    #[must_use]
    pub const fn tenths(self) -> u8 {
        self.0
    }

    /// A zero rating means no star was selected.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Fill percentage (0-100) for each of the five stars.
    ///
    /// Star `i` is filled by `clamp(rating - i, 0, 1)`.
    #[must_use]
    pub fn star_fills(self) -> Vec<u8> {
        (0..Self::MAX_STARS)
            .map(|idx| {
                let tenths = i16::from(self.0) - i16::from(idx) * 10;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped
                let fill = (tenths.clamp(0, 10) * 10) as u8;
                fill
            })
            .collect()
    }
}

impl core::fmt::Display for Rating {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.stars())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stars = f64::deserialize(deserializer)?;
        Self::from_stars(stars).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rounds_to_one_decimal() {
        assert_eq!(Rating::parse("3.74").unwrap().tenths(), 37);
        assert_eq!(Rating::parse("3.75").unwrap().tenths(), 38);
        assert_eq!(Rating::parse("5").unwrap().tenths(), 50);
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert_eq!(
            Rating::parse("5.1"),
            Err(RatingError::OutOfRange { max: 5 })
        );
        assert!(Rating::parse("-0.5").is_err());
        assert_eq!(Rating::parse("lots"), Err(RatingError::NotANumber));
        assert_eq!(Rating::parse("NaN"), Err(RatingError::NotANumber));
    }

    #[test]
    fn test_display() {
        assert_eq!(Rating::parse("4").unwrap().to_string(), "4.0");
        assert_eq!(Rating::parse("0.3").unwrap().to_string(), "0.3");
    }

    #[test]
    fn test_star_fills_partial_star() {
        let rating = Rating::parse("3.4").unwrap();
        assert_eq!(rating.star_fills(), vec![100, 100, 100, 40, 0]);
    }

    #[test]
    fn test_star_fills_zero_and_full() {
        assert_eq!(Rating::default().star_fills(), vec![0; 5]);
        assert_eq!(Rating::parse("5").unwrap().star_fills(), vec![100; 5]);
    }

    #[test]
    fn test_serde_as_number() {
        let rating = Rating::parse("4.5").unwrap();
        assert_eq!(serde_json::to_string(&rating).unwrap(), "4.5");

        let back: Rating = serde_json::from_str("4.5").unwrap();
        assert_eq!(back, rating);

        assert!(serde_json::from_str::<Rating>("9").is_err());
    }
}

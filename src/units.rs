//! Physical-unit conversions shared by the source parsers.
//!
//! Upstreams report SI units (°C, m/s, meters); the report uses the units the
//! dashboard displays (°F, knots, feet), each rounded to one decimal place
//! with standard half-away-from-zero rounding.

/// The 16-point compass rose, clockwise from north.
const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Round to one decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Celsius to Fahrenheit.
pub fn c_to_f(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Meters per second to knots.
pub fn ms_to_knots(ms: f64) -> f64 {
    ms * 1.94384
}

/// Meters to feet.
pub fn m_to_ft(meters: f64) -> f64 {
    meters * 3.28084
}

/// Convert wind direction degrees to one of the 16 compass points.
///
/// Sector boundaries fall halfway between points (11.25°, 33.75°, ...);
/// boundary ties resolve to the even sector so that both edges of north
/// (348.75° and 11.25°) map to "N".
pub fn deg_to_cardinal(deg: f64) -> &'static str {
    let sector = (deg.rem_euclid(360.0) / 22.5).round_ties_even() as usize % 16;
    COMPASS_POINTS[sector]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compass_cardinal_directions() {
        assert_eq!(deg_to_cardinal(0.0), "N");
        assert_eq!(deg_to_cardinal(90.0), "E");
        assert_eq!(deg_to_cardinal(180.0), "S");
        assert_eq!(deg_to_cardinal(270.0), "W");
    }

    #[test]
    fn compass_boundaries_resolve_to_north() {
        assert_eq!(deg_to_cardinal(11.25), "N");
        assert_eq!(deg_to_cardinal(348.75), "N");
        assert_eq!(deg_to_cardinal(360.0), "N");
        assert_eq!(deg_to_cardinal(-10.0), "N");
    }

    #[test]
    fn compass_intermediate_points() {
        assert_eq!(deg_to_cardinal(22.5), "NNE");
        assert_eq!(deg_to_cardinal(45.0), "NE");
        assert_eq!(deg_to_cardinal(202.5), "SSW");
        assert_eq!(deg_to_cardinal(337.5), "NNW");
    }

    #[test]
    fn temperature_conversion() {
        assert_eq!(round1(c_to_f(0.0)), 32.0);
        assert_eq!(round1(c_to_f(100.0)), 212.0);
        assert_eq!(round1(c_to_f(21.3)), 70.3);
    }

    #[test]
    fn speed_conversion() {
        assert_eq!(round1(ms_to_knots(5.0)), 9.7);
        assert_eq!(round1(ms_to_knots(0.0)), 0.0);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round1(2.25), 2.3);
        assert_eq!(round1(-2.25), -2.3);
        assert_eq!(round1(2.24), 2.2);
    }
}

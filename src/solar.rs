//! Sunrise/sunset from a simplified solar-position method
//! (Almanac for Computers, USNO 1990).
//!
//! Pure math, no network or ephemeris tables. Accuracy is within a couple of
//! minutes at mid latitudes, which is plenty for a conditions dashboard.
//! All trigonometric work happens in radians internally; the published
//! formulas are stated in degrees, so thin degree-flavored wrappers keep the
//! implementation readable against the reference.

use crate::SolarTimes;
use chrono::{Datelike, NaiveDate};

/// Zenith offset in degrees: 90° plus atmospheric refraction and the solar
/// disk radius.
const ZENITH: f64 = 90.833;

#[derive(Clone, Copy)]
enum Event {
    Sunrise,
    Sunset,
}

/// Compute local sunrise/sunset for a point and date.
///
/// `utc_offset_minutes` is the local display clock's offset from UTC. Both
/// fields are `None` when the sun never crosses the horizon on that date at
/// that latitude (polar day/night). Results are truncated to whole minutes.
pub fn solar_times(
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
    utc_offset_minutes: i32,
) -> SolarTimes {
    let sunrise = event_time(latitude, longitude, date, utc_offset_minutes, Event::Sunrise);
    let sunset = event_time(latitude, longitude, date, utc_offset_minutes, Event::Sunset);

    // A date without a horizon crossing has neither event.
    match (sunrise, sunset) {
        (Some(sunrise), Some(sunset)) => SolarTimes {
            sunrise: Some(sunrise),
            sunset: Some(sunset),
        },
        _ => SolarTimes {
            sunrise: None,
            sunset: None,
        },
    }
}

fn event_time(
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
    utc_offset_minutes: i32,
    event: Event,
) -> Option<String> {
    // 1. Day of year and approximate event time in fractional days.
    let n = date.ordinal() as f64;
    let lng_hour = longitude / 15.0;
    let t = match event {
        Event::Sunrise => n + (6.0 - lng_hour) / 24.0,
        Event::Sunset => n + (18.0 - lng_hour) / 24.0,
    };

    // 2. Sun's mean anomaly.
    let m = 0.9856 * t - 3.289;

    // 3. True ecliptic longitude.
    let l = norm360(m + 1.916 * sin_d(m) + 0.020 * sin_d(2.0 * m) + 282.634);

    // 4. Right ascension, corrected into the same 90° quadrant as L, in hours.
    let mut ra = norm360(atan_d(0.91764 * tan_d(l)));
    let l_quadrant = (l / 90.0).floor() * 90.0;
    let ra_quadrant = (ra / 90.0).floor() * 90.0;
    ra = (ra + (l_quadrant - ra_quadrant)) / 15.0;

    // 5. Declination and local hour angle.
    let sin_dec = 0.39782 * sin_d(l);
    let cos_dec = cos_d(asin_d(sin_dec));
    let cos_h = (cos_d(ZENITH) - sin_dec * sin_d(latitude)) / (cos_dec * cos_d(latitude));

    // 6. Polar day/night: the sun never reaches the zenith threshold.
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }

    // 7. Hour angle -> local mean time -> UTC -> local clock.
    let h = match event {
        Event::Sunrise => 360.0 - acos_d(cos_h),
        Event::Sunset => acos_d(cos_h),
    } / 15.0;
    let local_mean = h + ra - 0.06571 * t - 6.622;
    let ut = (local_mean - lng_hour).rem_euclid(24.0);
    let local = (ut + utc_offset_minutes as f64 / 60.0).rem_euclid(24.0);

    // Truncate to whole minutes.
    let total_minutes = (local * 60.0).floor() as u32;
    Some(format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60))
}

// Degree-flavored trig wrappers matching the reference formulas.

fn norm360(v: f64) -> f64 {
    v.rem_euclid(360.0)
}

fn sin_d(deg: f64) -> f64 {
    deg.to_radians().sin()
}

fn cos_d(deg: f64) -> f64 {
    deg.to_radians().cos()
}

fn tan_d(deg: f64) -> f64 {
    deg.to_radians().tan()
}

fn asin_d(v: f64) -> f64 {
    v.asin().to_degrees()
}

fn acos_d(v: f64) -> f64 {
    v.acos().to_degrees()
}

fn atan_d(v: f64) -> f64 {
    v.atan().to_degrees()
}

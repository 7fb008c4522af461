//! Geometry helpers for map renderers.
//!
//! Nothing here talks to a directions service: callers get the stop order,
//! straight-line distances, and decoded polylines they can draw directly.

use crate::error::{Error, Result};
use crate::route::{DeliveryPoint, Location};

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Precision factor of the encoded polyline format (5 decimal places).
const POLYLINE_PRECISION: f64 = 1e5;

/// Great-circle distance between two locations in metres.
#[must_use]
pub fn distance_meters(from: Location, to: Location) -> f64 {
    let phi1 = from.latitude.to_radians();
    let phi2 = to.latitude.to_radians();
    let d_phi = (to.latitude - from.latitude).to_radians();
    let d_lambda = (to.longitude - from.longitude).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Render a distance for display: whole metres below 1 km, tenths of a km above.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round())
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Index of the point closest to `location`.
///
/// Uses planar distance in degrees, which is enough to pick a neighbour
/// within a city-sized route.
#[must_use]
pub fn nearest_point_index(points: &[&DeliveryPoint], location: Location) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let d_lat = point.location.latitude - location.latitude;
            let d_lon = point.location.longitude - location.longitude;
            (index, d_lat.hypot(d_lon))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

/// Stops in visiting order, starting from the one nearest to `current`.
///
/// Only points with a non-zero order number take part. The planned order is kept as
/// a cycle: when the courier is closest to stop k, the sequence becomes
/// k, k+1, ..., n, 1, ..., k-1. Fewer than two ordered stops yield nothing
/// to draw.
#[must_use]
pub fn ordered_stops(points: &[DeliveryPoint], current: Option<Location>) -> Vec<&DeliveryPoint> {
    let order = |p: &DeliveryPoint| p.order_number.unwrap_or_default();
    let mut ordered: Vec<&DeliveryPoint> = points
        .iter()
        .filter(|p| p.order_number.is_some_and(|n| n.abs() > 0.0))
        .collect();
    ordered.sort_by(|a, b| order(*a).total_cmp(&order(*b)));

    if ordered.len() < 2 {
        return Vec::new();
    }

    if let Some(location) = current {
        if let Some(closest) = nearest_point_index(&ordered, location) {
            ordered.rotate_left(closest);
        }
    }
    ordered
}

/// Straight-line path through the ordered stops.
///
/// This is what the map draws when no road geometry is available; the
/// `route path` command totals its legs.
#[must_use]
pub fn route_path(points: &[DeliveryPoint], current: Option<Location>) -> Vec<Location> {
    ordered_stops(points, current)
        .into_iter()
        .map(|p| p.location)
        .collect()
}

/// Decode a polyline in the encoded polyline algorithm format.
///
/// Library API for map renderers that receive road geometry from a
/// directions service; the CLI itself only draws straight lines.
///
/// # Errors
///
/// Returns [`Error::InvalidPolyline`] if the input ends in the middle of a
/// coordinate or contains bytes outside the encoding alphabet (`?` to `~`).
pub fn decode_polyline(encoded: &str) -> Result<Vec<Location>> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut path = Vec::new();

    while index < bytes.len() {
        lat += next_delta(bytes, &mut index)?;
        lng += next_delta(bytes, &mut index)?;

        #[allow(clippy::cast_precision_loss)]
        path.push(Location::new(
            lat as f64 / POLYLINE_PRECISION,
            lng as f64 / POLYLINE_PRECISION,
        ));
    }

    Ok(path)
}

/// Read one zig-zag encoded varint starting at `index`.
fn next_delta(bytes: &[u8], index: &mut usize) -> Result<i64> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes
            .get(*index)
            .ok_or(Error::InvalidPolyline { position: *index })?;
        let chunk = Some(byte)
            .filter(|b| (b'?'..=b'~').contains(b) && shift < 35)
            .map(|b| b - b'?')
            .ok_or(Error::InvalidPolyline { position: *index })?;
        *index += 1;

        result |= i64::from(chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 0 {
        result >> 1
    } else {
        !(result >> 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{DeliveryStatus, DeliveryType};

    fn point(id: &str, order: Option<u32>, latitude: f64, longitude: f64) -> DeliveryPoint {
        DeliveryPoint {
            id: id.to_string(),
            kind: DeliveryType::Delivery,
            address: String::new(),
            location: Location::new(latitude, longitude),
            recipient_name: String::new(),
            recipient_phone: None,
            package_id: String::new(),
            package_description: None,
            notes: None,
            status: DeliveryStatus::Pending,
            estimated_time: None,
            order_number: order.map(f64::from),
            special_instructions: None,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_distance_one_degree_of_longitude_at_equator() {
        let d = distance_meters(Location::new(0.0, 0.0), Location::new(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        let here = Location::new(49.82, 19.04);
        assert!(distance_meters(here, here).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance_within_city() {
        let gallery = Location::new(49.820_472, 19.039_027);
        let office = Location::new(49.828_133, 19.053_366);
        let d = distance_meters(gallery, office);
        assert!((1_200.0..1_400.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(1_000.0), "1.0 km");
        assert_eq!(format_distance(28_000.0), "28.0 km");
        assert_eq!(format_distance(1_549.0), "1.5 km");
    }

    #[test]
    fn test_ordered_stops_sorts_by_order_number() {
        let points = vec![
            point("c", Some(3), 0.0, 3.0),
            point("a", Some(1), 0.0, 1.0),
            point("x", None, 0.0, 9.0),
            point("b", Some(2), 0.0, 2.0),
        ];
        let ids: Vec<_> = ordered_stops(&points, None).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_ordered_stops_skips_order_number_zero() {
        let points = vec![
            point("b", Some(2), 0.0, 2.0),
            point("z", Some(0), 0.0, 0.0),
            point("a", Some(1), 0.0, 1.0),
        ];
        let ids: Vec<_> = ordered_stops(&points, None).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_ordered_stops_requires_two_stops() {
        let points = vec![point("a", Some(1), 0.0, 1.0), point("x", None, 0.0, 2.0)];
        assert!(ordered_stops(&points, None).is_empty());
        assert!(route_path(&points, Some(Location::new(0.0, 1.0))).is_empty());
    }

    #[test]
    fn test_ordered_stops_rotates_to_nearest() {
        let points = vec![
            point("a", Some(1), 0.0, 1.0),
            point("b", Some(2), 0.0, 2.0),
            point("c", Some(3), 0.0, 3.0),
            point("d", Some(4), 0.0, 4.0),
        ];
        let ids: Vec<_> = ordered_stops(&points, Some(Location::new(0.0, 2.9)))
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn test_ordered_stops_nearest_first_is_unchanged() {
        let points = vec![point("a", Some(1), 0.0, 1.0), point("b", Some(2), 0.0, 2.0)];
        let path = route_path(&points, Some(Location::new(0.0, 0.5)));
        assert_eq!(path, vec![Location::new(0.0, 1.0), Location::new(0.0, 2.0)]);
    }

    #[test]
    fn test_nearest_point_index_empty() {
        assert_eq!(nearest_point_index(&[], Location::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_decode_polyline_reference_example() {
        let path = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(path.len(), 3);
        assert_close(path[0].latitude, 38.5);
        assert_close(path[0].longitude, -120.2);
        assert_close(path[1].latitude, 40.7);
        assert_close(path[1].longitude, -120.95);
        assert_close(path[2].latitude, 43.252);
        assert_close(path[2].longitude, -126.453);
    }

    #[test]
    fn test_decode_polyline_empty() {
        assert!(decode_polyline("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_polyline_truncated() {
        // Latitude present, longitude missing.
        let err = decode_polyline("_p~iF").unwrap_err();
        assert!(matches!(err, Error::InvalidPolyline { position: 5 }));
    }

    #[test]
    fn test_decode_polyline_rejects_bytes_below_alphabet() {
        let err = decode_polyline("_p~iF ").unwrap_err();
        assert!(matches!(err, Error::InvalidPolyline { .. }));
    }

    #[test]
    fn test_decode_polyline_rejects_bytes_above_alphabet() {
        let err = decode_polyline("_p~iF\u{7f}").unwrap_err();
        assert!(matches!(err, Error::InvalidPolyline { position: 5 }));

        let err = decode_polyline("_p~iFé").unwrap_err();
        assert!(matches!(err, Error::InvalidPolyline { position: 5 }));
    }
}

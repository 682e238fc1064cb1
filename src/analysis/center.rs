/// Map center calculation.
///
/// The center is the plain unweighted mean of latitudes and of longitudes,
/// in degrees, over every bucketed coordinate. No projection correction and
/// no outlier rejection: it only frames the initial view.

use crate::analysis::grouping::GroupedObservations;
use crate::model::{MapCenter, MapError};

/// Returns the centroid of all classified coordinates.
///
/// Fails with `MapError::NoData` when every bucket is empty, so that no page
/// is ever rendered around an undefined center.
pub fn compute_center(grouped: &GroupedObservations) -> Result<MapCenter, MapError> {
    let mut count = 0usize;
    let mut lat_mean = 0.0f64;
    let mut lng_mean = 0.0f64;

    // Running mean: each term is scaled by 1/n before it is added, so finite
    // inputs near f64::MAX cannot overflow the way a plain sum does.
    for c in grouped.all_coordinates() {
        count += 1;
        let n = count as f64;
        lat_mean += c.latitude / n - lat_mean / n;
        lng_mean += c.longitude / n - lng_mean / n;
    }

    if count == 0 {
        return Err(MapError::NoData);
    }
    if !lat_mean.is_finite() || !lng_mean.is_finite() {
        return Err(MapError::Render(format!(
            "map center ({}, {}) is not a finite point",
            lat_mean, lng_mean
        )));
    }

    Ok(MapCenter {
        latitude: lat_mean,
        longitude: lng_mean,
    })
}

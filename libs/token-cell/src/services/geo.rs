use crate::TokenError;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points given in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Returns the distance when the patient is inside the radius.
pub fn check_arrival(
    patient: (f64, f64),
    clinic: (f64, f64),
    radius_km: f64,
) -> Result<f64, TokenError> {
    let distance_km = haversine_km(patient.0, patient.1, clinic.0, clinic.1);
    if distance_km > radius_km {
        return Err(TokenError::TooFar { distance_km, radius_km });
    }
    Ok(distance_km)
}

/// Label used when an address carries nothing usable.
pub const UNKNOWN_DISTRICT: &str = "Unknown District";

/// Best-effort district (suburb) for an address in `city`.
///
/// Addresses from the places API read like `"12 Main Rd, Sea Point, Cape Town, 8005"`.
/// The district is the segment just before the first segment naming the
/// city. An address without the city, or one that names it first, has no
/// known district.
#[must_use]
pub fn extract_district(address: &str, city: &str) -> String {
    let city_lower = city.trim().to_lowercase();
    if city_lower.is_empty() {
        return UNKNOWN_DISTRICT.to_owned();
    }

    let parts: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    match parts
        .iter()
        .position(|p| p.to_lowercase().contains(&city_lower))
    {
        Some(idx) if idx > 0 => parts[idx - 1].to_owned(),
        _ => UNKNOWN_DISTRICT.to_owned(),
    }
}

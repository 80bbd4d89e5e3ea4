//! Conversion between real-world distances and database units.
//!
//! The database stores distances as fixed-point integers at one
//! nanometer per unit. When the technology defines a manufacturing
//! grid, real-world distances snap to the nearest grid multiple on the
//! way in. Both conversions are pure; the grid value comes from
//! [`Database::manufacturing_grid`](crate::db::Database::manufacturing_grid).

/// A distance in database units (one nanometer per unit).
pub type Dbu = i64;

/// The number of database units per meter.
pub const DBU_PER_METER: f64 = 1e9;

/// Converts a distance in meters to database units.
///
/// With a manufacturing grid, the result is the nearest grid multiple
/// (round-to-nearest on the quotient); without one, the distance
/// rounds to the nearest unit.
///
/// # Examples
///
/// ```
/// use netlist2db::units::meters_to_dbu;
///
/// assert_eq!(meters_to_dbu(0.0000015, None), 1500);
/// assert_eq!(meters_to_dbu(0.0000015, Some(10)), 1500);
/// assert_eq!(meters_to_dbu(0.0000015, Some(7)), 1498);
/// ```
pub fn meters_to_dbu(dist: f64, grid: Option<u32>) -> Dbu {
    match grid {
        Some(grid) => {
            let grid = f64::from(grid);
            ((dist * DBU_PER_METER / grid).round() * grid).round() as Dbu
        }
        None => (dist * DBU_PER_METER).round() as Dbu,
    }
}

/// Converts a distance in database units to meters.
///
/// No rounding is applied; integer input is already unit-precise.
///
/// # Examples
///
/// ```
/// use netlist2db::units::{dbu_to_meters, meters_to_dbu};
///
/// assert_eq!(meters_to_dbu(dbu_to_meters(1500), None), 1500);
/// ```
pub fn dbu_to_meters(dist: Dbu) -> f64 {
    dist as f64 / DBU_PER_METER
}

//! Region masks from polygons, drawn either in grid index space or in longitude/latitude.
//!
//! Masks are (row, column) fields with 1 inside a region and 0 outside. Filling can be
//! additive, which counts how many polygons cover a cell.

use geo::{Contains, Coord, Intersects, LineString, Point, Polygon};

use crate::errors::{DiagnosticsError, Result};
use crate::field::{nanmean, ArrND, Field};
use crate::grid::{check_shape, DIMS_2D};

fn polygon(xs: &[f64], ys: &[f64]) -> Result<Polygon<f64>> {
    if xs.len() != ys.len() {
        return Err(DiagnosticsError::DataLength {
            expected: xs.len(),
            found: ys.len(),
        });
    }
    let ring: Vec<Coord<f64>> = xs.iter().zip(ys).map(|(&x, &y)| Coord { x, y }).collect();
    Ok(Polygon::new(LineString::from(ring), vec![]))
}

fn fill_where<F>(mask: &ArrND<2, f64>, additive: bool, inside: F) -> ArrND<2, f64>
where
    F: Fn([usize; 2]) -> bool,
{
    ArrND::from_fn(mask.shape(), |idx| match (inside(idx), additive) {
        (true, true) => mask[idx] + 1.0,
        (true, false) => 1.0,
        (false, _) => mask[idx],
    })
}

/// Fill the polygon with vertices at (`vertices_r`, `vertices_c`) grid indices.
///
/// Cells inside or on the edge of the polygon are set to 1, or incremented by 1 if `additive`.
///
/// # Examples
/// ```
/// use stratos::field::{ArrND, Field};
/// use stratos::region::fill_polygon_by_index;
///
/// let mask = ArrND::full(0.0, [10, 10]);
/// let filled = fill_polygon_by_index(&mask, &[2., 6., 6., 2.], &[2., 2., 6., 6.], false).unwrap();
///
/// assert_eq!(filled[[4, 4]], 1.0);
/// assert_eq!(filled[[1, 4]], 0.0);
/// ```
pub fn fill_polygon_by_index(
    mask: &ArrND<2, f64>,
    vertices_r: &[f64],
    vertices_c: &[f64],
    additive: bool,
) -> Result<ArrND<2, f64>> {
    let poly = polygon(vertices_c, vertices_r)?;
    Ok(fill_where(mask, additive, |[r, c]| {
        poly.intersects(&Point::new(c as f64, r as f64))
    }))
}

/// Fill the polygon with vertices at (`vertices_lon`, `vertices_lat`).
///
/// Cells whose centre lies strictly inside the polygon are set to 1, or incremented by 1 if
/// `additive`.
pub fn fill_polygon_by_lonlat(
    mask: &ArrND<2, f64>,
    longitude: &ArrND<2, f64>,
    latitude: &ArrND<2, f64>,
    vertices_lon: &[f64],
    vertices_lat: &[f64],
    additive: bool,
) -> Result<ArrND<2, f64>> {
    check_shape("longitude", &DIMS_2D, longitude.shape(), mask.shape())?;
    check_shape("latitude", &DIMS_2D, latitude.shape(), mask.shape())?;
    let poly = polygon(vertices_lon, vertices_lat)?;
    Ok(fill_where(mask, additive, |idx| {
        poly.contains(&Point::new(longitude[idx], latitude[idx]))
    }))
}

/// Create a new 0/1 region mask from a polygon in longitude and latitude.
pub fn make_region_from_vertices(
    longitude: &ArrND<2, f64>,
    latitude: &ArrND<2, f64>,
    vertices_lon: &[f64],
    vertices_lat: &[f64],
) -> Result<ArrND<2, f64>> {
    let mask = ArrND::full(0.0, longitude.shape());
    fill_polygon_by_lonlat(&mask, longitude, latitude, vertices_lon, vertices_lat, false)
}

/// A stack of named region masks on a common horizontal grid.
#[derive(Clone, Debug)]
pub struct RegionMasks {
    names: Vec<String>,
    longitude: ArrND<2, f64>,
    latitude: ArrND<2, f64>,
    mask: ArrND<3, f64>,
}

/// Stack `masks` into a (region, row, column) field.
///
/// Regions are named by `names` if given, by their position otherwise.
pub fn make_mask_dataset(
    longitude: &ArrND<2, f64>,
    latitude: &ArrND<2, f64>,
    masks: &[ArrND<2, f64>],
    names: Option<&[&str]>,
) -> Result<RegionMasks> {
    let horizontal = longitude.shape();
    check_shape("latitude", &DIMS_2D, latitude.shape(), horizontal)?;
    for m in masks {
        check_shape("region mask", &DIMS_2D, m.shape(), horizontal)?;
    }
    let names: Vec<String> = match names {
        Some(names) if names.len() == masks.len() => {
            names.iter().map(|n| n.to_string()).collect()
        }
        Some(names) => {
            return Err(DiagnosticsError::DataLength {
                expected: masks.len(),
                found: names.len(),
            })
        }
        None => (0..masks.len()).map(|i| i.to_string()).collect(),
    };
    let mask = ArrND::from_fn(
        [masks.len(), horizontal[0], horizontal[1]],
        |[r, j, i]: [usize; 3]| masks[r][[j, i]],
    );
    Ok(RegionMasks {
        names,
        longitude: longitude.clone(),
        latitude: latitude.clone(),
        mask,
    })
}

impl RegionMasks {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_regions(&self) -> usize {
        self.names.len()
    }

    pub fn longitude(&self) -> &ArrND<2, f64> {
        &self.longitude
    }

    pub fn latitude(&self) -> &ArrND<2, f64> {
        &self.latitude
    }

    /// The stacked (region, row, column) mask.
    pub fn mask(&self) -> &ArrND<3, f64> {
        &self.mask
    }

    /// Sum over all regions and cells.
    pub fn sum(&self) -> f64 {
        self.mask.iter().sum()
    }

    /// Number of regions covering each cell.
    pub fn coverage(&self) -> ArrND<2, f64> {
        self.mask.collapse_axis(0, |regions: &[f64]| regions.iter().sum())
    }

    /// Mask of the region called `name`.
    pub fn region(&self, name: &str) -> Option<ArrND<2, f64>> {
        let r = self.names.iter().position(|n| n == name)?;
        let horizontal = self.longitude.shape();
        Some(ArrND::from_fn(horizontal, |[j, i]: [usize; 2]| {
            self.mask[[r, j, i]]
        }))
    }

    /// Skip-missing mean of a (time, row, column) field over every region and time record.
    ///
    /// Returns a (region, time) field.
    pub fn region_means(&self, field: &ArrND<3, f64>) -> Result<ArrND<2, f64>> {
        let horizontal = self.longitude.shape();
        check_shape(
            "field",
            &DIMS_2D,
            field.shape().remove_axis(0),
            horizontal,
        )?;
        let nt = field.shape()[0];
        Ok(ArrND::from_fn(
            [self.n_regions(), nt],
            |[r, t]: [usize; 2]| {
                let values: Vec<f64> = horizontal
                    .iter()
                    .filter(|&[j, i]| self.mask[[r, j, i]] > 0.0)
                    .map(|[j, i]| field[[t, j, i]])
                    .collect();
                nanmean(&values)
            },
        ))
    }
}

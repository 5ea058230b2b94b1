//! Geometry of the vertical interface ("w") grid the stratification lives on.
//!
//! The [`OceanGrid`] bundles the fields a gridded model domain supplies: depth and thickness of
//! every vertical cell, the horizontal cell sizes, latitude and longitude of the cell centres
//! and the time axis of the model output. Use the [`OceanGridBuilder`] to construct it.

use chrono::NaiveDateTime;

use crate::errors::{DiagnosticsError, Result};
use crate::field::{ArrND, Field, Shape};
use crate::variable::{Coords, Dim, Var};

/// Axes of static vertical geometry fields.
pub const DIMS_3D: [Dim; 3] = [Dim::DepthLevel, Dim::Row, Dim::Column];

/// Axes of horizontal fields.
pub const DIMS_2D: [Dim; 2] = [Dim::Row, Dim::Column];

/// Geometry of a structured ocean model grid on w-points.
#[derive(Clone, Debug)]
pub struct OceanGrid {
    time: Vec<NaiveDateTime>,
    latitude: ArrND<2, f64>,
    longitude: ArrND<2, f64>,
    depth_0: Var<3>,
    e3_0: Var<3>,
    e1: ArrND<2, f64>,
    e2: ArrND<2, f64>,
}

impl OceanGrid {
    /// Time axis of the model output.
    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }

    pub fn latitude(&self) -> &ArrND<2, f64> {
        &self.latitude
    }

    pub fn longitude(&self) -> &ArrND<2, f64> {
        &self.longitude
    }

    /// Depth of every vertical level, (z, y, x).
    pub fn depth_0(&self) -> &Var<3> {
        &self.depth_0
    }

    /// Vertical cell thickness, (z, y, x).
    pub fn e3_0(&self) -> &Var<3> {
        &self.e3_0
    }

    /// Cell size along the column axis, (y, x).
    pub fn e1(&self) -> &ArrND<2, f64> {
        &self.e1
    }

    /// Cell size along the row axis, (y, x).
    pub fn e2(&self) -> &ArrND<2, f64> {
        &self.e2
    }

    /// Number of time records.
    pub fn nt(&self) -> usize {
        self.time.len()
    }

    /// Number of grid points along depth level, row and column.
    pub fn shape(&self) -> Shape<3> {
        self.depth_0.shape()
    }

    /// Time, latitude and longitude as shared coordinates.
    pub fn coords(&self) -> Coords {
        Coords {
            time: self.time.clone(),
            latitude: self.latitude.clone(),
            longitude: self.longitude.clone(),
        }
    }
}

/// Builder for [`OceanGrid`] types
///
/// # Examples
/// ```
/// use stratos::grid::OceanGridBuilder;
///
/// let grid = OceanGridBuilder::shape([4, 2, 3])
///     .cartesian_coordinates([50.0, -4.0], [0.5, 1.0])
///     .uniform_levels(5.0)
///     .build()
///     .unwrap();
///
/// assert_eq!(grid.depth_0().data()[[3, 0, 0]], 15.0);
/// assert_eq!(grid.longitude()[[1, 2]], -2.0);
/// assert_eq!(grid.e1()[[0, 0]], 1.0);
/// ```
pub struct OceanGridBuilder {
    shape: Shape<3>,
    time: Vec<NaiveDateTime>,
    latitude: Option<ArrND<2, f64>>,
    longitude: Option<ArrND<2, f64>>,
    depth_0: Option<ArrND<3, f64>>,
    e3_0: Option<ArrND<3, f64>>,
    e1: Option<ArrND<2, f64>>,
    e2: Option<ArrND<2, f64>>,
}

impl OceanGridBuilder {
    /// Build [`OceanGrid`] with `shape` given as `[depth levels, rows, columns]`.
    ///
    /// This is the first method in the build chain.
    pub fn shape(shape: [usize; 3]) -> Self {
        Self {
            shape: crate::field::shape(shape),
            time: Vec::new(),
            latitude: None,
            longitude: None,
            depth_0: None,
            e3_0: None,
            e1: None,
            e2: None,
        }
    }

    /// Set the time axis.
    pub fn time(self, time: Vec<NaiveDateTime>) -> Self {
        Self { time, ..self }
    }

    /// Set latitude and longitude of the grid points.
    pub fn coordinates(self, latitude: ArrND<2, f64>, longitude: ArrND<2, f64>) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..self
        }
    }

    /// Define evenly spaced coordinates, `start` and `delta` given as `[latitude, longitude]`.
    pub fn cartesian_coordinates(self, start: [f64; 2], delta: [f64; 2]) -> Self {
        let shape = self.horizontal_shape();
        let latitude = ArrND::from_fn(shape, |idx| start[0] + delta[0] * idx[0] as f64);
        let longitude = ArrND::from_fn(shape, |idx| start[1] + delta[1] * idx[1] as f64);
        self.coordinates(latitude, longitude)
    }

    /// Set depth and thickness of the vertical levels.
    pub fn levels(self, depth_0: ArrND<3, f64>, e3_0: ArrND<3, f64>) -> Self {
        Self {
            depth_0: Some(depth_0),
            e3_0: Some(e3_0),
            ..self
        }
    }

    /// Define levels of constant thickness `dz`, the first level at the surface.
    pub fn uniform_levels(self, dz: f64) -> Self {
        let shape = self.shape;
        let depth_0 = ArrND::from_fn(shape, |idx| dz * idx[0] as f64);
        let e3_0 = ArrND::full(dz, shape);
        self.levels(depth_0, e3_0)
    }

    /// Set the horizontal cell sizes.
    pub fn horizontal_spacing(self, e1: ArrND<2, f64>, e2: ArrND<2, f64>) -> Self {
        Self {
            e1: Some(e1),
            e2: Some(e2),
            ..self
        }
    }

    fn horizontal_shape(&self) -> Shape<2> {
        self.shape.remove_axis(0)
    }

    /// Build the [`OceanGrid`] object.
    ///
    /// Coordinates default to the grid indices, levels to unit thickness and horizontal
    /// spacing to one. Every given field must match the shape of the grid.
    pub fn build(self) -> Result<OceanGrid> {
        let shape = self.shape;
        let horizontal = self.horizontal_shape();
        if shape[0] < 2 {
            return Err(DiagnosticsError::InsufficientDepthLevels(shape[0]));
        }

        let OceanGridBuilder {
            time,
            latitude,
            longitude,
            depth_0,
            e3_0,
            e1,
            e2,
            ..
        } = self;

        let latitude = latitude.unwrap_or_else(|| ArrND::from_fn(horizontal, |idx| idx[0] as f64));
        let longitude =
            longitude.unwrap_or_else(|| ArrND::from_fn(horizontal, |idx| idx[1] as f64));
        let depth_0 = depth_0.unwrap_or_else(|| ArrND::from_fn(shape, |idx| idx[0] as f64));
        let e3_0 = e3_0.unwrap_or_else(|| ArrND::full(1.0, shape));
        let e1 = e1.unwrap_or_else(|| ArrND::full(1.0, horizontal));
        let e2 = e2.unwrap_or_else(|| ArrND::full(1.0, horizontal));

        for (name, field) in [
            ("latitude", &latitude),
            ("longitude", &longitude),
            ("e1", &e1),
            ("e2", &e2),
        ] {
            check_shape(name, &DIMS_2D, field.shape(), horizontal)?;
        }
        for (name, field) in [("depth_0", &depth_0), ("e3_0", &e3_0)] {
            check_shape(name, &DIMS_3D, field.shape(), shape)?;
        }

        Ok(OceanGrid {
            time,
            latitude,
            longitude,
            depth_0: Var::new("depth_0", depth_0, DIMS_3D),
            e3_0: Var::new("e3_0", e3_0, DIMS_3D),
            e1,
            e2,
        })
    }
}

pub(crate) fn check_shape<const ND: usize>(
    name: &str,
    dims: &[Dim; ND],
    found: Shape<ND>,
    expected: Shape<ND>,
) -> Result<()> {
    match (0..ND).find(|&d| found[d] != expected[d]) {
        Some(d) => Err(DiagnosticsError::ShapeMismatch {
            field: name.to_string(),
            axis: dims[d],
            expected: expected[d],
            found: found[d],
        }),
        None => Ok(()),
    }
}

//! Provides variables, i.e. [`ArrND`] fields holding the actual data together with axis labels,
//! descriptive attributes and, for output fields, the shared coordinates.
use std::fmt::Display;
use std::rc::Rc;

use chrono::NaiveDateTime;

use crate::errors::{DiagnosticsError, Result};
use crate::field::{ArrND, Field, Ix, Shape};

/// Named axes of gridded model output.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dim {
    Time,
    DepthLevel,
    Row,
    Column,
}

impl Dim {
    /// Dimension name as used in the model output files.
    pub fn name(&self) -> &'static str {
        match self {
            Dim::Time => "t_dim",
            Dim::DepthLevel => "z_dim",
            Dim::Row => "y_dim",
            Dim::Column => "x_dim",
        }
    }
}

impl Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Descriptive metadata of a variable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attrs {
    pub units: Option<String>,
    pub standard_name: Option<String>,
    pub long_name: Option<String>,
}

impl Attrs {
    pub fn new(units: &str, standard_name: &str, long_name: &str) -> Self {
        Self {
            units: Some(units.to_string()),
            standard_name: Some(standard_name.to_string()),
            long_name: Some(long_name.to_string()),
        }
    }
}

/// Time, latitude and longitude coordinates shared by the fields of a dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct Coords {
    pub time: Vec<NaiveDateTime>,
    pub latitude: ArrND<2, f64>,
    pub longitude: ArrND<2, f64>,
}

/// A labelled field: data with one [`Dim`] per array dimension.
///
/// # Examples
/// A depth field without time axis is replicated along time when broadcast
/// against a 4D field:
/// ```
/// use stratos::field::{ArrND, Field, shape};
/// use stratos::variable::{Dim, Var};
///
/// let depth = Var::new(
///     "depth_0",
///     ArrND::from_fn([3, 1, 1], |[k, _, _]: [usize; 3]| 10.0 * k as f64),
///     [Dim::DepthLevel, Dim::Row, Dim::Column],
/// );
/// let dims = [Dim::Time, Dim::DepthLevel, Dim::Row, Dim::Column];
/// let depth_4d = depth.broadcast_to(dims, shape([2, 3, 1, 1])).unwrap();
///
/// assert_eq!(depth_4d[[0, 2, 0, 0]], 20.0);
/// assert_eq!(depth_4d[[1, 2, 0, 0]], 20.0);
/// ```
#[derive(Clone, Debug)]
pub struct Var<const ND: usize> {
    name: String,
    data: ArrND<ND, f64>,
    dims: [Dim; ND],
    attrs: Attrs,
    coords: Option<Rc<Coords>>,
}

impl<const ND: usize> Var<ND> {
    pub fn new(name: &str, data: ArrND<ND, f64>, dims: [Dim; ND]) -> Self {
        Self {
            name: name.to_string(),
            data,
            dims,
            attrs: Attrs::default(),
            coords: None,
        }
    }

    /// Attach descriptive attributes.
    pub fn with_attrs(self, attrs: Attrs) -> Self {
        Self { attrs, ..self }
    }

    /// Tag the variable with shared coordinates.
    pub fn with_coords(self, coords: &Rc<Coords>) -> Self {
        Self {
            coords: Some(Rc::clone(coords)),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ArrND<ND, f64> {
        &self.data
    }

    pub fn dims(&self) -> &[Dim; ND] {
        &self.dims
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn coords(&self) -> Option<&Rc<Coords>> {
        self.coords.as_ref()
    }

    pub fn shape(&self) -> Shape<ND> {
        self.data.shape()
    }

    /// Position of `dim` among the axes of this variable.
    pub fn axis(&self, dim: Dim) -> Option<usize> {
        self.dims.iter().position(|&d| d == dim)
    }

    /// Length of the axis `dim`, if the variable has it.
    pub fn size_of(&self, dim: Dim) -> Option<usize> {
        self.axis(dim).map(|ax| self.shape()[ax])
    }

    /// Fail with [`DiagnosticsError::ShapeMismatch`] if axis `dim` exists with a length other
    /// than `expected`.
    pub fn check_size(&self, dim: Dim, expected: usize) -> Result<()> {
        match self.size_of(dim) {
            Some(found) if found != expected => Err(DiagnosticsError::ShapeMismatch {
                field: self.name.clone(),
                axis: dim,
                expected,
                found,
            }),
            _ => Ok(()),
        }
    }

    /// Replicate the data along all axes of `dims` which this variable lacks.
    ///
    /// All axes of the variable must be part of `dims` and have the length given by `shape`.
    pub fn broadcast_to<const MD: usize>(
        &self,
        dims: [Dim; MD],
        shape: Shape<MD>,
    ) -> Result<ArrND<MD, f64>> {
        let mut positions = [0usize; ND];
        for (d, dim) in self.dims.iter().enumerate() {
            let pos = dims
                .iter()
                .position(|t| t == dim)
                .ok_or_else(|| DiagnosticsError::MissingAxis {
                    field: self.name.clone(),
                    axis: *dim,
                })?;
            let found = self.shape()[d];
            if found != shape[pos] {
                return Err(DiagnosticsError::ShapeMismatch {
                    field: self.name.clone(),
                    axis: *dim,
                    expected: shape[pos],
                    found,
                });
            }
            positions[d] = pos;
        }
        Ok(ArrND::from_fn(shape, |idx| {
            let mut src: Ix<ND> = [0; ND];
            src.iter_mut()
                .zip(positions.iter())
                .for_each(|(s, &p)| *s = idx[p]);
            self.data[src]
        }))
    }
}

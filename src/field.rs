//! Provides the [`ArrND`] type, which is the basic data type to deal with N-dimensional arrays,
//! the [`Field`] trait which must be implemented by any type that shall be used to store
//! gridded data, and the skip-missing reductions of [`NumField`].

use std::ops::{Index, IndexMut};

use crate::errors::{DiagnosticsError, Result};
use crate::Numeric;

/// Type alias for index tuples
pub type Ix<const ND: usize> = [usize; ND];

pub fn shape<const ND: usize>(shape: [usize; ND]) -> Shape<ND> {
    Shape(shape)
}

/// Array shape
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shape<const ND: usize>(Ix<ND>);

impl<const ND: usize> Shape<ND> {
    /// Return an iterator over all possible indices of an array with shape `self`.
    pub fn iter(&self) -> NDIndexer<ND> {
        self.into_iter()
    }

    /// Return the number of the elements of the array
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    /// Return the shape without dimension `axis`.
    ///
    /// `MD` must be `ND - 1`.
    pub fn remove_axis<const MD: usize>(&self, axis: usize) -> Shape<MD> {
        debug_assert_eq!(MD + 1, ND);
        let mut res = [0usize; MD];
        self.0
            .iter()
            .enumerate()
            .filter(|(d, _)| *d != axis)
            .zip(res.iter_mut())
            .for_each(|((_, &n), r)| *r = n);
        Shape(res)
    }
}

impl<const ND: usize> AsRef<Ix<ND>> for Shape<ND> {
    fn as_ref(&self) -> &Ix<ND> {
        &self.0
    }
}

impl<const ND: usize> IntoIterator for Shape<ND> {
    type Item = Ix<ND>;

    type IntoIter = NDIndexer<ND>;

    fn into_iter(self) -> Self::IntoIter {
        NDIndexer {
            inner: None,
            shape: self.0,
        }
    }
}

impl<const ND: usize> Index<usize> for Shape<ND> {
    type Output = usize;

    fn index(&self, index: usize) -> &Self::Output {
        self.as_ref().index(index)
    }
}

/// Iterator over all indices of a shape in row-major order.
pub struct NDIndexer<const ND: usize> {
    inner: Option<Ix<ND>>,
    shape: Ix<ND>,
}

impl<const ND: usize> Iterator for NDIndexer<ND> {
    type Item = Ix<ND>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner {
            Some(ix) => {
                let shape = self.shape;
                let mut ix = ix;
                ix[ND - 1] += 1;
                (1..ND).rev().for_each(|d| {
                    if ix[d] >= shape[d] {
                        ix[d] = 0;
                        ix[d - 1] += 1
                    }
                });
                if ix[0] >= shape[0] {
                    None
                } else {
                    self.inner = Some(ix);
                    self.inner
                }
            }
            None => {
                if ND == 0 || self.shape.iter().any(|&n| n == 0) {
                    return None;
                }
                self.inner = Some([0usize; ND]);
                self.inner
            }
        }
    }
}

/// Trait to allow for conversion into a Shape type
pub trait IntoShape<const ND: usize> {
    fn into_shape(self) -> Shape<ND>;
}

impl<const ND: usize> IntoShape<ND> for Shape<ND> {
    fn into_shape(self) -> Shape<ND> {
        self
    }
}

impl<const ND: usize> IntoShape<ND> for [usize; ND] {
    fn into_shape(self) -> Shape<ND> {
        Shape(self)
    }
}

/// Insert position `pos` of dimension `axis` into an index with one dimension less.
///
/// `ND` must be `MD + 1`.
pub fn insert_axis_index<const MD: usize, const ND: usize>(
    idx: Ix<MD>,
    axis: usize,
    pos: usize,
) -> Ix<ND> {
    debug_assert_eq!(MD + 1, ND);
    let mut res = [0usize; ND];
    let mut src = idx.iter();
    for (d, r) in res.iter_mut().enumerate() {
        *r = if d == axis {
            pos
        } else {
            *src.next().unwrap_or(&0)
        };
    }
    res
}

/// Trait for array backends.
pub trait Field<const ND: usize, I>
where
    Self: Sized + Index<Ix<ND>, Output = I> + IndexMut<Ix<ND>, Output = I>,
{
    /// Create a new field with all elements set to a constant value.
    fn full(item: I, shape: impl IntoShape<ND>) -> Self;

    /// Return the shape of the array.
    fn shape(&self) -> Shape<ND>;
}

/// N-dimensional Array with linear contiguous memory layout.
///
/// The data is stored in a boxed slice and available via indexing with an
/// array of indices. The indexing is row-major, i.e. the last index runs fastest.
///
/// # Examples
/// Create an array, filled with a value.
/// ```
/// use stratos::field::ArrND;
/// use stratos::field::Field;
///
/// let arr = ArrND::full(1f64, [2, 2]);
///
/// assert_eq!(arr[[0, 0]], 1.0);
/// assert_eq!(arr[[1, 0]], 1.0);
/// assert_eq!(arr[[0, 1]], 1.0);
/// assert_eq!(arr[[1, 1]], 1.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ArrND<const ND: usize, I> {
    shape: Shape<ND>,
    data: Box<[I]>,
}

impl<const ND: usize, I> ArrND<ND, I> {
    #[inline]
    fn flatten_index(&self, index: Ix<ND>) -> usize {
        let shape = self.shape;
        let mut sum = index[ND - 1];
        let mut prod: usize;
        for d in 0..ND - 1 {
            prod = shape.0[d + 1..].iter().product();
            sum += index[d] * prod;
        }
        sum
    }

    /// Create an array from row-major data.
    ///
    /// # Examples
    /// ```
    /// use stratos::field::ArrND;
    ///
    /// let arr = ArrND::from_shape_vec([2, 3], vec![0., 1., 2., 3., 4., 5.]).unwrap();
    /// assert_eq!(arr[[1, 0]], 3.0);
    ///
    /// assert!(ArrND::from_shape_vec([2, 2], vec![0., 1., 2.]).is_err());
    /// ```
    pub fn from_shape_vec(shape: impl IntoShape<ND>, data: Vec<I>) -> Result<Self> {
        let shape = shape.into_shape();
        if shape.size() != data.len() {
            return Err(DiagnosticsError::DataLength {
                expected: shape.size(),
                found: data.len(),
            });
        }
        Ok(Self {
            shape,
            data: data.into_boxed_slice(),
        })
    }

    /// Create an array by evaluating `f` at every index.
    pub fn from_fn<F>(shape: impl IntoShape<ND>, f: F) -> Self
    where
        F: Fn(Ix<ND>) -> I,
    {
        let shape = shape.into_shape();
        Self {
            shape,
            data: shape.iter().map(f).collect(),
        }
    }

    /// Return the data as a row-major slice.
    pub fn as_slice(&self) -> &[I] {
        &self.data
    }

    /// Iterate over all elements in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, I> {
        self.data.iter()
    }

    /// Apply `f` to every element and return the result as a new array.
    pub fn map<O, F>(&self, f: F) -> ArrND<ND, O>
    where
        F: Fn(&I) -> O,
    {
        ArrND {
            shape: self.shape,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Combine two arrays of the same shape elementwise.
    pub fn zip_map<J, O, F>(&self, other: &ArrND<ND, J>, f: F) -> ArrND<ND, O>
    where
        F: Fn(&I, &J) -> O,
    {
        assert_eq!(self.shape, other.shape);
        ArrND {
            shape: self.shape,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| f(a, b))
                .collect(),
        }
    }

    /// Set all elements with position `pos` along dimension `axis` to `value`.
    pub fn fill_along(&mut self, axis: usize, pos: usize, value: I)
    where
        I: Copy,
    {
        for idx in self.shape {
            if idx[axis] == pos {
                self[idx] = value;
            }
        }
    }

    /// Reduce dimension `axis` by applying `f` to every lane along that dimension.
    ///
    /// `MD` must be `ND - 1`.
    pub fn collapse_axis<const MD: usize, O, F>(&self, axis: usize, mut f: F) -> ArrND<MD, O>
    where
        I: Copy,
        F: FnMut(&[I]) -> O,
    {
        let out_shape = self.shape.remove_axis::<MD>(axis);
        let len = self.shape[axis];
        let mut lane = Vec::with_capacity(len);
        let data = out_shape
            .iter()
            .map(|idx| {
                lane.clear();
                lane.extend((0..len).map(|k| self[insert_axis_index::<MD, ND>(idx, axis, k)]));
                f(&lane)
            })
            .collect();
        ArrND {
            shape: out_shape,
            data,
        }
    }

    /// Keep elements where `cond` holds and replace all others by `other`.
    pub fn select(&self, cond: &ArrND<ND, bool>, other: I) -> Self
    where
        I: Copy,
    {
        self.zip_map(cond, |&v, &keep| if keep { v } else { other })
    }
}

impl<const ND: usize, I> Index<Ix<ND>> for ArrND<ND, I> {
    type Output = I;
    #[inline]
    fn index(&self, index: Ix<ND>) -> &I {
        &self.data[self.flatten_index(index)]
    }
}

impl<const ND: usize, I> IndexMut<Ix<ND>> for ArrND<ND, I> {
    #[inline]
    fn index_mut(&mut self, index: Ix<ND>) -> &mut Self::Output {
        &mut self.data[self.flatten_index(index)]
    }
}

impl<const ND: usize, I: Copy> Field<ND, I> for ArrND<ND, I> {
    fn full(item: I, shape: impl IntoShape<ND>) -> Self {
        let shape = shape.into_shape();
        ArrND {
            shape,
            data: vec![item; shape.size()].into_boxed_slice(),
        }
    }

    fn shape(&self) -> Shape<ND> {
        self.shape
    }
}

/// Sum of all values that are not missing.
///
/// Missing values contribute nothing, unless all values are missing, in which
/// case the sum is missing too.
///
/// # Examples
/// ```
/// use stratos::field::nansum;
///
/// assert_eq!(nansum(&[1.0, f64::NAN, 2.0]), 3.0);
/// assert!(nansum(&[f64::NAN, f64::NAN]).is_nan());
/// ```
pub fn nansum<I: Numeric>(values: &[I]) -> I {
    values
        .iter()
        .filter(|v| !v.is_missing())
        .fold(None, |acc: Option<I>, &v| Some(acc.map_or(v, |a| a + v)))
        .unwrap_or_else(I::missing)
}

/// Minimum of all values that are not missing, missing if there are none.
pub fn nanmin<I: Numeric>(values: &[I]) -> I {
    values
        .iter()
        .filter(|v| !v.is_missing())
        .fold(None, |acc: Option<I>, &v| match acc {
            Some(a) if a <= v => Some(a),
            _ => Some(v),
        })
        .unwrap_or_else(I::missing)
}

/// Maximum of all values that are not missing, missing if there are none.
pub fn nanmax<I: Numeric>(values: &[I]) -> I {
    values
        .iter()
        .filter(|v| !v.is_missing())
        .fold(None, |acc: Option<I>, &v| match acc {
            Some(a) if a >= v => Some(a),
            _ => Some(v),
        })
        .unwrap_or_else(I::missing)
}

/// Mean of all values that are not missing, missing if there are none.
pub fn nanmean<I: Numeric>(values: &[I]) -> I {
    let count = values.iter().filter(|v| !v.is_missing()).count();
    if count == 0 {
        I::missing()
    } else {
        nansum(values) / count as f64
    }
}

/// Skip-missing reductions for arrays of [`Numeric`] values.
pub trait NumField<const ND: usize, I: Numeric> {
    /// Skip-missing sum along `axis`.
    fn nansum_axis<const MD: usize>(&self, axis: usize) -> ArrND<MD, I>;
    /// Skip-missing minimum along `axis`.
    fn nanmin_axis<const MD: usize>(&self, axis: usize) -> ArrND<MD, I>;
    /// Skip-missing mean along `axis`.
    fn nanmean_axis<const MD: usize>(&self, axis: usize) -> ArrND<MD, I>;
    /// Smallest non-missing value of the whole array.
    fn min(&self) -> I;
    /// Largest non-missing value of the whole array.
    fn max(&self) -> I;
}

impl<const ND: usize, I: Numeric> NumField<ND, I> for ArrND<ND, I> {
    fn nansum_axis<const MD: usize>(&self, axis: usize) -> ArrND<MD, I> {
        self.collapse_axis(axis, nansum)
    }

    fn nanmin_axis<const MD: usize>(&self, axis: usize) -> ArrND<MD, I> {
        self.collapse_axis(axis, nanmin)
    }

    fn nanmean_axis<const MD: usize>(&self, axis: usize) -> ArrND<MD, I> {
        self.collapse_axis(axis, nanmean)
    }

    fn min(&self) -> I {
        nanmin(self.as_slice())
    }

    fn max(&self) -> I {
        nanmax(self.as_slice())
    }
}

#[cfg(test)]
mod test {
    use crate::field::IntoShape;

    use super::{shape, ArrND, Field, NumField};

    #[test]
    fn new_shape_from_array() {
        let shape = shape([2, 3]);
        assert_eq!(shape[0], 2);
        assert_eq!(shape[1], 3);
    }

    #[test]
    fn nd_indexer_produces_correct_values_1d() {
        use super::NDIndexer;
        let shape = [2];

        let mut indexer = NDIndexer { inner: None, shape };

        assert_eq!(indexer.next(), Some([0]));
        assert_eq!(indexer.next(), Some([1]));
        assert_eq!(indexer.next(), None);
        assert_eq!(indexer.next(), None);
    }

    #[test]
    fn nd_indexer_produces_correct_values_3d() {
        use super::NDIndexer;
        let shape = [2, 2, 2];

        let mut indexer = NDIndexer { inner: None, shape };

        assert_eq!(indexer.next(), Some([0, 0, 0]));
        assert_eq!(indexer.next(), Some([0, 0, 1]));
        assert_eq!(indexer.next(), Some([0, 1, 0]));
        assert_eq!(indexer.next(), Some([0, 1, 1]));
        assert_eq!(indexer.next(), Some([1, 0, 0]));
        assert_eq!(indexer.next(), Some([1, 0, 1]));
        assert_eq!(indexer.next(), Some([1, 1, 0]));
        assert_eq!(indexer.next(), Some([1, 1, 1]));
        assert_eq!(indexer.next(), None);
    }

    #[test]
    fn nd_indexer_is_empty_for_zero_sized_shape() {
        assert_eq!(shape([3, 0]).iter().count(), 0);
    }

    #[test]
    fn shape_size_is_correct() {
        assert_eq!(shape([2, 3]).size(), 6)
    }

    #[test]
    fn remove_axis_drops_dimension() {
        assert_eq!(shape([2, 3, 4, 5]).remove_axis::<3>(1), shape([2, 4, 5]));
        assert_eq!(shape([2, 3, 4]).remove_axis::<2>(0), shape([3, 4]));
    }

    #[test]
    fn create_arrnd() {
        let shape = [2, 2];

        let arr = ArrND::full(0f64, shape);
        assert_eq!(arr.shape, shape.into_shape());
        assert_eq!(arr[[0, 0]], 0f64);
        assert_eq!(arr[[1, 1]], 0f64);
    }

    #[test]
    fn indexing_is_row_major() {
        let arr = ArrND::from_fn([2, 3, 4], |[i, j, k]: [usize; 3]| (100 * i + 10 * j + k) as f64);
        assert_eq!(arr.as_slice()[0], 0.0);
        assert_eq!(arr.as_slice()[1], 1.0);
        assert_eq!(arr.as_slice()[4], 10.0);
        assert_eq!(arr.as_slice()[12], 100.0);
        assert_eq!(arr[[1, 2, 3]], 123.0);
    }

    #[test]
    fn fill_along_sets_only_the_slice() {
        let mut arr = ArrND::full(1f64, [2, 3, 2]);
        arr.fill_along(1, 2, 0.0);
        for idx in arr.shape() {
            assert_eq!(arr[idx], if idx[1] == 2 { 0.0 } else { 1.0 });
        }
    }

    #[test]
    fn nansum_axis_skips_missing_values() {
        let nan = f64::NAN;
        let arr = ArrND::from_shape_vec([2, 3], vec![1.0, nan, 2.0, nan, nan, nan]).unwrap();
        let sum: ArrND<1, f64> = arr.nansum_axis(1);
        assert_eq!(sum[[0]], 3.0);
        assert!(sum[[1]].is_nan());
    }

    #[test]
    fn nanmin_axis_reduces_leading_dimension() {
        let arr = ArrND::from_shape_vec([3, 2], vec![1.0, 5.0, -2.0, f64::NAN, 0.5, 4.0]).unwrap();
        let min: ArrND<1, f64> = arr.nanmin_axis(0);
        assert_eq!(min[[0]], -2.0);
        assert_eq!(min[[1]], 4.0);
    }

    #[test]
    fn nanmean_axis_averages_present_values() {
        let arr = ArrND::from_shape_vec([2, 3], vec![1.0, f64::NAN, 3.0, 2.0, 2.0, 2.0]).unwrap();
        let mean: ArrND<1, f64> = arr.nanmean_axis(1);
        assert_eq!(mean[[0]], 2.0);
        assert_eq!(mean[[1]], 2.0);
    }

    #[test]
    fn global_min_max_ignore_missing() {
        let arr = ArrND::from_shape_vec([4], vec![f64::NAN, -3.0, 7.0, 1.0]).unwrap();
        assert_eq!(arr.min(), -3.0);
        assert_eq!(arr.max(), 7.0);
    }

    #[test]
    fn select_replaces_unselected_elements() {
        let arr = ArrND::from_shape_vec([3], vec![1.0, 2.0, 3.0]).unwrap();
        let cond = ArrND::from_shape_vec([3], vec![true, false, true]).unwrap();
        let res = arr.select(&cond, f64::NAN);
        assert_eq!(res[[0]], 1.0);
        assert!(res[[1]].is_nan());
        assert_eq!(res[[2]], 3.0);
    }
}

use crate::{
    error::{Error, ErrorKind},
    info::DeviceInfo,
};

/// N-dimensional index space of a kernel dispatch.
///
/// Unused dimensions have global and local size of 1 and zero offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NdRange {
    dims: usize,
    offset: [usize; 3],
    global: [usize; 3],
    local: Option<[usize; 3]>,
}

fn widen(values: &[usize], fill: usize) -> [usize; 3] {
    let mut out = [fill; 3];
    out[..values.len()].copy_from_slice(values);
    out
}

impl NdRange {
    /// Describe index space.
    /// Dimensionality is taken from `global`. `offset` and `local` must match it.
    pub fn new(
        offset: Option<&[usize]>,
        global: &[usize],
        local: Option<&[usize]>,
    ) -> Result<Self, Error> {
        let dims = global.len();
        if dims == 0 || dims > 3 {
            return Err(Error::new(
                ErrorKind::InvalidWorkDimension,
                format!("{} dimensions requested", dims),
            ));
        }

        if offset.map_or(false, |offset| offset.len() != dims)
            || local.map_or(false, |local| local.len() != dims)
        {
            return Err(Error::new(
                ErrorKind::InvalidWorkDimension,
                "Offset, global and local sizes must have the same dimensionality",
            ));
        }

        if global.iter().any(|&size| size == 0) {
            return Err(Error::new(
                ErrorKind::InvalidGlobalWorkSize,
                "Global work size can't be zero",
            ));
        }

        let offset = widen(offset.unwrap_or(&[]), 0);
        let global = widen(global, 1);

        if offset
            .iter()
            .zip(&global)
            .any(|(&offset, &global)| offset.checked_add(global).is_none())
        {
            return Err(Error::new(
                ErrorKind::InvalidGlobalOffset,
                "Global offset plus global size overflows",
            ));
        }

        let local = match local {
            None => None,
            Some(local) => {
                let local = widen(local, 1);
                if local.iter().any(|&size| size == 0) {
                    return Err(Error::new(
                        ErrorKind::InvalidWorkGroupSize,
                        "Local work size can't be zero",
                    ));
                }
                if local.iter().zip(&global).any(|(&l, &g)| g % l != 0) {
                    return Err(Error::new(
                        ErrorKind::InvalidWorkGroupSize,
                        format!("Local size {:?} doesn't divide global size {:?}", local, global),
                    ));
                }
                Some(local)
            }
        };

        Ok(NdRange {
            dims,
            offset,
            global,
            local,
        })
    }

    /// Number of dimensions.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Global offset per dimension.
    pub fn offset(&self) -> [usize; 3] {
        self.offset
    }

    /// Global size per dimension.
    pub fn global(&self) -> [usize; 3] {
        self.global
    }

    /// Local size per dimension if specified.
    pub fn local(&self) -> Option<[usize; 3]> {
        self.local
    }

    /// Number of work groups per dimension.
    /// Zeros if local size is not resolved.
    pub fn groups(&self) -> [usize; 3] {
        match self.local {
            Some(local) => [
                self.global[0] / local[0],
                self.global[1] / local[1],
                self.global[2] / local[2],
            ],
            None => [0; 3],
        }
    }

    /// Check the range against device limits and kernel work group size.
    /// Picks a local size if none was specified.
    pub fn fit(mut self, device: &DeviceInfo, kernel_work_group_size: usize) -> Result<Self, Error> {
        let limit = device.max_work_group_size.min(kernel_work_group_size).max(1);

        match self.local {
            Some(local) => {
                for dim in 0..3 {
                    if local[dim] > device.max_work_item_sizes[dim] {
                        return Err(Error::new(
                            ErrorKind::InvalidWorkItemSize,
                            format!(
                                "Local size {} exceeds device limit {} in dimension {}",
                                local[dim], device.max_work_item_sizes[dim], dim
                            ),
                        ));
                    }
                }
                let total = local[0] * local[1] * local[2];
                if total > limit {
                    return Err(Error::new(
                        ErrorKind::InvalidWorkGroupSize,
                        format!("Work group of {} items exceeds limit {}", total, limit),
                    ));
                }
            }
            None => {
                let mut budget = limit;
                let mut local = [1; 3];
                for dim in 0..3 {
                    let cap = budget.min(device.max_work_item_sizes[dim]).max(1);
                    let size = largest_divisor(self.global[dim], cap);
                    local[dim] = size;
                    budget /= size;
                }
                self.local = Some(local);
            }
        }

        Ok(self)
    }
}

/// Largest divisor of `value` not exceeding `cap`.
fn largest_divisor(value: usize, cap: usize) -> usize {
    (1..=cap.min(value)).rev().find(|d| value % d == 0).unwrap_or(1)
}

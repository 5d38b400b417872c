use std::ops::Range;

/// Byte range of `size` bytes from `offset`, `None` on overflow.
pub(crate) fn checked_range(offset: usize, size: usize) -> Option<Range<usize>> {
    Some(offset..offset.checked_add(size)?)
}

pub(crate) fn is_sub_range(range: Range<usize>, sub: &Range<usize>) -> bool {
    sub.start >= range.start && sub.end <= range.end
}

pub(crate) fn is_power_of_two(value: usize) -> bool {
    value != 0 && value & (value - 1) == 0
}

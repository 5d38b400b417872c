use std::ops::Range;

/// Get sub-range of the mapping.
/// `range` is in region space, `sub` is relative to `range.start`.
pub(crate) fn mapped_sub_range(range: Range<usize>, sub: Range<usize>) -> Option<Range<usize>> {
    assert!(
        range.start <= range.end,
        "Memory mapping region must have valid size"
    );

    if sub.start > sub.end {
        return None;
    }

    let fitting = sub.start.checked_add(range.start)?..sub.end.checked_add(range.start)?;
    if fitting.end > range.end {
        None
    } else {
        Some(fitting)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sub_ranges() {
        assert_eq!(mapped_sub_range(10..20, 0..10), Some(10..20));
        assert_eq!(mapped_sub_range(10..20, 2..5), Some(12..15));
        assert_eq!(mapped_sub_range(10..20, 5..11), None);
        assert_eq!(mapped_sub_range(10..20, 5..4), None);
    }
}

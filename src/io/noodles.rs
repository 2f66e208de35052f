//! Conversions between mobamplot's 0-based coordinates and [`noodles`] types.

use crate::Position;
use noodles::core::{Position as NoodlesPosition, Region};

/// Convert from [`noodles::core::Position`], which is [1-based
/// indexing](https://docs.rs/noodles-core/latest/noodles_core/position/struct.Position.html),
/// to mobamplot's internal 0-based indexing.
///
/// # Developers Note
/// See: https://github.com/zaeleus/noodles/issues/226
pub fn zero_based(position: NoodlesPosition) -> u64 {
    position.get() as u64 - 1
}

/// Build the 1-based, closed [`Region`] covering the 0-based right-exclusive range
/// `[start, end)`. Returns `None` for an empty range.
pub fn to_noodles_region(seqname: &str, start: Position, end: Position) -> Option<Region> {
    if end <= start {
        return None;
    }
    let start = NoodlesPosition::new(start as usize + 1)?;
    let end = NoodlesPosition::new(end as usize)?;
    Some(Region::new(seqname, start..=end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_is_one_based_closed() {
        let region = to_noodles_region("chr1", 1000, 2000).unwrap();
        assert_eq!(region.to_string(), "chr1:1001-2000");
        assert!(to_noodles_region("chr1", 10, 10).is_none());
    }

    #[test]
    fn test_zero_based() {
        let position = NoodlesPosition::new(1001).unwrap();
        assert_eq!(zero_based(position), 1000);
    }
}

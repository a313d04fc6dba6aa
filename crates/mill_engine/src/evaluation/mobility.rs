//! Mobility term

use crate::position::Position;
use crate::types::Value;

/// White minus Black count of pieces bordering a free point
pub fn mobility_diff(pos: &Position) -> Value {
    pos.mobility_diff()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board_has_no_mobility() {
        assert_eq!(mobility_diff(&Position::default()), 0);
    }

    #[test]
    fn test_cross_point_beats_corner() {
        let mut pos = Position::default();
        // White on a middle-ring cross point (four neighbours), Black on a corner (two)
        assert!(pos.command("(2,1)"));
        assert!(pos.command("(3,2)"));
        assert_eq!(mobility_diff(&pos), 4 - 2);
    }
}

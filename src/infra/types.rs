use serde::{Deserialize, Serialize};

/// A cell coordinate on the screen or minimap, `x` being the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Bounds {
    /// Bounds of a square layer with `size` cells per side.
    pub fn square(size: i32) -> Self {
        Self {
            min_x: 0,
            max_x: size - 1,
            min_y: 0,
            max_y: size - 1,
        }
    }

    pub fn clamp(&self, pos: Position) -> Position {
        Position::new(
            pos.x.clamp(self.min_x, self.max_x),
            pos.y.clamp(self.min_y, self.max_y),
        )
    }
}

/// Which half of the map the agent's own base occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseSide {
    Left,
    Right,
}

impl BaseSide {
    /// Moves `pos` by `distance` on both axes in the direction of the opponent.
    pub fn toward_enemy(&self, pos: Position, distance: i32) -> Position {
        match self {
            BaseSide::Left => pos.offset(distance, distance),
            BaseSide::Right => pos.offset(-distance, -distance),
        }
    }

    pub fn away_from_enemy(&self, pos: Position, distance: i32) -> Position {
        self.toward_enemy(pos, -distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_clamp() {
        let bounds = Bounds::square(84);
        assert_eq!(bounds.clamp(Position::new(-5, 90)), Position::new(0, 83));
        assert_eq!(bounds.clamp(Position::new(83, 0)), Position::new(83, 0));
        assert_eq!(bounds.clamp(Position::new(84, -1)), Position::new(83, 0));
    }

    #[test]
    fn test_base_side_direction() {
        let pos = Position::new(40, 40);
        assert_eq!(BaseSide::Left.toward_enemy(pos, 10), Position::new(50, 50));
        assert_eq!(BaseSide::Right.toward_enemy(pos, 10), Position::new(30, 30));
        assert_eq!(BaseSide::Right.away_from_enemy(pos, 10), Position::new(50, 50));
    }
}

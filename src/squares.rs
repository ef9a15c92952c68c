//! Drifting bordered squares, the hero section's background simulation.
//!
//! The field is a flat vector of value structs mutated in place every frame;
//! nothing is allocated inside the frame loop. Randomness is injected so the
//! simulation stays deterministic under test.

pub const DEFAULT_DRIFT_SPEED: f64 = 0.5;
pub const DEFAULT_SQUARE_SIZE: f64 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DriftDirection {
    Up,
    Down,
    Left,
    Right,
    #[default]
    Diagonal,
}

impl DriftDirection {
    /// Velocity components for a scalar speed. Cardinal directions zero the
    /// orthogonal axis; diagonal drives both.
    pub fn velocity(self, speed: f64) -> (f64, f64) {
        match self {
            Self::Up => (0.0, -speed),
            Self::Down => (0.0, speed),
            Self::Left => (-speed, 0.0),
            Self::Right => (speed, 0.0),
            Self::Diagonal => (speed, speed),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldConfig {
    pub speed: f64,
    pub size: f64,
    pub direction: DriftDirection,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_DRIFT_SPEED,
            size: DEFAULT_SQUARE_SIZE,
            direction: DriftDirection::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Square {
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub size: f64,
    pub opacity: f64,
    pub hovered: bool,
}

impl Square {
    fn advance(&mut self, width: f64, height: f64) {
        self.x += self.dx;
        self.y += self.dy;

        // Wrap each axis independently once the square has left the surface
        // by more than its own size, so it never escapes for good.
        if self.x > width + self.size {
            self.x = -self.size;
        }
        if self.x < -self.size {
            self.x = width + self.size;
        }
        if self.y > height + self.size {
            self.y = -self.size;
        }
        if self.y < -self.size {
            self.y = height + self.size;
        }
    }

    fn check_hover(&mut self, pointer: Option<(f64, f64)>) {
        self.hovered = pointer.is_some_and(|(px, py)| {
            px >= self.x && px <= self.x + self.size && py >= self.y && py <= self.y + self.size
        });
    }
}

pub struct SquareField {
    width: f64,
    height: f64,
    squares: Vec<Square>,
}

impl SquareField {
    /// One square per `size² × 4` of surface area.
    pub fn population_for(width: f64, height: f64, size: f64) -> usize {
        if size <= 0.0 || width <= 0.0 || height <= 0.0 {
            return 0;
        }

        ((width * height) / (size * size * 4.0)).floor() as usize
    }

    /// `random` supplies values in `[0, 1)`: positions are scattered over the
    /// surface and each square gets a fixed opacity in `[0.1, 0.6)`.
    pub fn new(
        width: f64,
        height: f64,
        config: FieldConfig,
        mut random: impl FnMut() -> f64,
    ) -> Self {
        let (dx, dy) = config.direction.velocity(config.speed);
        let squares = (0..Self::population_for(width, height, config.size))
            .map(|_| Square {
                x: random() * width,
                y: random() * height,
                dx,
                dy,
                size: config.size,
                opacity: random() * 0.5 + 0.1,
                hovered: false,
            })
            .collect();

        Self {
            width,
            height,
            squares,
        }
    }

    /// Advances every square one frame. Position moves first and hover is
    /// recomputed from the moved position, so a stale position is never
    /// tested or drawn.
    pub fn step(&mut self, pointer: Option<(f64, f64)>) {
        for square in &mut self.squares {
            square.advance(self.width, self.height);
            square.check_hover(pointer);
        }
    }

    /// Tracks a surface resize. Existing squares keep their coordinates even
    /// if that shifts where they appear relative to the new surface.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(value: f64) -> impl FnMut() -> f64 {
        move || value
    }

    #[test]
    fn population_scales_with_surface_area() {
        assert_eq!(SquareField::population_for(1280.0, 720.0, 40.0), 144);
        assert_eq!(SquareField::population_for(40.0, 40.0, 40.0), 0);
        assert_eq!(SquareField::population_for(0.0, 720.0, 40.0), 0);
        assert_eq!(SquareField::population_for(1280.0, 720.0, 0.0), 0);
    }

    #[test]
    fn direction_sets_velocity_axes() {
        assert_eq!(DriftDirection::Up.velocity(0.5), (0.0, -0.5));
        assert_eq!(DriftDirection::Down.velocity(0.5), (0.0, 0.5));
        assert_eq!(DriftDirection::Left.velocity(0.5), (-0.5, 0.0));
        assert_eq!(DriftDirection::Right.velocity(0.5), (0.5, 0.0));
        assert_eq!(DriftDirection::Diagonal.velocity(0.5), (0.5, 0.5));
    }

    #[test]
    fn opacity_stays_within_the_configured_band() {
        let field = SquareField::new(800.0, 600.0, FieldConfig::default(), fixed(0.999));
        assert!(field.squares().iter().all(|square| square.opacity < 0.6));

        let field = SquareField::new(800.0, 600.0, FieldConfig::default(), fixed(0.0));
        assert!(field
            .squares()
            .iter()
            .all(|square| (square.opacity - 0.1).abs() < f64::EPSILON));
    }

    #[test]
    fn squares_wrap_instead_of_escaping() {
        let config = FieldConfig {
            speed: 5.0,
            size: 40.0,
            direction: DriftDirection::Right,
        };
        let width = 200.0;
        let mut field = SquareField::new(width, 200.0, config, fixed(0.5));

        // Park one square at the right edge and run frames until it wraps.
        field.squares[0].x = width - 1.0;
        let mut wrapped = false;
        for _ in 0..64 {
            field.step(None);
            if field.squares()[0].x < 0.0 {
                wrapped = true;
                break;
            }
            assert!(
                field.squares()[0].x <= width + config.size,
                "square must never grow unbounded"
            );
        }

        assert!(wrapped, "square at the edge must wrap to the far side");
    }

    #[test]
    fn hover_matches_the_axis_aligned_bounding_box() {
        let mut square = Square {
            x: 100.0,
            y: 100.0,
            dx: 0.0,
            dy: 0.0,
            size: 40.0,
            opacity: 0.3,
            hovered: false,
        };

        square.check_hover(Some((120.0, 120.0)));
        assert!(square.hovered);

        square.check_hover(Some((200.0, 200.0)));
        assert!(!square.hovered);

        square.check_hover(None);
        assert!(!square.hovered);
    }

    #[test]
    fn hover_is_computed_from_the_advanced_position() {
        let config = FieldConfig {
            speed: 10.0,
            size: 40.0,
            direction: DriftDirection::Right,
        };
        let mut field = SquareField::new(400.0, 400.0, config, fixed(0.5));
        // Pointer sits just past the square's current right edge; after one
        // step the square has moved under it.
        field.squares[0].x = 100.0;
        field.squares[0].y = 100.0;
        let pointer = Some((145.0, 120.0));

        field.step(pointer);

        assert!(
            field.squares()[0].hovered,
            "hover must see the post-move position"
        );
    }

    #[test]
    fn resize_keeps_existing_coordinates() {
        let mut field = SquareField::new(800.0, 600.0, FieldConfig::default(), fixed(0.25));
        let before: Vec<(f64, f64)> = field.squares().iter().map(|s| (s.x, s.y)).collect();

        field.resize(1920.0, 1080.0);
        let after: Vec<(f64, f64)> = field.squares().iter().map(|s| (s.x, s.y)).collect();

        assert_eq!(before, after);
    }
}

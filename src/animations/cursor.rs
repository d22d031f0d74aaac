use crate::render::surface::Point;

/// A cursor that trails the pointer, covering a fixed fraction of the remaining distance per frame.
#[derive(Clone, Debug)]
pub(crate) struct CursorFollower {
    target: Point,
    current: Point,
    easing: f32,
    hovering: bool,
}

impl CursorFollower {
    pub(crate) fn new(easing: f32) -> Self {
        let origin = Point::new(0.0, 0.0);
        Self { target: origin, current: origin, easing: easing.clamp(0.0, 1.0), hovering: false }
    }

    /// Records where the pointer is and whether it is over the call to action.
    pub(crate) fn point_at(&mut self, target: Point, hovering: bool) {
        self.target = target;
        self.hovering = hovering;
    }

    pub(crate) fn tick(&mut self) {
        self.current.x += (self.target.x - self.current.x) * self.easing;
        self.current.y += (self.target.y - self.current.y) * self.easing;
    }

    pub(crate) fn position(&self) -> Point {
        self.current
    }

    pub(crate) fn is_hovering(&self) -> bool {
        self.hovering
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eases_towards_target() {
        let mut cursor = CursorFollower::new(0.2);
        cursor.point_at(Point::new(100.0, 50.0), false);
        cursor.tick();
        assert_eq!(cursor.position(), Point::new(20.0, 10.0));
        cursor.tick();
        assert_eq!(cursor.position(), Point::new(36.0, 18.0));
    }

    #[test]
    fn converges() {
        let mut cursor = CursorFollower::new(0.2);
        cursor.point_at(Point::new(10.0, 10.0), true);
        for _ in 0..200 {
            cursor.tick();
        }
        let position = cursor.position();
        assert!((position.x - 10.0).abs() < 1e-3 && (position.y - 10.0).abs() < 1e-3);
        assert!(cursor.is_hovering());
    }
}

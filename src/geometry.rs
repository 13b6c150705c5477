use glam::Vec2;

/// Axis-aligned rectangle in screen pixels. `right`/`bottom` are exclusive
/// edges, matching OS window rects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, pos.x + size.x, pos.y + size.y)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// Grow uniformly by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> Self {
        Self::new(
            self.left - amount,
            self.top - amount,
            self.right + amount,
            self.bottom + amount,
        )
    }

    /// Inclusive on all edges.
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }
}

/// Screen bounds queried once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenGeometry {
    /// Whole monitor.
    pub full: Rect,
    /// Monitor minus OS-reserved areas such as the taskbar.
    pub available: Rect,
}

impl ScreenGeometry {
    pub fn new(full: Rect, available: Rect) -> Self {
        Self { full, available }
    }

    /// Y coordinate of the pet's top-left corner when standing on the floor.
    pub fn ground_y(&self, pet_height: f32) -> f32 {
        self.available.bottom - pet_height
    }

    /// Range of valid top-left positions for a pet of `size`.
    pub fn walkable(&self, size: Vec2) -> Rect {
        Rect::new(
            self.available.left,
            self.available.top,
            self.available.right - size.x,
            self.available.bottom - size.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inflate_contains_edges() {
        let r = Rect::new(100.0, 100.0, 200.0, 200.0).inflate(50.0);
        assert!(r.contains_point(Vec2::new(50.0, 50.0)));
        assert!(r.contains_point(Vec2::new(250.0, 250.0)));
        assert!(!r.contains_point(Vec2::new(250.5, 200.0)));
    }

    #[test]
    fn rect_containment() {
        let outer = Rect::new(0.0, 0.0, 500.0, 400.0);
        assert!(outer.contains_rect(&Rect::new(10.0, 10.0, 110.0, 110.0)));
        assert!(outer.contains_rect(&outer));
        assert!(!outer.contains_rect(&Rect::new(450.0, 10.0, 550.0, 110.0)));
    }

    #[test]
    fn ground_sits_on_available_bottom() {
        let screen = ScreenGeometry::new(
            Rect::new(0.0, 0.0, 1920.0, 1080.0),
            Rect::new(0.0, 0.0, 1920.0, 1040.0),
        );
        assert_eq!(screen.ground_y(100.0), 940.0);
        let walk = screen.walkable(Vec2::splat(100.0));
        assert_eq!(walk.right, 1820.0);
        assert_eq!(walk.bottom, 940.0);
    }
}

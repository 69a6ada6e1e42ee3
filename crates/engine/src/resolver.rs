//! Target resolution strategies.
//!
//! The placement controller never looks at geometry itself; it asks a
//! [`TargetResolver`] which target sits under the pointer. Two presentations
//! exist and each brings its own resolver:
//!
//! | Resolver | Presentation | Rule |
//! |----------|--------------|------|
//! | [`MagneticResolver`] | flat drag surface | nearest center within that candidate's radius |
//! | [`ShelfResolver`] | column / shelf | fixed column under the pointer |

use crate::types::{ContainerId, PointerPos, Target};

/// Maps a pointer position to the candidate under it.
pub trait TargetResolver: Send {
    fn resolve(&self, pos: PointerPos) -> Target;
}

/// Distance-to-center acquisition with separate crate and discard radii.
#[derive(Debug, Clone, PartialEq)]
pub struct MagneticResolver {
    containers: Vec<(ContainerId, PointerPos)>,
    discard: Option<PointerPos>,
    container_radius: f32,
    discard_radius: f32,
}

pub const DEFAULT_CONTAINER_RADIUS: f32 = 120.0;
pub const DEFAULT_DISCARD_RADIUS: f32 = 80.0;

impl Default for MagneticResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER_RADIUS, DEFAULT_DISCARD_RADIUS)
    }
}

impl MagneticResolver {
    pub fn new(container_radius: f32, discard_radius: f32) -> Self {
        Self {
            containers: Vec::new(),
            discard: None,
            container_radius,
            discard_radius,
        }
    }

    /// Set (or move) a crate's current screen-space center.
    pub fn set_container_center(&mut self, id: ContainerId, center: PointerPos) {
        match self.containers.iter_mut().find(|(cid, _)| *cid == id) {
            Some(entry) => entry.1 = center,
            None => self.containers.push((id, center)),
        }
    }

    pub fn with_container(mut self, id: ContainerId, center: PointerPos) -> Self {
        self.set_container_center(id, center);
        self
    }

    pub fn set_discard_center(&mut self, center: PointerPos) {
        self.discard = Some(center);
    }

    pub fn with_discard(mut self, center: PointerPos) -> Self {
        self.discard = Some(center);
        self
    }

    pub fn container_radius(&self) -> f32 {
        self.container_radius
    }

    pub fn discard_radius(&self) -> f32 {
        self.discard_radius
    }

    pub fn clear(&mut self) {
        self.containers.clear();
        self.discard = None;
    }
}

impl TargetResolver for MagneticResolver {
    fn resolve(&self, pos: PointerPos) -> Target {
        let crates = self
            .containers
            .iter()
            .map(|(id, c)| (Target::Container(*id), pos.distance(*c), self.container_radius));
        let discard = self
            .discard
            .map(|c| (Target::Discard, pos.distance(c), self.discard_radius));

        // Nearest wins; no priority between crates and the bin.
        crates
            .chain(discard)
            .filter(|(_, d, radius)| d < radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(target, _, _)| target)
            .unwrap_or(Target::None)
    }
}

/// Column lookup for the shelf layout: one column per crate, optional discard column.
#[derive(Debug, Clone, PartialEq)]
pub struct ShelfResolver {
    left: f32,
    top: f32,
    bottom: f32,
    column_width: f32,
    columns: Vec<Target>,
}

impl ShelfResolver {
    /// `columns` run left to right starting at `left`; rows `top..bottom` are the shelf.
    pub fn new(left: f32, top: f32, bottom: f32, column_width: f32, columns: Vec<Target>) -> Self {
        Self {
            left,
            top,
            bottom,
            column_width: column_width.max(1.0),
            columns,
        }
    }

    pub fn columns(&self) -> &[Target] {
        &self.columns
    }

    pub fn column_width(&self) -> f32 {
        self.column_width
    }

    /// Left edge of the column holding `target`.
    pub fn column_left(&self, target: Target) -> Option<f32> {
        self.columns
            .iter()
            .position(|t| *t == target)
            .map(|i| self.left + i as f32 * self.column_width)
    }
}

impl TargetResolver for ShelfResolver {
    fn resolve(&self, pos: PointerPos) -> Target {
        if pos.y < self.top || pos.y >= self.bottom || pos.x < self.left {
            return Target::None;
        }
        let col = ((pos.x - self.left) / self.column_width) as usize;
        self.columns.get(col).copied().unwrap_or(Target::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magnetic() -> MagneticResolver {
        MagneticResolver::new(100.0, 50.0)
            .with_container(ContainerId(0), PointerPos::new(0.0, 0.0))
            .with_container(ContainerId(1), PointerPos::new(300.0, 0.0))
            .with_discard(PointerPos::new(150.0, 200.0))
    }

    #[test]
    fn magnetic_picks_nearest_within_radius() {
        let r = magnetic();
        assert_eq!(r.resolve(PointerPos::new(20.0, 10.0)), Target::Container(ContainerId(0)));
        assert_eq!(r.resolve(PointerPos::new(260.0, 0.0)), Target::Container(ContainerId(1)));
        assert_eq!(r.resolve(PointerPos::new(150.0, 0.0)), Target::None);
    }

    #[test]
    fn discard_radius_is_narrower() {
        let r = magnetic();
        assert_eq!(r.resolve(PointerPos::new(150.0, 160.0)), Target::Discard);
        // 60 away: inside a crate radius, outside the bin radius.
        assert_eq!(r.resolve(PointerPos::new(150.0, 140.0)), Target::None);
    }

    #[test]
    fn overlapping_candidates_resolve_by_distance_only() {
        let r = MagneticResolver::new(100.0, 100.0)
            .with_container(ContainerId(0), PointerPos::new(0.0, 0.0))
            .with_discard(PointerPos::new(60.0, 0.0));
        assert_eq!(r.resolve(PointerPos::new(40.0, 0.0)), Target::Discard);
        assert_eq!(r.resolve(PointerPos::new(20.0, 0.0)), Target::Container(ContainerId(0)));
    }

    #[test]
    fn moving_a_center_replaces_it() {
        let mut r = magnetic();
        r.set_container_center(ContainerId(0), PointerPos::new(1_000.0, 1_000.0));
        assert_eq!(r.resolve(PointerPos::new(0.0, 0.0)), Target::None);
    }

    #[test]
    fn shelf_columns() {
        let r = ShelfResolver::new(
            2.0,
            1.0,
            6.0,
            10.0,
            vec![Target::Container(ContainerId(0)), Target::Container(ContainerId(1)), Target::Discard],
        );
        assert_eq!(r.resolve(PointerPos::new(3.0, 2.0)), Target::Container(ContainerId(0)));
        assert_eq!(r.resolve(PointerPos::new(15.0, 5.0)), Target::Container(ContainerId(1)));
        assert_eq!(r.resolve(PointerPos::new(29.0, 5.0)), Target::Discard);
        assert_eq!(r.resolve(PointerPos::new(35.0, 5.0)), Target::None);
        assert_eq!(r.resolve(PointerPos::new(3.0, 6.0)), Target::None);
        assert_eq!(r.resolve(PointerPos::new(1.0, 2.0)), Target::None);
        assert_eq!(r.column_left(Target::Discard), Some(22.0));
    }
}

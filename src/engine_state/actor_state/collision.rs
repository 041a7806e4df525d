//! # Collision Resolution
//!
//! Discrete collision between the actor and the block grid.
//!
//! ## Actor Box
//!
//! The actor is a box whose four horizontal corners sit on a circle of radius
//! `corner_radius` around its position, rotated with its yaw. Vertically it spans
//! `[y - bounding_box_min_y, y + bounding_box_max_y]`. Collision samples are the
//! eight box vertices plus the bottom ring lifted by 0.5 and by 1.0, so thin
//! obstacles at body height are caught as well.
//!
//! ## Overlap Test
//!
//! A block collides when any actor sample lies inside the block's unit box, or any
//! block corner lies inside the actor's axis-aligned bounds. Both tests include
//! the boundary. This is not an exact box-box test; touching counts as a hit.
//!
//! ## Classification
//!
//! Only the 3×3×3 cells around the rounded position are inspected:
//! - cells one level below: diagonal cells are skipped, any other hit is **below**
//! - the cell straight above: **above**
//! - everything else: **sides**
//!
//! Water never collides.
//!
//! ## Movement
//!
//! Every displacement is split into substeps no longer than `substep_length`, so
//! fast movement cannot skip over a block.

use cgmath::{InnerSpace, Point3, Rad, Vector3};

use crate::engine_state::{config::ActorConfig, voxels::BlockLookup};

use super::actor::Actor;

/// Which parts of the actor hit something.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionFlags {
    /// A block beside the actor.
    pub sides: bool,
    /// A block the actor stands on.
    pub below: bool,
    /// The block straight above the actor.
    pub above: bool,
}

impl CollisionFlags {
    /// Whether any hit was recorded.
    pub fn any(self) -> bool {
        self.sides || self.below || self.above
    }

    fn merge(&mut self, other: CollisionFlags) {
        self.sides |= other.sides;
        self.below |= other.below;
        self.above |= other.above;
    }
}

/// The actor's collision volume at one candidate position.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorBox {
    position: Point3<f32>,
    min: Point3<f32>,
    max: Point3<f32>,
    samples: [Point3<f32>; 16],
}

impl ActorBox {
    /// Builds the box for an actor at `position` looking along `yaw`.
    pub fn new(position: Point3<f32>, yaw: Rad<f32>, config: &ActorConfig) -> Self {
        let radius = config.corner_radius;
        let corners: [(f32, f32); 4] = std::array::from_fn(|k| {
            let angle = yaw.0 - std::f32::consts::FRAC_PI_4 - k as f32 * std::f32::consts::FRAC_PI_2;
            (
                position.x + radius * angle.cos(),
                position.z - radius * angle.sin(),
            )
        });

        let bottom = position.y - config.bounding_box_min_y;
        let top = position.y + config.bounding_box_max_y;
        let levels = [bottom, top, bottom + 0.5, bottom + 1.0];
        let samples: [Point3<f32>; 16] = std::array::from_fn(|i| {
            let (x, z) = corners[i % 4];
            Point3::new(x, levels[i / 4], z)
        });

        let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut min_z, mut max_z) = (f32::INFINITY, f32::NEG_INFINITY);
        for (x, z) in corners {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_z = min_z.min(z);
            max_z = max_z.max(z);
        }

        Self {
            position,
            min: Point3::new(min_x, bottom, min_z),
            max: Point3::new(max_x, top, max_z),
            samples,
        }
    }

    /// The actor position the box was built for.
    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    /// Lower corner of the axis-aligned bounds.
    pub fn min(&self) -> Point3<f32> {
        self.min
    }

    /// Upper corner of the axis-aligned bounds.
    pub fn max(&self) -> Point3<f32> {
        self.max
    }

    /// The sixteen collision samples: bottom ring, top ring and the two lifted rings.
    pub fn samples(&self) -> &[Point3<f32>; 16] {
        &self.samples
    }

    fn contains(&self, point: Point3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Two-way overlap test against a unit block centered on `center`.
    pub fn overlaps_block(&self, center: Point3<f32>) -> bool {
        let inside_block = |p: &Point3<f32>| {
            (p.x - center.x).abs() <= 0.5
                && (p.y - center.y).abs() <= 0.5
                && (p.z - center.z).abs() <= 0.5
        };
        if self.samples.iter().any(inside_block) {
            return true;
        }

        [-0.5, 0.5].into_iter().any(|dx| {
            [-0.5, 0.5].into_iter().any(|dy| {
                [-0.5, 0.5]
                    .into_iter()
                    .any(|dz| self.contains(center + Vector3::new(dx, dy, dz)))
            })
        })
    }
}

/// Moves actors through the block grid.
#[derive(Clone, Debug)]
pub struct CollisionResolver {
    config: ActorConfig,
}

impl CollisionResolver {
    /// Creates a resolver for actors with the given dimensions.
    pub fn new(config: ActorConfig) -> Self {
        Self { config }
    }

    /// The actor parameters in use.
    pub fn config(&self) -> &ActorConfig {
        &self.config
    }

    /// The collision box of an actor at `position`.
    pub fn actor_box(&self, position: Point3<f32>, yaw: Rad<f32>) -> ActorBox {
        ActorBox::new(position, yaw, &self.config)
    }

    /// Classifies every block around a candidate box.
    ///
    /// # Arguments
    /// * `candidate` - The actor box at the position being tested
    /// * `grid` - Block lookups by world coordinate
    ///
    /// # Returns
    /// The collision flags; an empty neighborhood yields no hits
    pub fn check_collisions<G: BlockLookup + ?Sized>(
        &self,
        candidate: &ActorBox,
        grid: &G,
    ) -> CollisionFlags {
        let position = candidate.position();
        let (px, py, pz) = (
            position.x.round() as i32,
            position.y.round() as i32,
            position.z.round() as i32,
        );

        let mut flags = CollisionFlags::default();
        for x in px - 1..=px + 1 {
            for y in py - 1..=py + 1 {
                for z in pz - 1..=pz + 1 {
                    let Some(block) = grid.block_at(x, y, z) else {
                        continue;
                    };
                    if block.is_water() {
                        continue;
                    }
                    let below_level = y == py - 1;
                    if below_level && x != px && z != pz {
                        continue;
                    }
                    if !candidate.overlaps_block(block.position) {
                        continue;
                    }

                    if below_level {
                        flags.below = true;
                    } else if x == px && z == pz && y == py + 1 {
                        flags.above = true;
                    } else {
                        flags.sides = true;
                    }
                }
            }
        }
        flags
    }

    /// Integrates one frame of actor movement.
    ///
    /// Forward, strafe and vertical motion are resolved one after another. The
    /// vertical axis rises while a jump is active and falls with gravity otherwise.
    ///
    /// # Arguments
    /// * `actor` - The actor to move
    /// * `forward` - Forward input in `[-1, 1]`
    /// * `strafe` - Sideways input in `[-1, 1]`, positive to the right
    /// * `running` - Whether the running multiplier applies
    /// * `dt` - Frame time in seconds
    /// * `grid` - The block grid to collide with
    ///
    /// # Returns
    /// Every hit recorded during the frame
    pub fn move_actor<G: BlockLookup + ?Sized>(
        &self,
        actor: &mut Actor,
        forward: f32,
        strafe: f32,
        running: bool,
        dt: f32,
        grid: &G,
    ) -> CollisionFlags {
        let mut speed = self.config.walking_speed;
        if running {
            speed *= self.config.running_multiplier;
        }

        let mut flags = CollisionFlags::default();
        let forward_step = actor.forward() * forward * speed * dt;
        flags.merge(self.move_along(actor, forward_step, grid));
        let strafe_step = actor.right() * strafe * speed * dt;
        flags.merge(self.move_along(actor, strafe_step, grid));

        let vertical = if actor.is_jumping {
            self.config.jump_speed * dt
        } else {
            -self.config.gravity * dt
        };
        let vertical_flags = self.move_along(actor, Vector3::new(0.0, vertical, 0.0), grid);
        flags.merge(vertical_flags);
        actor.grounded = vertical_flags.below;

        if actor.is_jumping && actor.position.y - actor.jump_origin_y >= self.config.jump_height {
            actor.is_jumping = false;
        }
        flags
    }

    /// Moves the actor by `displacement` in substeps, resolving hits per substep.
    fn move_along<G: BlockLookup + ?Sized>(
        &self,
        actor: &mut Actor,
        displacement: Vector3<f32>,
        grid: &G,
    ) -> CollisionFlags {
        let mut flags = CollisionFlags::default();
        let length = displacement.magnitude();
        if length == 0.0 {
            return flags;
        }

        let steps = (length / self.config.substep_length).ceil().max(1.0) as usize;
        let step = displacement / steps as f32;

        for _ in 0..steps {
            let start = actor.position;
            let mut candidate = start + step;
            let hit = self.check_collisions(&self.actor_box(candidate, actor.yaw), grid);
            flags.merge(hit);

            let mut sides = hit.sides;
            if hit.below || hit.above {
                if hit.above {
                    actor.is_jumping = false;
                }
                candidate.y = start.y;
                sides = self.collides_sides(candidate, actor.yaw, grid);
            }
            if sides {
                candidate.z = start.z;
                if self.collides_sides(candidate, actor.yaw, grid) {
                    candidate.x = start.x;
                }
            }

            actor.position = candidate;
            if candidate == start {
                break;
            }
        }
        flags
    }

    fn collides_sides<G: BlockLookup + ?Sized>(
        &self,
        position: Point3<f32>,
        yaw: Rad<f32>,
        grid: &G,
    ) -> bool {
        self.check_collisions(&self.actor_box(position, yaw), grid).sides
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    use super::*;
    use crate::engine_state::voxels::block::{block_type::BlockType, Block};

    #[derive(Default)]
    struct Grid(HashMap<(i32, i32, i32), Block>);

    impl Grid {
        fn with_floor() -> Self {
            let mut grid = Grid::default();
            for x in -4..=8 {
                for z in -4..=4 {
                    grid.put(x, 0, z, BlockType::Stone);
                }
            }
            grid
        }

        fn put(&mut self, x: i32, y: i32, z: i32, block_type: BlockType) {
            let position = Point3::new(x as f32, y as f32, z as f32);
            self.0.insert((x, y, z), Block::new(block_type, position));
        }
    }

    impl BlockLookup for Grid {
        fn block_at(&self, x: i32, y: i32, z: i32) -> Option<&Block> {
            self.0.get(&(x, y, z))
        }
    }

    fn resolver() -> CollisionResolver {
        CollisionResolver::new(ActorConfig::default())
    }

    fn actor_at(x: f32, y: f32, z: f32, yaw: f32) -> Actor {
        let mut actor = Actor::new(Point3::new(x, y, z));
        actor.yaw = Rad(yaw);
        actor
    }

    #[test]
    fn box_corners_follow_the_yaw() {
        let actor_box = resolver().actor_box(Point3::new(0.0, 10.0, 0.0), Rad(FRAC_PI_4));
        assert!((actor_box.max().x - 0.3).abs() < 1e-5);
        assert!((actor_box.min().z + 0.3).abs() < 1e-5);
        assert_eq!(actor_box.min().y, 9.0);
        assert!((actor_box.max().y - 10.8).abs() < 1e-5);
        assert_eq!(actor_box.samples()[8].y, 9.5);
        assert_eq!(actor_box.samples()[12].y, 10.0);
    }

    #[test]
    fn classification_and_idempotence() {
        let mut grid = Grid::default();
        grid.put(0, 1, 0, BlockType::Stone);
        grid.put(1, 1, 1, BlockType::Stone);
        grid.put(0, 3, 0, BlockType::Stone);
        grid.put(1, 2, 0, BlockType::Stone);

        let resolver = resolver();
        let candidate = resolver.actor_box(Point3::new(0.3, 2.0, 0.0), Rad(0.0));
        let first = resolver.check_collisions(&candidate, &grid);
        let second = resolver.check_collisions(&candidate, &grid);

        assert_eq!(first, second);
        assert_eq!(
            first,
            CollisionFlags {
                sides: true,
                below: true,
                above: true
            }
        );
    }

    #[test]
    fn water_and_empty_neighborhoods_never_collide() {
        let mut grid = Grid::default();
        grid.put(0, 2, 0, BlockType::Water);
        let resolver = resolver();
        let candidate = resolver.actor_box(Point3::new(0.0, 2.0, 0.0), Rad(0.0));
        assert!(!resolver.check_collisions(&candidate, &grid).any());
        assert!(!resolver.check_collisions(&candidate, &Grid::default()).any());
    }

    #[test]
    fn fast_actor_halts_at_the_block_face() {
        let mut grid = Grid::with_floor();
        grid.put(3, 2, 0, BlockType::Stone);
        let resolver = resolver();
        let mut actor = actor_at(0.0, 1.6, 0.0, FRAC_PI_2);

        // Twenty units in one frame, two hundred substeps.
        resolver.move_actor(&mut actor, 1.0, 0.0, true, 1.0, &grid);

        assert!(actor.position.x > 2.0, "stopped early at {:?}", actor.position);
        assert!(actor.position.x < 2.3, "tunnelled to {:?}", actor.position);
        assert!(actor.grounded);
    }

    #[test]
    fn diagonal_movement_slides_along_a_wall() {
        let mut grid = Grid::with_floor();
        for x in -4..=8 {
            grid.put(x, 2, 1, BlockType::Stone);
        }
        let resolver = resolver();
        let mut actor = actor_at(0.0, 1.6, 0.0, FRAC_PI_4);

        resolver.move_actor(&mut actor, 1.0, 0.0, false, 0.1, &grid);
        let contact = actor.position;
        assert!(contact.z > 0.0 && contact.z + 0.3 < 0.5, "contact at {contact:?}");
        resolver.move_actor(&mut actor, 1.0, 0.0, false, 0.1, &grid);

        // The blocked Z component is dropped, X keeps its full share of the step.
        let dx = actor.position.x - contact.x;
        assert_eq!(actor.position.z, contact.z);
        assert!(dx > 0.7, "slid only {dx}");
    }

    #[test]
    fn diagonal_movement_into_an_inside_corner_stops() {
        let mut grid = Grid::with_floor();
        grid.put(1, 2, 0, BlockType::Stone);
        grid.put(0, 2, 1, BlockType::Stone);
        let resolver = resolver();
        let mut actor = actor_at(0.0, 1.6, 0.0, FRAC_PI_4);

        resolver.move_actor(&mut actor, 1.0, 0.0, false, 0.1, &grid);
        let contact = actor.position;
        assert!(contact.x > 0.0 && contact.z > 0.0, "never reached the corner: {contact:?}");
        resolver.move_actor(&mut actor, 1.0, 0.0, false, 0.1, &grid);

        assert_eq!(actor.position.x - contact.x, 0.0);
        assert_eq!(actor.position.z - contact.z, 0.0);
    }

    #[test]
    fn jump_rises_to_its_height_and_lands() {
        let grid = Grid::with_floor();
        let resolver = resolver();
        let mut actor = actor_at(0.0, 1.6, 0.0, 0.0);

        resolver.move_actor(&mut actor, 0.0, 0.0, false, 0.1, &grid);
        assert!(actor.grounded);
        let origin = actor.position.y;
        assert!(actor.try_jump());
        assert!(!actor.try_jump());

        let mut highest = origin;
        for _ in 0..40 {
            resolver.move_actor(&mut actor, 0.0, 0.0, false, 0.1, &grid);
            highest = highest.max(actor.position.y);
        }

        assert!(highest >= origin + 3.99, "peaked at {highest}");
        assert!(highest <= origin + 5.01, "peaked at {highest}");
        assert!(!actor.is_jumping);
        assert!(actor.grounded);
        assert!((actor.position.y - origin).abs() < 0.1);
    }

    #[test]
    fn ceiling_cancels_a_jump() {
        let mut grid = Grid::with_floor();
        grid.put(0, 4, 0, BlockType::Stone);
        let resolver = resolver();
        let mut actor = actor_at(0.0, 1.6, 0.0, 0.0);

        resolver.move_actor(&mut actor, 0.0, 0.0, false, 0.1, &grid);
        assert!(actor.try_jump());

        let mut highest = actor.position.y;
        let mut hit_ceiling = false;
        for _ in 0..10 {
            let flags = resolver.move_actor(&mut actor, 0.0, 0.0, false, 0.1, &grid);
            hit_ceiling |= flags.above;
            highest = highest.max(actor.position.y);
        }

        assert!(hit_ceiling);
        assert!(highest < 2.7, "passed into the ceiling at {highest}");
        assert!(!actor.is_jumping);
    }
}

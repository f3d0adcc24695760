//! Low-frequency room gain from image sources.
//!
//! The room is a rigid-walled box with `x ∈ [−w/2, w/2]`, `y ∈ [0, h]` and
//! `z ∈ [0, depth]`. The source is mirrored in each of the six walls and in
//! every unordered pair of distinct walls (first one wall, then the other),
//! giving 6 + 15 = 21 reflected paths.

use std::f64::consts::PI;

use crate::environment::Environment;
use crate::geometry::Position;
use crate::math::fnc::sinc;
use crate::math::MIN_DISTANCE;

/// Number of walls of the room box.
const WALLS: usize = 6;

/// One reflected path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePath {
    /// Path length from the image to the listener (m)
    pub length: f64,
    /// Number of reflections
    pub order: u32,
}

/// Boundary reinforcement for one source and one listener.
#[derive(Debug, Clone)]
pub struct RoomSimulation {
    paths: Vec<ImagePath>,
    direct: f64,
    reflection: f64,
    speed_of_sound: f64,
}

/// Mirror a point in wall `wall` of the room.
fn mirror(env: &Environment, wall: usize, p: (f64, f64, f64)) -> (f64, f64, f64) {
    let room = &env.room;
    let (x, y, z) = p;
    match wall {
        0 => (-room.width - x, y, z),
        1 => (room.width - x, y, z),
        2 => (x, -y, z),
        3 => (x, 2.0 * room.height - y, z),
        4 => (x, y, -z),
        _ => (x, y, 2.0 * room.depth - z),
    }
}

impl RoomSimulation {
    pub fn new(env: &Environment, source: &Position, listener: &Position) -> Self {
        let origin = (source.x, source.y, source.z);
        let length = |p: (f64, f64, f64)| {
            let (dx, dy, dz) = (listener.x - p.0, listener.y - p.1, listener.z - p.2);
            (dx * dx + dy * dy + dz * dz).sqrt().max(MIN_DISTANCE)
        };

        let mut paths = Vec::with_capacity(21);
        for wall in 0..WALLS {
            paths.push(ImagePath {
                length: length(mirror(env, wall, origin)),
                order: 1,
            });
        }
        for first in 0..WALLS {
            for second in (first + 1)..WALLS {
                let image = mirror(env, second, mirror(env, first, origin));
                paths.push(ImagePath {
                    length: length(image),
                    order: 2,
                });
            }
        }

        Self {
            paths,
            direct: source.distance(listener).max(MIN_DISTANCE),
            reflection: env.reflection,
            speed_of_sound: env.speed_of_sound,
        }
    }

    pub fn paths(&self) -> &[ImagePath] {
        &self.paths
    }

    /// Pressure gain over free field, never negative.
    pub fn gain(&self, f: f64) -> f64 {
        let k = 2.0 * PI * f / self.speed_of_sound;
        let reflected: f64 = self
            .paths
            .iter()
            .map(|path| {
                self.reflection.powi(path.order as i32) * (self.direct / path.length) * sinc(k * (path.length - self.direct))
            })
            .sum();
        (1.0 + reflected).max(0.0)
    }
}

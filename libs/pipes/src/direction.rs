use nalgebra::{UnitQuaternion, Vector3};
use serde_derive::{Deserialize, Serialize};

use crate::lattice::GridCell;

/// Axis-aligned direction in 3D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Dir {
    /// Declaration order. Turn candidates are enumerated in this order.
    pub const ALL: [Dir; 6] = [Dir::PosX, Dir::NegX, Dir::PosY, Dir::NegY, Dir::PosZ, Dir::NegZ];

    pub fn vec(self) -> GridCell {
        match self {
            Dir::PosX => GridCell::new(1, 0, 0),
            Dir::NegX => GridCell::new(-1, 0, 0),
            Dir::PosY => GridCell::new(0, 1, 0),
            Dir::NegY => GridCell::new(0, -1, 0),
            Dir::PosZ => GridCell::new(0, 0, 1),
            Dir::NegZ => GridCell::new(0, 0, -1),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::PosX => Dir::NegX,
            Dir::NegX => Dir::PosX,
            Dir::PosY => Dir::NegY,
            Dir::NegY => Dir::PosY,
            Dir::PosZ => Dir::NegZ,
            Dir::NegZ => Dir::PosZ,
        }
    }

    pub fn dot(self, o: Dir) -> i32 {
        let (a, b) = (self.vec(), o.vec());
        a.x * b.x + a.y * b.y + a.z * b.z
    }

    pub fn is_perpendicular(self, o: Dir) -> bool {
        self.dot(o) == 0
    }

    /// The four directions perpendicular to `self`, in declaration order.
    pub fn perpendiculars(self) -> [Dir; 4] {
        let mut out = [self; 4];
        let mut n = 0;
        for d in Dir::ALL {
            if self.is_perpendicular(d) {
                out[n] = d;
                n += 1;
            }
        }
        debug_assert_eq!(n, 4);
        out
    }

    pub fn random(rng: &mut oorandom::Rand32) -> Dir {
        Dir::ALL[rng.rand_range(0..6) as usize]
    }

    /// Unit vector in world space.
    pub fn world(self) -> Vector3<f32> {
        let v = self.vec();
        Vector3::new(v.x as f32, v.y as f32, v.z as f32)
    }

    /// Rotation taking world up (+Y) onto this direction; segment meshes are modelled along +Y.
    pub fn rotation(self) -> UnitQuaternion<f32> {
        // rotation_between has no unique answer for antiparallel vectors.
        UnitQuaternion::rotation_between(&Vector3::y(), &self.world()).unwrap_or_else(|| {
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI)
        })
    }
}

/// Order in which turn candidates are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrder {
    /// Perpendiculars in declaration order. Biased towards the earlier axes.
    #[default]
    Declaration,
    /// Perpendiculars shuffled with the field's RNG on every turn.
    Shuffled,
}

impl TurnOrder {
    pub fn candidates(self, dir: Dir, rng: &mut oorandom::Rand32) -> [Dir; 4] {
        let mut dirs = dir.perpendiculars();
        if self == TurnOrder::Shuffled {
            for i in (1..dirs.len()).rev() {
                let j = rng.rand_range(0..(i as u32 + 1)) as usize;
                dirs.swap(i, j);
            }
        }
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perpendiculars_exclude_axis() {
        for d in Dir::ALL {
            let perp = d.perpendiculars();
            assert!(!perp.contains(&d));
            assert!(!perp.contains(&d.opposite()));
            for p in perp {
                assert_eq!(d.dot(p), 0);
            }
        }
        assert_eq!(
            Dir::PosX.perpendiculars(),
            [Dir::PosY, Dir::NegY, Dir::PosZ, Dir::NegZ]
        );
    }

    #[test]
    fn test_dot_with_self_and_opposite() {
        for d in Dir::ALL {
            assert_eq!(d.dot(d), 1);
            assert_eq!(d.dot(d.opposite()), -1);
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn test_rotation_maps_up_onto_direction() {
        for d in Dir::ALL {
            let up = d.rotation() * Vector3::y();
            assert!((up - d.world()).norm() < 1e-5, "{:?} -> {:?}", d, up);
        }
    }

    #[test]
    fn test_shuffled_candidates_are_a_permutation() {
        let mut rng = oorandom::Rand32::new(42);
        for _ in 0..50 {
            let mut shuffled = TurnOrder::Shuffled.candidates(Dir::PosZ, &mut rng).to_vec();
            let mut expected = Dir::PosZ.perpendiculars().to_vec();
            shuffled.sort_by_key(|d| *d as u8);
            expected.sort_by_key(|d| *d as u8);
            assert_eq!(shuffled, expected);
        }
    }
}

//! Velocity axes and command triplets.

/// Lower/upper bound of every dispatched axis value.
pub const CMD_LIMIT: f32 = 1.0;

/// Clamp to [-1, 1]. Non-finite inputs map to 0.0.
#[inline]
pub fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(-CMD_LIMIT, CMD_LIMIT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Forward/back
    Vx,
    /// Lateral strafe
    Vy,
    /// Yaw rate
    Wz,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Vx, Axis::Vy, Axis::Wz];

    pub fn name(self) -> &'static str {
        match self {
            Axis::Vx => "vx",
            Axis::Vy => "vy",
            Axis::Wz => "wz",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered `(vx, vy, wz)` triplet.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VelocityCommand {
    pub vx: f32,
    pub vy: f32,
    pub wz: f32,
}

impl VelocityCommand {
    pub const ZERO: Self = Self {
        vx: 0.0,
        vy: 0.0,
        wz: 0.0,
    };

    pub fn new(vx: f32, vy: f32, wz: f32) -> Self {
        Self { vx, vy, wz }
    }

    #[inline]
    pub fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Vx => self.vx,
            Axis::Vy => self.vy,
            Axis::Wz => self.wz,
        }
    }

    #[inline]
    pub fn set(&mut self, axis: Axis, v: f32) {
        match axis {
            Axis::Vx => self.vx = v,
            Axis::Vy => self.vy = v,
            Axis::Wz => self.wz = v,
        }
    }

    /// Every axis clamped to [-1, 1].
    pub fn clamped(self) -> Self {
        Self {
            vx: clamp_unit(self.vx),
            vy: clamp_unit(self.vy),
            wz: clamp_unit(self.wz),
        }
    }

    /// Largest absolute axis value.
    pub fn max_abs(&self) -> f32 {
        self.vx.abs().max(self.vy.abs()).max(self.wz.abs())
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Per-axis command magnitude used when a key asserts an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scales {
    pub vx: f32,
    pub vy: f32,
    pub wz: f32,
}

impl Default for Scales {
    fn default() -> Self {
        Self {
            vx: 0.7,
            vy: 0.6,
            wz: 0.7,
        }
    }
}

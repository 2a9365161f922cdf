//! Machine configuration for the [`super::Chip8`].

/// How sprite pixels that fall past the right or bottom edge of the display
/// are handled by `Dxyn`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SpriteEdge {
    /// The starting coordinate wraps onto the display, and any pixels past
    /// the edge from there are dropped.
    #[default]
    Clip,

    /// Every pixel wraps around to the opposite edge.
    Wrap,

    /// Any pixel past an edge halts the machine.
    Reject,
}

/// Settings that are fixed for the lifetime of a [`super::Chip8`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Edge handling for sprite drawing.
    pub sprite_edge: SpriteEdge,

    /// Seed for the `Cxnn` random number generator. When `None`, the
    /// generator is seeded from the operating system.
    pub rng_seed: Option<u64>,
}

impl Config {
    /// Returns a copy of this config with the given RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Returns a copy of this config with the given sprite edge policy.
    #[must_use]
    pub fn with_sprite_edge(mut self, sprite_edge: SpriteEdge) -> Self {
        self.sprite_edge = sprite_edge;
        self
    }
}

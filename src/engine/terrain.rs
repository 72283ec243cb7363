// Island terrain: fractal noise shaped by a radial falloff, coloured by biome.
//
// The grid spans `size` world units centred on the origin, one sample per unit
// cell corner. A second noise field (seed + 1) wobbles the biome thresholds so
// the borders between bands are not perfect contour lines.

use glam::Vec3;

use super::components::Tint;
use super::config::TerrainConfig;
use super::mesh::PolyMesh;
use super::noise::NoiseField;

const JITTER_FREQUENCY: f32 = 0.1;
const JITTER_OCTAVES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Biome {
    Water,
    Sand,
    Grass,
    Forest,
    Mountain,
    Snow,
}

impl Biome {
    /// Band for a height, before jitter. Upper bounds are exclusive.
    pub fn from_height(height: f32) -> Self {
        match height {
            h if h < 1.0 => Biome::Sand,
            h if h < 5.0 => Biome::Grass,
            h if h < 10.0 => Biome::Forest,
            h if h < 15.0 => Biome::Mountain,
            _ => Biome::Snow,
        }
    }

    pub fn color(self) -> Tint {
        match self {
            Biome::Water => Tint::hex(0x006994),
            Biome::Sand => Tint::from_hsl(0.12, 0.4, 0.7),
            Biome::Grass => Tint::from_hsl(0.25, 0.8, 0.4),
            Biome::Forest => Tint::from_hsl(0.2, 0.9, 0.3),
            Biome::Mountain => Tint::from_hsl(0.08, 0.6, 0.4),
            Biome::Snow => Tint::from_hsl(0.0, 0.0, 0.9),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainCell {
    pub height: f32,
    pub biome: Biome,
    pub color: Tint,
}

/// Square grid of samples, row-major with `z` as the row.
#[derive(Debug, Clone)]
pub struct Heightmap {
    size: usize,
    cells: Vec<TerrainCell>,
    max_height: f32,
}

impl Heightmap {
    /// Samples per side.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    pub fn cell(&self, ix: usize, iz: usize) -> Option<&TerrainCell> {
        if ix >= self.size || iz >= self.size {
            return None;
        }
        self.cells.get(iz * self.size + ix)
    }

    pub fn cells(&self) -> &[TerrainCell] {
        &self.cells
    }

    /// World-space coordinate of a grid index on one axis.
    pub fn coordinate(&self, index: usize) -> f32 {
        grid_coordinate(index, self.size)
    }

    /// Vertex-coloured grid mesh, two triangles per cell.
    pub fn to_poly_mesh(&self) -> PolyMesh {
        let mut mesh = PolyMesh::new();
        for iz in 0..self.size {
            for ix in 0..self.size {
                let cell = &self.cells[iz * self.size + ix];
                let pos = Vec3::new(self.coordinate(ix), cell.height, self.coordinate(iz));
                mesh.add_colored_vertex(pos, [cell.color.r, cell.color.g, cell.color.b]);
            }
        }
        let row = self.size;
        let quads = self.size.saturating_sub(1);
        for iz in 0..quads {
            for ix in 0..quads {
                let a = iz * row + ix;
                let b = (iz + 1) * row + ix;
                mesh.add_face(vec![a, b, b + 1]);
                mesh.add_face(vec![a, b + 1, a + 1]);
            }
        }
        mesh
    }
}

fn grid_coordinate(index: usize, size: usize) -> f32 {
    let span = size.saturating_sub(1).max(1) as f32;
    (index as f32 / span) * size as f32 - size as f32 * 0.5
}

pub struct TerrainGenerator {
    config: TerrainConfig,
    height_field: NoiseField,
    jitter_field: NoiseField,
}

impl TerrainGenerator {
    pub fn new(config: TerrainConfig, seed: u64) -> Self {
        let height_field = NoiseField::with_base_frequency(seed, config.base_frequency);
        let jitter_field = NoiseField::with_base_frequency(seed.wrapping_add(1), JITTER_FREQUENCY);
        Self { config, height_field, jitter_field }
    }

    pub fn seed(&self) -> u64 {
        self.height_field.seed()
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Swap in fresh noise fields; the next `generate` makes a new island.
    pub fn reseed(&mut self, seed: u64) {
        self.height_field = NoiseField::with_base_frequency(seed, self.config.base_frequency);
        self.jitter_field = NoiseField::with_base_frequency(seed.wrapping_add(1), JITTER_FREQUENCY);
        log::info!("terrain reseeded with {seed}");
    }

    pub fn falloff_radius(&self) -> f32 {
        self.config.size as f32 * self.config.falloff_ratio
    }

    /// Height and biome at world position (x, z).
    pub fn sample(&self, x: f32, z: f32) -> TerrainCell {
        let cfg = &self.config;
        let distance = x.hypot(z);
        let radius = self.falloff_radius();

        if distance > radius * cfg.water_cutoff {
            return TerrainCell {
                height: cfg.sea_level,
                biome: Biome::Water,
                color: Biome::Water.color(),
            };
        }

        let n = self.height_field.fractal_noise2d(x, z, cfg.octaves);
        let falloff = (1.0 - distance / radius).max(0.0);
        let height = (n + 1.0) * 0.5 * cfg.height_scale * falloff * falloff;

        let jitter = self.jitter_field.fractal_noise2d(x, z, JITTER_OCTAVES).clamp(-1.0, 1.0)
            * cfg.border_jitter;
        let biome = Biome::from_height(height + jitter);
        TerrainCell { height, biome, color: biome.color() }
    }

    pub fn generate(&self) -> Heightmap {
        let size = self.config.size;
        let mut cells = Vec::with_capacity(size * size);
        let mut max_height = 0.0f32;
        for iz in 0..size {
            for ix in 0..size {
                let cell = self.sample(grid_coordinate(ix, size), grid_coordinate(iz, size));
                max_height = max_height.max(cell.height);
                cells.push(cell);
            }
        }
        log::debug!("generated {size}x{size} island, max height {max_height:.2}");
        Heightmap { size, cells, max_height }
    }
}

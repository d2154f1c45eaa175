/// Per-pixel quality measures for exposure fusion
///
/// Each source image gets one scalar weight per pixel, the product of
/// contrast, saturation and well-exposedness each raised to its
/// configured exponent. Weights are then normalized across the stack.
use super::pyramid::Plane;
use crate::config::FusionConfig;

/// Per-pixel weights for a single source image
#[derive(Debug, Clone)]
pub struct WeightMap {
    pub width: usize,
    pub height: usize,
    pub weights: Vec<f32>,
}

impl WeightMap {
    pub fn into_plane(self) -> Plane {
        Plane::from_data(self.width, self.height, 1, self.weights)
    }
}

/// Weights below this are treated as zero when normalizing
pub const WEIGHT_EPSILON: f32 = 1e-12;

/// Reflect-101 border: `-1 -> 1`, `n -> n - 2`
fn reflect(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * n - 2 - i;
        }
    }
    i as usize
}

/// Grayscale view of a [0,1] plane using BT.601 weights
pub fn luma(plane: &Plane) -> Vec<f32> {
    match plane.channels {
        3 => plane
            .data
            .chunks_exact(3)
            .map(|rgb| 0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2])
            .collect(),
        _ => plane.data.iter().step_by(plane.channels.max(1)).copied().collect(),
    }
}

/// |4-neighbour Laplacian| of the luma channel
pub fn contrast(plane: &Plane) -> Vec<f32> {
    let (width, height) = (plane.width, plane.height);
    let gray = luma(plane);
    let mut scores = vec![0.0; width * height];

    for y in 0..height {
        for x in 0..width {
            let centre = gray[y * width + x];
            let mut neighbours = 0.0;
            for (dy, dx) in [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)] {
                let ny = reflect(y as isize + dy, height);
                let nx = reflect(x as isize + dx, width);
                neighbours += gray[ny * width + nx];
            }
            scores[y * width + x] = (neighbours - 4.0 * centre).abs();
        }
    }

    scores
}

/// Standard deviation across channels; gray planes score 1 everywhere
pub fn saturation(plane: &Plane) -> Vec<f32> {
    let ch = plane.channels;
    if ch < 2 {
        return vec![1.0; plane.pixel_count()];
    }
    plane
        .data
        .chunks_exact(ch)
        .map(|px| {
            let mean = px.iter().sum::<f32>() / ch as f32;
            let variance = px.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / ch as f32;
            variance.sqrt()
        })
        .collect()
}

/// Product over channels of a Gaussian centred on mid-gray
pub fn well_exposedness(plane: &Plane, sigma: f32) -> Vec<f32> {
    let denom = 2.0 * sigma * sigma;
    plane
        .data
        .chunks_exact(plane.channels)
        .map(|px| {
            px.iter()
                .map(|v| (-(v - 0.5).powi(2) / denom).exp())
                .product()
        })
        .collect()
}

/// Combined quality weight for one [0,1] plane
pub fn compute_weight_map(plane: &Plane, config: &FusionConfig) -> WeightMap {
    let contrast = contrast(plane);
    let saturation = saturation(plane);
    let exposedness = well_exposedness(plane, config.exposedness_sigma);

    let weights = contrast
        .iter()
        .zip(&saturation)
        .zip(&exposedness)
        .map(|((&c, &s), &e)| {
            c.powf(config.contrast_weight)
                * s.powf(config.saturation_weight)
                * e.powf(config.exposedness_weight)
        })
        .collect();

    WeightMap {
        width: plane.width,
        height: plane.height,
        weights,
    }
}

/// Scale weights so they sum to one per pixel across the stack
///
/// Pixels where every weight is (near) zero get equal shares.
pub fn normalize_weight_maps(maps: &mut [WeightMap]) {
    let Some(first) = maps.first() else { return };
    let pixel_count = first.weights.len();
    let equal_weight = 1.0 / maps.len() as f32;

    for pixel_idx in 0..pixel_count {
        let sum: f32 = maps.iter().map(|m| m.weights[pixel_idx]).sum();

        if sum > WEIGHT_EPSILON && sum.is_finite() {
            for map in maps.iter_mut() {
                map.weights[pixel_idx] /= sum;
            }
        } else {
            for map in maps.iter_mut() {
                map.weights[pixel_idx] = equal_weight;
            }
        }
    }
}

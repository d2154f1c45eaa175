/// Gaussian and Laplacian pyramids over floating-point planes
///
/// Levels are built iteratively into a `Vec`, finest first. Reduction
/// blurs with the 5-tap binomial kernel [1 4 6 4 1]/16 and keeps every
/// other sample (`(n + 1) / 2`); expansion interpolates back with the
/// same kernel. Taps falling outside the image are dropped and the
/// remaining weights renormalized, so constant planes stay constant at
/// every level and a pyramid of weights that sums to one across images
/// still sums to one at each level.

const KERNEL: [f32; 5] = [1.0, 4.0, 6.0, 4.0, 1.0];

/// Interleaved `f32` image buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl Plane {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0.0; width * height * channels],
        }
    }

    pub fn from_data(width: usize, height: usize, channels: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height * channels);
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Element-wise `self - other`; shapes must match
    fn subtract(&self, other: &Plane) -> Plane {
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();
        Plane::from_data(self.width, self.height, self.channels, data)
    }

    /// Element-wise `self += other`; shapes must match
    fn accumulate(&mut self, other: &Plane) {
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }
}

/// Per-output list of `(source index, normalized weight)`
type Taps = Vec<Vec<(usize, f32)>>;

fn normalized(taps: Vec<(usize, f32)>) -> Vec<(usize, f32)> {
    let sum: f32 = taps.iter().map(|(_, w)| w).sum();
    taps.into_iter().map(|(i, w)| (i, w / sum)).collect()
}

/// Output `i` is centred on source sample `2i`
fn reduce_taps(src_len: usize) -> Taps {
    let dst_len = src_len.div_ceil(2);
    (0..dst_len)
        .map(|i| {
            let centre = 2 * i as isize;
            normalized(
                (-2isize..=2)
                    .filter_map(|d| {
                        let s = centre + d;
                        (s >= 0 && (s as usize) < src_len)
                            .then(|| (s as usize, KERNEL[(d + 2) as usize]))
                    })
                    .collect(),
            )
        })
        .collect()
}

/// Source sample `k` sits at output position `2k`
fn expand_taps(src_len: usize, dst_len: usize) -> Taps {
    (0..dst_len)
        .map(|x| {
            let x = x as isize;
            normalized(
                (-2isize..=2)
                    .filter_map(|d| {
                        let pos = x + d;
                        if pos < 0 || pos % 2 != 0 {
                            return None;
                        }
                        let k = (pos / 2) as usize;
                        (k < src_len).then(|| (k, KERNEL[(2 - d) as usize]))
                    })
                    .collect(),
            )
        })
        .collect()
}

fn resample_horizontal(src: &Plane, taps: &Taps) -> Plane {
    let ch = src.channels;
    let mut dst = Plane::new(taps.len(), src.height, ch);
    for y in 0..src.height {
        let src_row = &src.data[y * src.width * ch..(y + 1) * src.width * ch];
        let dst_row = &mut dst.data[y * dst.width * ch..(y + 1) * dst.width * ch];
        for (x, row_taps) in taps.iter().enumerate() {
            for c in 0..ch {
                dst_row[x * ch + c] = row_taps
                    .iter()
                    .map(|&(s, w)| src_row[s * ch + c] * w)
                    .sum();
            }
        }
    }
    dst
}

fn resample_vertical(src: &Plane, taps: &Taps) -> Plane {
    let row_len = src.width * src.channels;
    let mut dst = Plane::new(src.width, taps.len(), src.channels);
    for (y, col_taps) in taps.iter().enumerate() {
        let dst_row = &mut dst.data[y * row_len..(y + 1) * row_len];
        for &(s, w) in col_taps {
            let src_row = &src.data[s * row_len..(s + 1) * row_len];
            for (d, v) in dst_row.iter_mut().zip(src_row) {
                *d += v * w;
            }
        }
    }
    dst
}

/// Blur and halve each dimension
pub fn pyr_down(src: &Plane) -> Plane {
    let horizontal = resample_horizontal(src, &reduce_taps(src.width));
    resample_vertical(&horizontal, &reduce_taps(src.height))
}

/// Interpolate up to `width` x `height` (at most double each dimension)
pub fn pyr_up(src: &Plane, width: usize, height: usize) -> Plane {
    let horizontal = resample_horizontal(src, &expand_taps(src.width, width));
    resample_vertical(&horizontal, &expand_taps(src.height, height))
}

/// Number of reductions a `width` x `height` image supports
///
/// `floor(log2(min(width, height)))`, optionally capped.
pub fn max_levels(width: usize, height: usize, cap: Option<u32>) -> usize {
    let smallest = width.min(height);
    let levels = if smallest == 0 {
        0
    } else {
        smallest.ilog2() as usize
    };
    match cap {
        Some(cap) => levels.min(cap as usize),
        None => levels,
    }
}

/// Gaussian pyramid with `extra_levels` reductions above the base
pub fn gaussian_pyramid(base: Plane, extra_levels: usize) -> Vec<Plane> {
    let mut pyramid = Vec::with_capacity(extra_levels + 1);
    pyramid.push(base);
    for _ in 0..extra_levels {
        let Some(finer) = pyramid.last() else { break };
        let coarser = pyr_down(finer);
        pyramid.push(coarser);
    }
    pyramid
}

/// Band-pass detail per level plus the coarsest Gaussian level
pub fn laplacian_pyramid(base: Plane, extra_levels: usize) -> Vec<Plane> {
    let gaussian = gaussian_pyramid(base, extra_levels);
    let mut laplacian = Vec::with_capacity(gaussian.len());
    for pair in gaussian.windows(2) {
        let (fine, coarse) = (&pair[0], &pair[1]);
        let expanded = pyr_up(coarse, fine.width, fine.height);
        laplacian.push(fine.subtract(&expanded));
    }
    if let Some(residual) = gaussian.last() {
        laplacian.push(residual.clone());
    }
    laplacian
}

/// Sum levels from coarsest to finest
pub fn collapse(mut pyramid: Vec<Plane>) -> Option<Plane> {
    let mut current = pyramid.pop()?;
    while let Some(mut finer) = pyramid.pop() {
        let expanded = pyr_up(&current, finer.width, finer.height);
        finer.accumulate(&expanded);
        current = finer;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize, channels: usize) -> Plane {
        let data = (0..width * height * channels)
            .map(|i| ((i * 37) % 101) as f32 / 100.0)
            .collect();
        Plane::from_data(width, height, channels, data)
    }

    #[test]
    fn test_downsample_dimensions() {
        let plane = Plane::new(101, 50, 3);
        let down = pyr_down(&plane);
        assert_eq!((down.width, down.height, down.channels), (51, 25, 3));
        assert_eq!(down.data.len(), 51 * 25 * 3);
    }

    #[test]
    fn test_constant_plane_stays_constant() {
        let plane = Plane::from_data(7, 5, 1, vec![0.25; 35]);
        let down = pyr_down(&plane);
        assert!(down.data.iter().all(|v| (v - 0.25).abs() < 1e-6));

        let up = pyr_up(&down, 7, 5);
        assert!(up.data.iter().all(|v| (v - 0.25).abs() < 1e-6));
    }

    #[test]
    fn test_expand_single_pixel() {
        let plane = Plane::from_data(1, 1, 1, vec![0.5]);
        let up = pyr_up(&plane, 2, 1);
        assert_eq!(up.data, vec![0.5, 0.5]);
    }

    #[test]
    fn test_max_levels() {
        assert_eq!(max_levels(64, 48, None), 5);
        assert_eq!(max_levels(64, 48, Some(3)), 3);
        assert_eq!(max_levels(1, 100, None), 0);
        assert_eq!(max_levels(0, 100, None), 0);
    }

    #[test]
    fn test_laplacian_round_trip() {
        let plane = ramp(23, 17, 3);
        let levels = max_levels(23, 17, None);
        let pyramid = laplacian_pyramid(plane.clone(), levels);
        assert_eq!(pyramid.len(), levels + 1);

        let rebuilt = collapse(pyramid).unwrap();
        assert_eq!((rebuilt.width, rebuilt.height), (23, 17));
        for (a, b) in rebuilt.data.iter().zip(&plane.data) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_pyramid_sizes_shrink_to_one() {
        let pyramid = gaussian_pyramid(Plane::new(16, 9, 1), max_levels(16, 9, None));
        let sizes: Vec<(usize, usize)> = pyramid.iter().map(|p| (p.width, p.height)).collect();
        assert_eq!(sizes, vec![(16, 9), (8, 5), (4, 3), (2, 2)]);
    }

    #[test]
    fn test_collapse_empty() {
        assert!(collapse(Vec::new()).is_none());
    }
}

/// Multiresolution blending of an exposure stack
use super::pyramid::{collapse, gaussian_pyramid, laplacian_pyramid, max_levels, Plane};
use super::weights::{compute_weight_map, normalize_weight_maps, WeightMap};
use super::{FusionReport, MIN_FUSION_INPUTS};
use crate::config::FusionConfig;
use crate::errors::BracketError;
use crate::types::Raster;

/// Fuse an exposure stack ordered by increasing exposure
pub fn fuse(images: &[Raster], config: &FusionConfig) -> Result<Raster, BracketError> {
    fuse_with_report(images, config).map(|(image, _)| image)
}

/// Fuse and report the pyramid depth used
pub fn fuse_with_report(
    images: &[Raster],
    config: &FusionConfig,
) -> Result<(Raster, FusionReport), BracketError> {
    validate_inputs(images)?;

    let reference = &images[0];
    let width = reference.width as usize;
    let height = reference.height as usize;
    let levels = max_levels(width, height, config.max_levels);

    log::info!(
        "Fusing {} exposures at {}x{} with {} pyramid levels",
        images.len(),
        width,
        height,
        levels + 1
    );

    let planes: Vec<Plane> = images.iter().map(to_unit_plane).collect();

    log::debug!("Computing weight maps");
    let mut weight_maps: Vec<WeightMap> = planes
        .iter()
        .map(|plane| compute_weight_map(plane, config))
        .collect();
    normalize_weight_maps(&mut weight_maps);

    log::debug!("Building pyramids");
    let weight_pyramids: Vec<Vec<Plane>> = weight_maps
        .into_iter()
        .map(|map| gaussian_pyramid(map.into_plane(), levels))
        .collect();
    let laplacian_pyramids: Vec<Vec<Plane>> = planes
        .into_iter()
        .map(|plane| laplacian_pyramid(plane, levels))
        .collect();

    log::debug!("Blending pyramids");
    let blended = blend_pyramids(&laplacian_pyramids, &weight_pyramids);

    log::debug!("Reconstructing from pyramid");
    let fused = collapse(blended).ok_or_else(|| BracketError::InsufficientInputs {
        required: MIN_FUSION_INPUTS,
        provided: 0,
    })?;

    let data = fused
        .data
        .iter()
        .map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect();

    let report = FusionReport {
        sources: images.len(),
        levels: levels + 1,
    };
    log::info!("Fusion complete");

    Ok((
        Raster {
            width: reference.width,
            height: reference.height,
            layout: reference.layout,
            data,
        },
        report,
    ))
}

fn validate_inputs(images: &[Raster]) -> Result<(), BracketError> {
    if images.len() < MIN_FUSION_INPUTS {
        return Err(BracketError::InsufficientInputs {
            required: MIN_FUSION_INPUTS,
            provided: images.len(),
        });
    }

    let reference = &images[0];
    if reference.is_empty() {
        return Err(BracketError::EmptyImage {
            width: reference.width,
            height: reference.height,
        });
    }

    for image in images {
        if image.shape() != reference.shape() {
            return Err(BracketError::DimensionMismatch {
                expected: reference.shape(),
                got: image.shape(),
            });
        }
        let expected_len = image.pixel_count() * image.channels();
        if image.data.len() != expected_len {
            return Err(BracketError::DataCorruption {
                data_len: image.data.len(),
                expected_len,
            });
        }
    }

    Ok(())
}

/// Scale 8-bit samples to [0,1]
fn to_unit_plane(image: &Raster) -> Plane {
    let data = image.data.iter().map(|&v| v as f32 / 255.0).collect();
    Plane::from_data(
        image.width as usize,
        image.height as usize,
        image.channels(),
        data,
    )
}

/// Per level, sum each source's detail scaled by its weight
fn blend_pyramids(laplacians: &[Vec<Plane>], weights: &[Vec<Plane>]) -> Vec<Plane> {
    let num_levels = laplacians[0].len();
    let mut blended = Vec::with_capacity(num_levels);

    for level in 0..num_levels {
        let template = &laplacians[0][level];
        let ch = template.channels;
        let mut out = Plane::new(template.width, template.height, ch);

        for (laplacian, weight) in laplacians.iter().zip(weights) {
            let detail = &laplacian[level];
            let w = &weight[level];
            for (pixel_idx, &pixel_weight) in w.data.iter().enumerate() {
                let base = pixel_idx * ch;
                for c in 0..ch {
                    out.data[base + c] += pixel_weight * detail.data[base + c];
                }
            }
        }

        blended.push(out);
    }

    blended
}

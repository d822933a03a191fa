// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
 * Splitting an image's field of view into smaller tiles, each with its own
 * phase centre.
 */

use itertools::Itertools;
use thiserror::Error;

use crate::RaDec;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TilingError {
    #[error("The tile size must be bigger than 0")]
    ZeroTileSize,

    #[error("The image size must be bigger than 0")]
    ZeroImageSize,

    #[error("The pixel size must be a positive number of degrees (got {0})")]
    BadPixelSize(f64),
}

/// Get the phase centres of all the tiles covering a square image of
/// `img_size` pixels per side, centred on `centre`. Tiles are `tile_size`
/// pixels per side; if the image size isn't a multiple of the tile size, the
/// last row and column of tiles extend past the edge of the image.
///
/// Pixel (0, 0) is the top-left corner of the image (smallest RA, largest
/// Dec). The tiles are ordered by their x pixel coordinate first, then y.
pub fn compute_tiling(
    centre: RaDec,
    img_size: u32,
    tile_size: u32,
    pix_size_deg: f64,
) -> Result<Vec<RaDec>, TilingError> {
    if tile_size == 0 {
        return Err(TilingError::ZeroTileSize);
    }
    if img_size == 0 {
        return Err(TilingError::ZeroImageSize);
    }
    if !(pix_size_deg > 0.0 && pix_size_deg.is_finite()) {
        return Err(TilingError::BadPixelSize(pix_size_deg));
    }

    let img_centre_pixel = (img_size / 2) as f64;
    let n_tiles = (img_size + tile_size - 1) / tile_size;

    let px0_ra = centre.ra - img_centre_pixel * pix_size_deg;
    let px0_dec = centre.dec + img_centre_pixel * pix_size_deg;

    let tile_centre = |t: u32| (t * tile_size + tile_size / 2) as f64;
    let tiles = (0..n_tiles)
        .cartesian_product(0..n_tiles)
        .map(|(x, y)| RaDec {
            ra: px0_ra + tile_centre(x) * pix_size_deg,
            dec: px0_dec - tile_centre(y) * pix_size_deg,
        })
        .collect();
    Ok(tiles)
}

pub mod raw;
pub mod table;

use std::path::Path;

use crate::image::Image;
use crate::regions::RegionSet;
use crate::{Error, Result};

use raw::{Image3D, Mask4D};

pub fn read_pet(path: &Path) -> Result<Image> {
    Image3D::read_from_file(path)
        .map_err(|source| Error::InputRead { what: "PET", path: path.into(), source })?
        .into_image()
}

/// Read a 4D stack of indicator maps, one 3D block per region
pub fn read_mask(path: &Path) -> Result<RegionSet> {
    Mask4D::read_from_file(path)
        .map_err(|source| Error::InputRead { what: "mask", path: path.into(), source })?
        .into_regions()
}

/// Read a 3D image of integer labels, where each distinct non-zero label is
/// a region
pub fn read_labels(path: &Path) -> Result<RegionSet> {
    let labels = Image3D::read_from_file(path)
        .map_err(|source| Error::InputRead { what: "label mask", path: path.into(), source })?
        .into_image()?;
    RegionSet::from_labels(&labels)
}

pub fn write_image(image: &Image, path: &Path) -> Result<()> {
    Image3D::from_image(image)?
        .write_to_file(path)
        .map_err(|source| Error::Output { path: path.into(), source })
}

pub fn write_mask(regions: &RegionSet, path: &Path) -> Result<()> {
    Mask4D::from_regions(regions)?
        .write_to_file(path)
        .map_err(|source| Error::Output { path: path.into(), source })
}

/// Read / write volumes as raw big-endian binary with a small header
///
/// Layouts, after a four-byte magic:
///
/// + `GTM3`: `[u16; 3]` voxels per axis, `[f32; 3]` voxel size in mm, then
///   one `f32` per voxel, x varying fastest
///
/// + `GTM4`: as `GTM3` but with a `u16` region count after the voxel counts;
///   the data are that many consecutive 3D blocks, one per region

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use binrw::{binrw, BinRead, BinResult, BinWrite};

use units::mm3_;

use crate::fov::FOV;
use crate::image::Image;
use crate::regions::RegionSet;
use crate::{Error, Result};

#[binrw]
#[brw(big, magic = b"GTM3")]
#[derive(Clone, Debug, PartialEq)]
pub struct Image3D {
    pub pixels: [u16; 3],
    pub mm: [f32; 3],
    #[br(count = count(pixels, 1))]
    pub data: Vec<f32>,
}

#[binrw]
#[brw(big, magic = b"GTM4")]
#[derive(Clone, Debug, PartialEq)]
pub struct Mask4D {
    pub pixels: [u16; 3],
    pub regions: u16,
    pub mm: [f32; 3],
    #[br(count = count(pixels, regions))]
    pub data: Vec<f32>,
}

fn count(pixels: [u16; 3], blocks: u16) -> usize {
    pixels.iter().map(|&n| n as usize).product::<usize>() * blocks as usize
}

/// Fail if anything remains after the declared data: the header lies about
/// the size
fn ensure_consumed(file: &mut impl Read) -> BinResult<()> {
    let mut extra = [0_u8; 1];
    if file.read(&mut extra)? != 0 {
        return Err(binrw::Error::AssertFail {
            pos: 0,
            message: "file is longer than its header declares".into(),
        });
    }
    Ok(())
}

fn pixels_u16(fov: &FOV) -> Result<[u16; 3]> {
    let mut pixels = [0; 3];
    for (p, &n) in pixels.iter_mut().zip(fov.n.iter()) {
        *p = u16::try_from(n).map_err(|_| Error::DimensionMismatch(format!(
            "grid {} too large for the raw volume format", fov.describe()
        )))?;
    }
    Ok(pixels)
}

fn fov_from_header(pixels: [u16; 3], mm: [f32; 3]) -> FOV {
    let [nx, ny, nz] = pixels;
    FOV::from_mm([nx as usize, ny as usize, nz as usize], mm)
}

impl Image3D {
    pub fn read_from_file(path: &Path) -> BinResult<Self> {
        let mut file = BufReader::new(File::open(path)?);
        let volume = Self::read(&mut file)?;
        ensure_consumed(&mut file)?;
        Ok(volume)
    }

    pub fn write_to_file(&self, path: &Path) -> BinResult<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.write(&mut file)?;
        file.flush()?;
        Ok(())
    }

    pub fn from_image(image: &Image) -> Result<Self> {
        Ok(Self {
            pixels: pixels_u16(&image.fov)?,
            mm: mm3_(image.fov.voxel_size),
            data: image.data.clone(),
        })
    }

    pub fn into_image(self) -> Result<Image> {
        Image::new(fov_from_header(self.pixels, self.mm), self.data)
    }
}

impl Mask4D {
    pub fn read_from_file(path: &Path) -> BinResult<Self> {
        let mut file = BufReader::new(File::open(path)?);
        let mask = Self::read(&mut file)?;
        ensure_consumed(&mut file)?;
        Ok(mask)
    }

    pub fn write_to_file(&self, path: &Path) -> BinResult<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.write(&mut file)?;
        file.flush()?;
        Ok(())
    }

    pub fn from_regions(regions: &RegionSet) -> Result<Self> {
        let fov = regions.fov();
        let n_regions = u16::try_from(regions.n_regions()).map_err(|_| Error::DimensionMismatch(
            format!("{} regions is too many for the raw mask format", regions.n_regions())
        ))?;
        Ok(Self {
            pixels: pixels_u16(&fov)?,
            regions: n_regions,
            mm: mm3_(fov.voxel_size),
            data: regions.stacked_data(),
        })
    }

    pub fn into_regions(self) -> Result<RegionSet> {
        RegionSet::from_stacked(fov_from_header(self.pixels, self.mm), self.regions as usize, self.data)
    }
}

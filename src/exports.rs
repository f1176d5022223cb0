pub use crate::error::{Error, Result};

pub use crate::fov::FOV;
pub use crate::image::{Image, ImageData};
pub use crate::regions::RegionSet;

pub use crate::compose::{Background, Composition};
pub use crate::pvc::{correct, correct_with_progress, Correction, GtmConfig};
pub use crate::solve::Method;

pub use crate::index::{BoxDim_u, Index1_u, Index3_u};

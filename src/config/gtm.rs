//! Configuration file parser for GTM correction

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

use units::{mm, ratio, Length, todo::Ratiof32};

use crate::compose::{Background, Composition};
use crate::pvc::GtmConfig;
use crate::psf::AXES;
use crate::{Error, Result};

fn deserialize_uom_3d_opt<'d, D, T>(deserializer: D) -> std::result::Result<Option<(T, T, T)>, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    Option::<(String, String, String)>::deserialize(deserializer)?
        .map(|(x,y,z)| tr_tup_res((x.parse(), y.parse(), z.parse())))
        .transpose()
        .map_err(de::Error::custom)
}

/// Transpose 3-tuple of `Result`
///
/// `Ok` if all elements `Ok`; if any element is an `Err` return the first one.
fn tr_tup_res<O, E>((x,y,z): (std::result::Result<O, E>, std::result::Result<O, E>, std::result::Result<O, E>))
                    -> std::result::Result<(O, O, O), E> {
    Ok((x?, y?, z?))
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {

    /// PSF FWHM along x, y and z, with units, e.g. `["4 mm", "4 mm", "5 mm"]`
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_3d_opt")]
    pub fwhm: Option<(Length, Length, Length)>,

    /// Kernel truncation, in sigmas
    pub cutoff: Option<Ratiof32>,

    pub condition_limit: Option<f64>,

    pub composition: Option<Composition>,

    pub background: Option<Background>,
}

/// Settings given on the command line, which take precedence over the file
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub fwhm: [Option<Length>; 3],
    pub cutoff: Option<Ratiof32>,
    pub composition: Option<Composition>,
    pub background: Option<Background>,
}

impl Config {

    /// Combine file settings with command-line overrides and defaults. The
    /// FWHM along every axis must be specified by one or the other.
    pub fn resolve(&self, overrides: Overrides) -> Result<GtmConfig> {
        let file_fwhm = self.fwhm.map(|(x, y, z)| [x, y, z]);
        let mut fwhm = [mm(0.0); 3];
        for axis in 0..3 {
            fwhm[axis] = overrides.fwhm[axis]
                .or(file_fwhm.map(|f| f[axis]))
                .ok_or_else(|| Error::InvalidParameter(format!(
                    "no FWHM given along {}", AXES[axis]
                )))?;
        }
        let mut config = GtmConfig::new(fwhm);
        if let Some(c) = overrides.cutoff.or(self.cutoff) { config.cutoff = ratio(c) }
        if let Some(l) = self.condition_limit             { config.condition_limit = l }
        if let Some(c) = overrides.composition.or(self.composition) { config.composition = c }
        if let Some(b) = overrides.background .or(self.background ) { config.background  = b }
        Ok(config)
    }
}

pub fn parse_config(input: &str) -> Result<Config> {
    Ok(toml::from_str(input)?)
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    let config: String = fs::read_to_string(path)?;
    parse_config(&config)
}

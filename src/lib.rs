mod exports;
pub use exports::*;

pub mod error;
pub mod io;
pub mod utils;
pub mod config;
pub mod index;
pub mod fov;
pub mod image;
pub mod psf;
pub mod gauss;
pub mod regions;
pub mod gtm;
pub mod means;
pub mod solve;
pub mod compose;
pub mod pvc;
pub mod phantom;

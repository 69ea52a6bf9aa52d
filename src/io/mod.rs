//! File formats: light-position files, input photographs, PTM output.

pub mod images;
pub mod lightpos;
pub mod ptm;

pub use images::{load_samples, Crop};
pub use lightpos::{read_lp_file, LightSample};
pub use ptm::write_ptm;

pub(crate) mod apply;
pub(crate) mod buffer;
pub(crate) mod compositor;
pub(crate) mod feather;
pub(crate) mod model;
pub(crate) mod raster;

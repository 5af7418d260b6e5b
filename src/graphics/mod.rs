pub mod bitmap;
pub mod cubemap;
pub mod mesh;
pub mod raster;

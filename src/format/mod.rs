pub(crate) mod audio;
pub(crate) mod image;
pub(crate) mod pattern;

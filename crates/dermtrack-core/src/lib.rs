//! Core types and utilities for skin-lesion screening.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete detector, matcher or image crate: the pipeline
//! crates adapt their inputs into the lightweight [`GrayImageView`] and the
//! coordinate types defined here.
//!
//! Two coordinate spaces are used throughout the workspace:
//! - unit-square coordinates ([`UnitPoint`], [`UnitBox`]) in `[0, 1]`,
//!   relative to an image's width and height;
//! - pixel coordinates ([`PixelPoint`], [`PixelRect`]).
//!
//! They are distinct types, so converting between them always goes through
//! [`normalize`], [`denormalize`] or [`bbox_to_pixels`] with the consuming
//! image's dimensions.

mod affine;
mod detection;
mod geometry;
mod image;
mod logger;

pub use affine::{warp_affine_gray, Affine2};
pub use detection::{Detection, KeypointCorrespondence};
pub use geometry::{
    bbox_to_pixels, denormalize, normalize, GeometryError, PixelPoint, PixelRect, UnitBox,
    UnitPoint,
};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};

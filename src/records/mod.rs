//! # Record mirrors
//!
//! Plain records mirroring the small fixed structures exchanged with the
//! native toolkit. Each host-side record has a `#[repr(C)]` twin with the
//! exact native layout and conversions in both directions:
//!
//! | Host record                               | Native layout                     |
//! |-------------------------------------------|-----------------------------------|
//! | [`Ellipse`](ellipse::Ellipse)             | [`SpiceEllipse`](ellipse::SpiceEllipse) |
//! | [`Plane`](plane::Plane)                   | [`SpicePlane`](plane::SpicePlane) |
//! | [`AttributeDescriptor`](ek::AttributeDescriptor) | [`SpiceEKAttDsc`](ek::SpiceEKAttDsc) |
//! | [`SegmentSummary`](ek::SegmentSummary)    | [`SpiceEKSegSum`](ek::SpiceEKSegSum) |
//!
//! Host records use [`nalgebra::Vector3`] for 3-vectors and render as
//! human-readable text through [`std::fmt::Display`].

pub mod ek;
pub mod ellipse;
pub mod plane;

pub use ek::{AttributeDescriptor, SegmentSummary};
pub use ellipse::Ellipse;
pub use plane::Plane;

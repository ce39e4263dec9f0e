#![deny(bare_trait_objects)]

//! Incremental extrusion of brush strokes into triangle meshes.
//!
//! ## Overview
//!
//! The extruder consumes a time-ordered stream of modeled brush-tip states
//! and maintains a continuously updating triangle mesh of the visible
//! stroke:
//!
//! - each tip state is turned into a [`TipShape`], the convex hull of one
//!   to four circles;
//! - consecutive shapes are connected along their external tangents,
//!   producing "left" and "right" outline points;
//! - the geometry engine appends those points to the mesh, simplifying
//!   nearly-straight runs and incrementally detecting and repairing
//!   self-intersections of each outline;
//! - per-vertex derivative and margin attributes are recomputed for the
//!   mutated suffix of the mesh.
//!
//! The public entry point is [`BrushTipExtruder`]: `start_stroke` begins a
//! fresh mesh, and each `extend_stroke` call appends "fixed" states
//! permanently and "volatile" states provisionally, returning the
//! [`StrokeShapeUpdate`] a renderer needs to refresh its copy of the mesh.
//!
//! Partial updates cost time proportional to the new input, not to the
//! stroke so far; all buffers are reused across strokes.

pub use tracery_geom as geom;

#[cfg(feature = "serialization")]
#[macro_use]
extern crate serde;

mod constrain;
mod derivative;
mod extruder;
mod extrusion;
mod geometry;
mod mesh;
mod outline;
mod rounded_polygon;
mod side;
mod simplify;
mod tip_shape;
mod tip_state;


pub use crate::constrain::{constrain_extrusion, ConstrainResultType, ConstrainedExtrusion};
pub use crate::extruder::{BrushTipExtruder, StrokeOutline, StrokeShapeUpdate, SurfaceUv};
pub use crate::extrusion::{BrushTipExtrusion, TangentQuality};
pub use crate::mesh::{
    ExtrudedVertex, ForwardCategory, SideCategory, StrokeMesh, MAXIMUM_SIDE_MARGIN,
};
pub use crate::outline::{
    append_endcap_extrusion_points, append_startcap_extrusion_points,
    append_turn_extrusion_points, append_whole_shape_extrusion_points, ExtrusionPoints,
};
pub use crate::rounded_polygon::RoundedPolygon;
pub use crate::simplify::simplify_polyline;
pub use crate::tip_shape::{TangentCircleIndices, TipShape};
pub use crate::tip_state::TipState;

//! Incremental extrusion of brush strokes into triangle meshes.
//!
//! # Crates
//!
//! * **tracery_geom** - 2D geometric primitives: points, vectors, angles,
//!   segments, triangles, circles with tangent and arc queries, and
//!   bounding envelopes.
//! * **tracery_extrusion** - The extrusion core: brush-tip shape
//!   modeling, tangent-quality constraining, and the incremental
//!   triangulation engine with self-intersection repair.
//!
//! This meta-crate (`tracery`) reexports the other tracery crates for
//! convenience.
//!
//! # Quick start
//!
//! ```
//! use tracery::extrusion::{BrushTipExtruder, SurfaceUv, TipState};
//! use tracery::geom::math::point;
//!
//! let mut extruder = BrushTipExtruder::new();
//! extruder.start_stroke(0.001, SurfaceUv::None);
//!
//! let tip = |x: f32| TipState {
//!     position: point(x, 0.0),
//!     width: 1.0,
//!     height: 1.0,
//!     corner_rounding: 1.0,
//!     ..TipState::default()
//! };
//! let update = extruder.extend_stroke(&[tip(0.0), tip(1.0)], &[tip(2.0)]);
//!
//! assert!(!update.region.is_empty());
//! assert!(extruder.mesh().triangle_count() > 0);
//! ```

pub use tracery_extrusion as extrusion;
pub use tracery_geom as geom;

pub use tracery_extrusion::{BrushTipExtruder, StrokeShapeUpdate, SurfaceUv, TipState};

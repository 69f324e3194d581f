//! Thin, external-facing adapters around `rf-coverage-core`: turning a serialized floor plan
//! into core geometry, and publishing a finished run's output somewhere.

pub mod error;
pub mod floorplan;
pub mod sink;

pub mod prelude {
    pub use crate::error::{AdapterError, AdapterResult};
    pub use crate::floorplan::{parse_floor_plan, FloorPlanDocument, MaterialFeature, WallFeature};
    pub use crate::sink::{JsonFileSink, NullSink, ResultSink};
}

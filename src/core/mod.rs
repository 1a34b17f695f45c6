pub mod context;
pub mod error;
pub mod function;
pub mod graph;
pub mod promote;
pub mod semantic;
pub mod serializer;
pub mod telemetry;

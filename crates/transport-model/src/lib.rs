pub mod builder;
pub mod interpreter;
pub mod request;
pub mod result;
pub mod shipment;

pub use builder::{Conflict, Extent, Input, ModelBuilder, ModelError, Position, TransportModel};
pub use interpreter::{Interpreter, InterpreterConfig, solve};
pub use request::{Route, TransportRequest};
pub use result::{ResultWarning, SolverDiagnostic, TransportResult, TransportStatus};
pub use shipment::{ShipmentMatrix, ShipmentRecord};
pub use transport_solver::{LpBackend, SimplexBackend, SolveControl};

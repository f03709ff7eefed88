//! Hardware abstraction for the analog front end, the arm input and the status output.

pub mod capabilities;
pub mod mock;

pub use capabilities::{AnalogInput, DigitalInput, StatusIndicator};
pub use mock::{
    LoggingIndicator, RecordingIndicator, ScriptedAnalog, ScriptedSwitch, SimulatedFrontEnd,
    SimulatedSwitch,
};

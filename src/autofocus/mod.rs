mod area;
mod scheduler;
mod timer;

pub use area::{to_sensor_coordinate, FocusTarget};
pub use scheduler::{AutofocusMode, AutofocusScheduler, FocusEvent, FocusState};
pub use timer::DeferredTask;

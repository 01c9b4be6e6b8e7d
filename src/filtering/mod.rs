//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Per event type threshold counting and cooldown gating. The filter is process local and keeps
// no state across restarts.
//
// | Component                | Description                                               |
// |--------------------------|-----------------------------------------------------------|
// | EventTypeTable           | Validated queue / threshold / window / handler per type   |
// | FilterService            | should_create_event gate                                  |
// | CounterResetPolicy       | Whether threshold counters ever start over                |
// | Clock                    | Time source, swapped for ManualClock in tests             |
//--------------------------------------------------------------------------------------------------

mod clock;
mod service;
mod table;

pub use clock::{Clock, ManualClock, SystemClock};
pub use service::{CounterResetPolicy, FilterService};
pub use table::{EventTypeConfig, EventTypeTable};

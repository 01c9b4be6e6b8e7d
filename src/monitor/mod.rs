//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Log file observation. Every configured log file gets its own observer task which tails the file
// and hands each appended JSON line to the event dispatcher.
//
// | Component                | Description                                               |
// |--------------------------|-----------------------------------------------------------|
// | FileTailer               | Offset tracking reader for appended lines                 |
// | EventMonitor             | Starts and stops one observer task per log file           |
// | process_line             | Parses a log line and dispatches the event                |
//--------------------------------------------------------------------------------------------------

mod observer;
mod tailer;


pub use observer::{EventMonitor, LineOutcome, ObserverOptions, process_line};
pub use tailer::FileTailer;

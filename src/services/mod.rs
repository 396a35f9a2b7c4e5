pub mod watch_tracker;

pub use watch_tracker::WatchTracker;

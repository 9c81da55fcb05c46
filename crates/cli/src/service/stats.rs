//! Run statistics.

use std::time::Duration;

use ingestion::CounterSnapshot;

/// Statistics from one service run
#[derive(Debug, Clone)]
pub struct ServiceStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Final session counters
    pub counters: CounterSnapshot,
}

impl ServiceStats {
    /// Messages processed per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.counters.processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Messages received: {}", self.counters.received);
        println!("Records stored: {}", self.counters.processed);
        println!("Skipped: {}", self.counters.skipped);
        println!("Errors: {}", self.counters.errors);
        println!("Conflicts: {}", self.counters.conflicts);
        println!("Cursor: {}", self.counters.cursor);
        println!("Throughput: {:.2} records/s", self.throughput());
        if let Some(last_error) = &self.counters.last_error {
            println!("Last error: {}", last_error);
        }
        println!();
    }
}

//! Stress tests for Sovra.
//!
//! These helpers drive a vault under heavy load and concurrent access and
//! report throughput plus any atomicity violations observed.

use sovra_core::Vault;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Reads that returned content no writer ever wrote.
    pub torn_reads: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, torn_reads: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            torn_reads,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Torn reads: {}", self.torn_reads);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Size of each payload in bytes.
    pub payload_size: usize,
    /// Number of distinct paths.
    pub path_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 1_000,
            threads: 4,
            payload_size: 4 * 1024,
            path_count: 100,
        }
    }
}

impl StressConfig {
    /// A small configuration suitable for unit tests.
    pub fn quick() -> Self {
        Self {
            operations: 25,
            threads: 4,
            payload_size: 16 * 1024,
            path_count: 8,
        }
    }
}

/// Payload written by thread `writer`: every byte equals the writer id, so
/// a mixed buffer is detectable.
fn payload(writer: usize, size: usize) -> Vec<u8> {
    vec![(writer % 251) as u8 + 1; size]
}

fn is_whole(content: &[u8], size: usize) -> bool {
    content.len() == size && content.windows(2).all(|w| w[0] == w[1])
}

/// Writes `operations` payloads across `path_count` paths from one thread.
pub fn stress_sequential_writes(vault: &Vault, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0;
    let mut failed = 0;

    for i in 0..config.operations {
        let path = format!("seq/{}", i % config.path_count.max(1));
        match vault.write_bytes(&path, &payload(i, config.payload_size)) {
            Ok(()) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, 0, start.elapsed())
}

/// Every thread repeatedly overwrites and reads back one shared path.
///
/// Each read must return one writer's complete payload.
pub fn stress_contended_path(vault: Arc<Vault>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let torn = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(config.threads));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|writer| {
            let vault = Arc::clone(&vault);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let torn = Arc::clone(&torn);
            let barrier = Arc::clone(&barrier);
            let config = config.clone();

            thread::spawn(move || {
                let data = payload(writer, config.payload_size);
                barrier.wait();
                for _ in 0..config.operations {
                    match vault.write_bytes("contended", &data) {
                        Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                    match vault.read_bytes("contended") {
                        Ok(content) => {
                            if !is_whole(&content, config.payload_size) {
                                torn.fetch_add(1, Ordering::Relaxed);
                            }
                            successful.fetch_add(1, Ordering::Relaxed)
                        }
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        torn.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Threads write disjoint path sets concurrently; afterwards every path
/// must hold its writer's last payload.
pub fn stress_disjoint_paths(vault: Arc<Vault>, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|writer| {
            let vault = Arc::clone(&vault);
            let config = config.clone();
            thread::spawn(move || {
                let mut ok = 0;
                let mut failed = 0;
                for i in 0..config.operations {
                    let path = format!("w{writer}/{}", i % config.path_count.max(1));
                    match vault.write_bytes(&path, &payload(writer, config.payload_size)) {
                        Ok(()) => ok += 1,
                        Err(_) => failed += 1,
                    }
                }
                (ok, failed)
            })
        })
        .collect();

    let (mut successful, mut failed) = (0, 0);
    for handle in handles {
        let (ok, err) = handle.join().unwrap_or((0, config.operations));
        successful += ok;
        failed += err;
    }

    let mut torn = 0;
    for writer in 0..config.threads {
        let expected = payload(writer, config.payload_size);
        for i in 0..config.path_count.min(config.operations) {
            match vault.read_bytes(&format!("w{writer}/{i}")) {
                Ok(content) if content == expected => successful += 1,
                Ok(_) => torn += 1,
                Err(_) => failed += 1,
            }
        }
    }

    StressTestResult::new(successful, failed, torn, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestVault;

    fn shared_vault() -> (TestVault, Arc<Vault>) {
        let fixture = TestVault::new();
        let config = fixture.vault.config().clone();
        // The fixture keeps the directory alive; the shared vault serves it.
        fixture.vault.close();
        let vault = Vault::open(config, &crate::fixtures::test_credential()).unwrap();
        (fixture, Arc::new(vault))
    }

    #[test]
    fn sequential_writes_succeed() {
        let vault = TestVault::with_config(|c| c.sync_writes(false));
        let result = stress_sequential_writes(&vault, &StressConfig::quick());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.total_ops, 25);
    }

    #[test]
    fn contended_path_never_tears() {
        let (_fixture, vault) = shared_vault();
        let result = stress_contended_path(vault, &StressConfig::quick());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.torn_reads, 0);
    }

    #[test]
    fn disjoint_paths_keep_last_write() {
        let (_fixture, vault) = shared_vault();
        let result = stress_disjoint_paths(vault, &StressConfig::quick());
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.torn_reads, 0);
    }
}

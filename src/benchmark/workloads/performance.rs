//! Raw CPU, memory and disk performance

use std::sync::Arc;

use crate::benchmark::Benchmark;

use super::{Measurement, Sysbench};

const TOTAL_TIME: &str = "total time:";

pub fn all() -> Vec<Arc<dyn Benchmark>> {
    vec![
        Arc::new(memory_throughput()),
        Arc::new(cpu_time()),
        Arc::new(disk_read()),
        Arc::new(disk_write()),
    ]
}

/// Total time and min/avg/max latency of 100G of 1M memory blocks
pub fn memory_throughput() -> Sysbench {
    Sysbench::new(
        "performance.memory.throughput",
        vec![Measurement {
            args: &[
                "sysbench",
                "--test=memory",
                "--memory-block-size=1M",
                "--memory-total-size=100G",
                "--num-threads=1",
                "run",
            ],
            values: &[
                ("TotalTime", TOTAL_TIME),
                ("MinLatency", "min:"),
                ("AvgLatency", "avg:"),
                ("MaxLatency", "max:"),
            ],
        }],
    )
}

/// Time to compute primes up to 20000 on one thread
pub fn cpu_time() -> Sysbench {
    Sysbench::new(
        "performance.cpu.time",
        vec![Measurement {
            args: &[
                "sysbench",
                "--test=cpu",
                "--cpu-max-prime=20000",
                "--num-threads=1",
                "run",
            ],
            values: &[("TotalTime", TOTAL_TIME)],
        }],
    )
}

/// Sequential and random read time, one container per mode
pub fn disk_read() -> Sysbench {
    Sysbench::new(
        "performance.disk.read",
        vec![
            Measurement {
                args: &["sysbench", "--test=fileio", "--file-test-mode=seqrd", "--num-threads=1", "run"],
                values: &[("SeqRead", TOTAL_TIME)],
            },
            Measurement {
                args: &["sysbench", "--test=fileio", "--file-test-mode=rndrd", "--num-threads=1", "run"],
                values: &[("RndRead", TOTAL_TIME)],
            },
        ],
    )
}

/// Sequential write, rewrite and random write time
pub fn disk_write() -> Sysbench {
    Sysbench::new(
        "performance.disk.write",
        vec![
            Measurement {
                args: &["sysbench", "--test=fileio", "--file-test-mode=seqwr", "--num-threads=1", "run"],
                values: &[("SeqWrite", TOTAL_TIME)],
            },
            Measurement {
                args: &["sysbench", "--test=fileio", "--file-test-mode=seqrewr", "--num-threads=1", "run"],
                values: &[("SeqRewrite", TOTAL_TIME)],
            },
            Measurement {
                args: &["sysbench", "--test=fileio", "--file-test-mode=rndwr", "--num-threads=1", "run"],
                values: &[("RndWrite", TOTAL_TIME)],
            },
        ],
    )
}

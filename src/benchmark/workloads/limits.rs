//! Behavior under CPU quotas

use std::sync::Arc;
use std::time::Duration;

use crate::benchmark::Benchmark;
use crate::runtime::ResourceLimits;

use super::{Limits, Measurement, Sysbench};

/// CFS period used by every limits workload, in microseconds
const CPU_PERIOD: i64 = 100_000;

/// Quota step: 10% of one CPU
const CPU_QUOTA_STEP: i64 = 10_000;

const SCALING_STEPS: i64 = 10;

const SCALING_INTERVAL: Duration = Duration::from_secs(1);

pub fn all() -> Vec<Arc<dyn Benchmark>> {
    vec![Arc::new(cpu_time()), Arc::new(cpu_scaling())]
}

/// Prime computation capped at 10% of one CPU
pub fn cpu_time() -> Sysbench {
    Sysbench::new(
        "limits.cpu.time",
        vec![Measurement {
            args: &[
                "sysbench",
                "--test=cpu",
                "--cpu-max-prime=20000",
                "--num-threads=1",
                "run",
            ],
            values: &[("TotalTime", "total time:")],
        }],
    )
    .with_limits(Limits::Fixed(ResourceLimits::cpu(CPU_PERIOD, CPU_QUOTA_STEP)))
}

/// Prime computation whose quota grows from 10% to 100% once per second
pub fn cpu_scaling() -> Sysbench {
    let steps = (1..=SCALING_STEPS)
        .map(|step| ResourceLimits::cpu(CPU_PERIOD, CPU_QUOTA_STEP * step))
        .collect();

    Sysbench::new(
        "limits.cpu.scaling",
        vec![Measurement {
            args: &[
                "sysbench",
                "--test=cpu",
                "--cpu-max-prime=5000",
                "--num-threads=1",
                "run",
            ],
            values: &[("TotalTime", "total time:")],
        }],
    )
    .with_limits(Limits::Scaling {
        steps,
        interval: SCALING_INTERVAL,
    })
}

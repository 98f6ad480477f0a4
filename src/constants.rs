//! Application-wide constants
//!
//! Constants are grouped by their purpose for better organization.

use std::time::Duration;

// =============================================================================
// CRI ENDPOINT DEFAULTS
// =============================================================================

/// Directory holding one `<backend>/<backend>.sock` per runtime daemon
pub const DEFAULT_SOCKET_ROOT: &str = "/var/run";

/// Default timeout for the initial connection dial, in seconds
pub const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 60;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Backends queried by `version` when none are given
pub const KNOWN_BACKENDS: &[&str] = &["containerd", "crio"];

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Namespace every benchmark sandbox is created in
pub const SANDBOX_NAMESPACE: &str = "cribench";

/// Attempt counter recorded in sandbox metadata
pub const SANDBOX_ATTEMPT: u32 = 1;

/// Maximum {stop, remove} attempts before teardown gives up
pub const MAX_REMOVAL_ATTEMPTS: u32 = 10;

/// Grace period passed to StopContainer during teardown, in seconds
pub const REMOVAL_STOP_TIMEOUT_SECS: i64 = 10;

/// Interval between status queries while waiting for a container to exit
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Tag appended to image references that carry none
pub const DEFAULT_IMAGE_TAG: &str = "latest";

// =============================================================================
// WORKLOAD IMAGES
// =============================================================================

pub mod images {
    /// Image bundling sysbench
    pub const SYSBENCH: &str = "lnsp/sysbench:latest";
    /// Minimal image for lifecycle and scaling workloads
    pub const BUSYBOX: &str = "busybox:latest";
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Default file name for the merged benchmark index
pub const DEFAULT_INDEX_FILE: &str = "index.json";

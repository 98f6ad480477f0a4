//! CRI endpoint naming

use std::path::Path;

/// Endpoint address of a backend daemon, e.g.
/// `unix:///var/run/containerd/containerd.sock`
pub fn cri_endpoint(socket_root: &Path, backend: &str) -> String {
    format!(
        "unix://{}",
        socket_root.join(backend).join(format!("{backend}.sock")).display()
    )
}

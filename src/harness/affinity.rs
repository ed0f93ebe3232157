//! CPU pinning untuk thread harness

use std::io;

/// Pin thread saat ini ke satu CPU.
///
/// Hanya didukung di Linux; platform lain mengembalikan `Unsupported`.
#[cfg(target_os = "linux")]
pub fn pin_current_thread(cpu: usize) -> io::Result<()> {
    let max = 8 * std::mem::size_of::<libc::cpu_set_t>();
    if cpu >= max {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cpu {cpu} out of range (max {max})"),
        ));
    }

    // SAFETY: cpu_set_t adalah plain bitmask, zeroed == CPU_ZERO
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(cpu, &mut set);
        let rc = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set);
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread(_cpu: usize) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "cpu affinity is only supported on linux",
    ))
}

/// Pin kalau `cpu` diberikan; kegagalan hanya di-log.
pub(crate) fn try_pin(role: &str, cpu: Option<usize>) {
    let Some(cpu) = cpu else { return };
    match pin_current_thread(cpu) {
        Ok(()) => tracing::debug!(role, cpu, "thread pinned"),
        Err(e) => tracing::warn!(role, cpu, error = %e, "failed to pin thread, continuing unpinned"),
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn test_pin_to_cpu_zero() {
        // CPU 0 selalu ada kecuali cgroup membatasi
        std::thread::spawn(|| {
            let _ = pin_current_thread(0);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_out_of_range_cpu() {
        let err = pin_current_thread(1 << 20).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}

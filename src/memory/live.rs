//! Live process memory source
//!
//! Windows reads go through `ReadProcessMemory` on a handle opened with
//! `PROCESS_VM_READ`; Linux reads go through `/proc/<pid>/mem`.

use super::source::MemorySource;
use crate::core::types::{Address, PointerWidth, ProcessId, RttiError, RttiResult};
use tracing::info;

/// Memory source attached to a running process
pub struct LiveProcess {
    pid: ProcessId,
    width: PointerWidth,
    inner: imp::Inner,
}

impl LiveProcess {
    /// Opens `pid` for reading
    pub fn open(pid: ProcessId, width: PointerWidth) -> RttiResult<Self> {
        let inner = imp::Inner::open(pid)?;
        info!(pid, "Attached to live process");
        Ok(LiveProcess { pid, width, inner })
    }

    /// Process id of the target
    pub fn pid(&self) -> ProcessId {
        self.pid
    }
}

impl MemorySource for LiveProcess {
    fn read(&self, address: Address, size: usize) -> RttiResult<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let read = self.inner.read(address, self.width, &mut buffer)?;
        if read != size {
            return Err(RttiError::read_fault(
                address.display(self.width),
                size,
                format!("short read of {} bytes", read),
            ));
        }
        Ok(buffer)
    }

    fn pointer_width(&self) -> PointerWidth {
        self.width
    }

    fn image_name(&self) -> Option<String> {
        self.inner.image_name()
    }
}

#[cfg(windows)]
mod imp {
    use super::*;
    use std::ptr;
    use winapi::shared::minwindef::{DWORD, FALSE, LPCVOID, LPVOID};
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::memoryapi::ReadProcessMemory;
    use winapi::um::processthreadsapi::OpenProcess;
    use winapi::um::winbase::QueryFullProcessImageNameW;
    use winapi::um::winnt::{HANDLE, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_VM_READ};

    /// Owned process handle, closed on drop
    pub(super) struct Inner {
        handle: HANDLE,
    }

    // HANDLEs are process-local and ReadProcessMemory is thread-safe
    unsafe impl Send for Inner {}

    impl Inner {
        pub(super) fn open(pid: ProcessId) -> RttiResult<Self> {
            let handle =
                unsafe { OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid) };
            if handle.is_null() {
                return Err(RttiError::read_fault(
                    format!("PID {}", pid),
                    0,
                    format!("OpenProcess failed: {}", windows::core::Error::from_win32()),
                ));
            }
            Ok(Inner { handle })
        }

        pub(super) fn read(
            &self,
            address: Address,
            width: PointerWidth,
            buffer: &mut [u8],
        ) -> RttiResult<usize> {
            let mut bytes_read = 0;
            let result = unsafe {
                ReadProcessMemory(
                    self.handle,
                    address.as_u64() as usize as LPCVOID,
                    buffer.as_mut_ptr() as LPVOID,
                    buffer.len(),
                    &mut bytes_read,
                )
            };

            if result == FALSE {
                return Err(RttiError::read_fault(
                    address.display(width),
                    buffer.len(),
                    format!("ReadProcessMemory failed: {}", windows::core::Error::from_win32()),
                ));
            }
            Ok(bytes_read)
        }

        pub(super) fn image_name(&self) -> Option<String> {
            let mut buffer = [0u16; 1024];
            let mut size = buffer.len() as DWORD;
            let ok = unsafe {
                QueryFullProcessImageNameW(self.handle, 0, buffer.as_mut_ptr(), &mut size)
            };
            if ok == FALSE {
                return None;
            }
            Some(String::from_utf16_lossy(&buffer[..size as usize]))
        }
    }

    impl Drop for Inner {
        fn drop(&mut self) {
            if !self.handle.is_null() {
                // Ignore errors on cleanup
                unsafe {
                    CloseHandle(self.handle);
                }
                self.handle = ptr::null_mut();
            }
        }
    }
}

#[cfg(target_os = "linux")]
mod imp {
    use super::*;
    use std::fs::{self, File};
    use std::io::ErrorKind;
    use std::os::unix::fs::FileExt;

    pub(super) struct Inner {
        pid: ProcessId,
        mem: File,
    }

    impl Inner {
        pub(super) fn open(pid: ProcessId) -> RttiResult<Self> {
            let path = format!("/proc/{}/mem", pid);
            let mem = File::open(&path).map_err(|e| {
                RttiError::read_fault(format!("PID {}", pid), 0, format!("{}: {}", path, e))
            })?;
            Ok(Inner { pid, mem })
        }

        pub(super) fn read(
            &self,
            address: Address,
            width: PointerWidth,
            buffer: &mut [u8],
        ) -> RttiResult<usize> {
            let mut filled = 0;
            while filled < buffer.len() {
                match self
                    .mem
                    .read_at(&mut buffer[filled..], address.as_u64() + filled as u64)
                {
                    Ok(0) => break,
                    Ok(n) => filled += n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        return Err(RttiError::read_fault(
                            address.display(width),
                            buffer.len(),
                            e.to_string(),
                        ))
                    }
                }
            }
            Ok(filled)
        }

        pub(super) fn image_name(&self) -> Option<String> {
            fs::read_link(format!("/proc/{}/exe", self.pid))
                .ok()
                .map(|p| p.display().to_string())
        }
    }
}

#[cfg(not(any(windows, target_os = "linux")))]
mod imp {
    use super::*;

    pub(super) struct Inner;

    impl Inner {
        pub(super) fn open(_pid: ProcessId) -> RttiResult<Self> {
            Err(RttiError::UnsupportedPlatform(format!(
                "live process reads on {}",
                std::env::consts::OS
            )))
        }

        pub(super) fn read(
            &self,
            address: Address,
            width: PointerWidth,
            buffer: &mut [u8],
        ) -> RttiResult<usize> {
            Err(RttiError::read_fault(address.display(width), buffer.len(), "unsupported"))
        }

        pub(super) fn image_name(&self) -> Option<String> {
            None
        }
    }
}

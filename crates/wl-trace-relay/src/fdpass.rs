// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Socket reads and writes that carry SCM_RIGHTS descriptors
//!
//! Tokio's stream API has no notion of ancillary data, so the socket is
//! driven through readiness + `try_io` and the actual transfer is a
//! non-blocking `recvmsg`/`sendmsg`.

use nix::cmsg_space;
use nix::sys::socket::{recvmsg, sendmsg, ControlMessage, ControlMessageOwned, MsgFlags};
use std::io::{self, IoSlice, IoSliceMut};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use tokio::io::Interest;
use tokio::net::UnixStream;
use tracing::warn;

/// Most descriptors a single Wayland message batch may carry
pub const MAX_FDS_PER_READ: usize = 28;

/// Upper bound for one socket read
pub const READ_BUF_SIZE: usize = 4096;

#[cfg(any(target_os = "linux", target_os = "android"))]
fn recv_flags() -> MsgFlags {
    MsgFlags::MSG_CMSG_CLOEXEC
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn recv_flags() -> MsgFlags {
    MsgFlags::empty()
}

fn recv_raw(fd: RawFd, buf: &mut [u8]) -> io::Result<(usize, Vec<OwnedFd>)> {
    let mut cmsg_buf = cmsg_space!([RawFd; MAX_FDS_PER_READ]);
    let mut iov = [IoSliceMut::new(buf)];
    let msg = recvmsg::<()>(fd, &mut iov, Some(&mut cmsg_buf), recv_flags())?;

    let mut fds = Vec::new();
    for cmsg in msg.cmsgs()? {
        if let ControlMessageOwned::ScmRights(received) = cmsg {
            for raw in received {
                // SAFETY: SCM_RIGHTS hands us freshly installed descriptors
                // that nothing else in this process owns.
                fds.push(unsafe { OwnedFd::from_raw_fd(raw) });
            }
        }
    }
    if msg.flags.contains(MsgFlags::MSG_CTRUNC) {
        warn!(kept = fds.len(), "ancillary data truncated, descriptors lost");
    }
    Ok((msg.bytes, fds))
}

fn send_raw(fd: RawFd, data: &[u8], fds: &[RawFd]) -> io::Result<usize> {
    let iov = [IoSlice::new(data)];
    let rights = [ControlMessage::ScmRights(fds)];
    let cmsgs: &[ControlMessage] = if fds.is_empty() { &[] } else { &rights };
    Ok(sendmsg::<()>(fd, &iov, cmsgs, MsgFlags::empty(), None)?)
}

fn should_retry(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Read up to `buf.len()` bytes plus any descriptors sent with them
///
/// Returns `(0, _)` at end of stream.
pub async fn recv_chunk(stream: &UnixStream, buf: &mut [u8]) -> io::Result<(usize, Vec<OwnedFd>)> {
    loop {
        stream.readable().await?;
        match stream.try_io(Interest::READABLE, || recv_raw(stream.as_raw_fd(), &mut *buf)) {
            Ok(chunk) => return Ok(chunk),
            Err(e) if should_retry(&e) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Write all of `data`, attaching `fds` to the first byte
pub async fn send_chunk(stream: &UnixStream, data: &[u8], fds: &[OwnedFd]) -> io::Result<()> {
    let raw: Vec<RawFd> = fds.iter().map(AsRawFd::as_raw_fd).collect();
    let mut pending: &[RawFd] = &raw;
    let mut sent = 0;

    while sent < data.len() {
        stream.writable().await?;
        let remaining = &data[sent..];
        match stream.try_io(Interest::WRITABLE, || {
            send_raw(stream.as_raw_fd(), remaining, pending)
        }) {
            Ok(n) => {
                sent += n;
                pending = &[];
            }
            Err(e) if should_retry(&e) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

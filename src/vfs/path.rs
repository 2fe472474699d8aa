//! Path resolution for the mounted view.

use crate::{FrozenError, Result};

/// Resolves `input` against `cwd` into a canonical absolute path.
///
/// Duplicate and trailing separators are dropped, `.` segments removed and
/// `..` consumes the segment before it. Climbing above the root is refused.
pub fn resolve(cwd: &str, input: &str) -> Result<String> {
    let joined;
    let full = if input.starts_with('/') {
        input
    } else {
        joined = format!("{cwd}/{input}");
        &joined
    };

    let mut parts: Vec<&str> = Vec::new();
    for segment in full.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(FrozenError::PermissionDenied(format!("{input}: above the root")));
                }
            }
            name => parts.push(name),
        }
    }

    if parts.is_empty() {
        return Ok("/".to_string());
    }
    let mut out = String::with_capacity(full.len());
    for part in parts {
        out.push('/');
        out.push_str(part);
    }
    Ok(out)
}

/// Strips `mount_point` from an absolute path, giving the path inside the
/// mounted filesystem. `None` when `path` lies outside the mount point.
pub fn strip_mount_point<'a>(mount_point: &str, path: &'a str) -> Option<&'a str> {
    if mount_point == "/" {
        return Some(path);
    }
    let rest = path.strip_prefix(mount_point)?;
    match rest {
        "" => Some("/"),
        r if r.starts_with('/') => Some(r),
        _ => None,
    }
}

//! Locations inside GOROOT and the stable short hash used for cache names.

use std::path::{Path, PathBuf};

use gplan_config::BuildEnv;

const FNV128_OFFSET_BASIS: u128 = 0x6c62272e07bb014262b821756295c58d;
const FNV128_PRIME: u128 = 0x0000000001000000000000000000013b;

/// Directory holding the precompiled standard library archives
/// (`$GOROOT/pkg/<goos>_<goarch>`).
pub fn std_archive_dir(env: &BuildEnv) -> PathBuf {
  env.goroot.join("pkg").join(env.platform())
}

/// `$GOROOT/src`.
pub fn std_src_dir(env: &BuildEnv) -> PathBuf {
  env.goroot.join("src")
}

/// Assembler include directory (`$GOROOT/pkg/include`).
pub fn std_include_dir(env: &BuildEnv) -> PathBuf {
  env.goroot.join("pkg").join("include")
}

/// Append a slash-separated import path below `base`, one segment at a time.
pub fn join_import_path(
  base: &Path,
  import_path: &str,
) -> PathBuf {
  import_path
    .split('/')
    .filter(|segment| !segment.is_empty())
    .fold(base.to_path_buf(), |dir, segment| dir.join(segment))
}

fn fnv128a(data: &[u8]) -> u128 {
  data.iter().fold(FNV128_OFFSET_BASIS, |hash, byte| {
    (hash ^ u128::from(*byte)).wrapping_mul(FNV128_PRIME)
  })
}

/// URL-safe base64 of the 128-bit FNV-1a hash of `s`.
///
/// The output only uses `[A-Za-z0-9_=-]`, so it is usable as a file name.
pub fn hash_string(s: &str) -> String {
  base64::encode_config(fnv128a(s.as_bytes()).to_be_bytes(), base64::URL_SAFE)
}

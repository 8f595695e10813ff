use sha2::{Digest, Sha256};

/// Canonical form of a manifest path: forward slashes, no leading `./` or `/`, no empty or `.`
/// segments.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Directory part of a normalized path, without trailing slash. Empty at the root.
pub(crate) fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn split_extension(path: &str) -> (&str, &str) {
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => path.split_at(file_start + dot),
        _ => (path, ""),
    }
}

/// Full SHA-256 of `data` as lowercase hex. Used for bundle content hashes.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Flat, directory-free file name for a bundle path: the first 16 bytes of the SHA-256 of the
/// normalized path as hex, followed by the original extension.
///
/// Obscures the bundle layout on a CDN; it is not a security boundary.
pub fn flatten_bundle_name(path: &str) -> String {
    let normalized = normalize_path(path);
    let (_, ext) = split_extension(&normalized);
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{}{ext}", hex::encode(&digest[..16]))
}

/// Inserts `_hash` before the extension: `ui/main.bundle` becomes `ui/main_<hash>.bundle`.
pub fn hash_qualified(path: &str, hash: &str) -> String {
    if hash.is_empty() {
        return path.to_owned();
    }
    let (stem, ext) = split_extension(path);
    format!("{stem}_{hash}{ext}")
}

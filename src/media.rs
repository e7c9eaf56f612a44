//! Content-addressed storage for post images under the configured media root.
use crate::datastore::structs::ImageKind;
use crate::errors::public::Kind;
use crate::errors::{DescribeErr, Fallible, PublicError};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Write `bytes` under the media root, named by content hash, and return the relative
/// path that gets stored on the post. Re-uploading identical bytes lands on the same
/// file, so duplicate uploads cost nothing extra.
pub fn store_image(media_root: &Path, bytes: &[u8], kind: ImageKind) -> Fallible<String> {
    let name = format!(
        "posts/{}.{}",
        hex::encode(Sha256::digest(bytes)),
        kind.extension()
    );
    let path = media_root.join(&name);
    let public = || PublicError {
        kind: Kind::ServerError,
        text: "Couldn't store the uploaded image",
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).describe_err(public())?;
    }
    fs::write(&path, bytes).describe_err(public())?;
    Ok(name)
}
